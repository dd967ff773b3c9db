// Error Reporter Port - sink for recovered and fatal errors

use tracing::error;

use crate::error::GatewayError;

/// Receives errors the controller handles without propagating
///
/// Must not fail or panic.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, err: &GatewayError);
}

/// Logs reported errors through tracing (production)
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, err: &GatewayError) {
        error!(code = err.code(), error = %err, "Gateway error reported");
    }
}

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Keeps reported messages for assertions
    #[derive(Default)]
    pub struct RecordingErrorReporter {
        reported: Mutex<Vec<String>>,
    }

    impl RecordingErrorReporter {
        pub fn reported(&self) -> Vec<String> {
            self.reported.lock().unwrap().clone()
        }
    }

    impl ErrorReporter for RecordingErrorReporter {
        fn report(&self, err: &GatewayError) {
            self.reported.lock().unwrap().push(err.to_string());
        }
    }
}
