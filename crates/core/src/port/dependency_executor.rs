// Dependency Executor Port - runs the configured init list

use async_trait::async_trait;

use crate::error::Result;

/// Executes the flattened init list during INIT
///
/// Errors are caught and reported by the controller; they never stop
/// the boot sequence.
#[async_trait]
pub trait DependencyExecutor: Send + Sync {
    async fn exec_dependencies(&self, list: &[String]) -> Result<()>;
}

pub mod mocks {
    use super::*;
    use crate::error::GatewayError;
    use std::sync::Mutex;

    /// Records each invocation; optionally fails with a message
    #[derive(Default)]
    pub struct MockDependencyExecutor {
        fail_with: Option<String>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl MockDependencyExecutor {
        pub fn new_success() -> Self {
            Self::default()
        }

        pub fn new_fail(message: impl Into<String>) -> Self {
            Self {
                fail_with: Some(message.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DependencyExecutor for MockDependencyExecutor {
        async fn exec_dependencies(&self, list: &[String]) -> Result<()> {
            self.calls.lock().unwrap().push(list.to_vec());
            match &self.fail_with {
                Some(msg) => Err(GatewayError::Config(msg.clone())),
                None => Ok(()),
            }
        }
    }
}
