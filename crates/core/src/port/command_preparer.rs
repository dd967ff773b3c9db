// Command Preparer Port - turns `pool.command` into job descriptions

use async_trait::async_trait;

use crate::domain::{PreparedJob, ProcessPool};
use crate::error::Result;

/// Resolves the active command into jobs
///
/// The controller validates and enqueues what is returned, so CLI jobs
/// produced here go through the same permission and lookup checks as
/// direct `add_cli_job` calls.
#[async_trait]
pub trait CommandPreparer: Send + Sync {
    async fn prepare(&self, pool: &mut ProcessPool) -> Result<Vec<PreparedJob>>;
}

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Returns a fixed job list and counts calls
    #[derive(Default)]
    pub struct FixedPreparer {
        jobs: Vec<PreparedJob>,
        calls: Mutex<usize>,
    }

    impl FixedPreparer {
        pub fn new(jobs: Vec<PreparedJob>) -> Self {
            Self {
                jobs,
                calls: Mutex::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl CommandPreparer for FixedPreparer {
        async fn prepare(&self, _pool: &mut ProcessPool) -> Result<Vec<PreparedJob>> {
            *self.calls.lock().unwrap() += 1;
            Ok(self.jobs.clone())
        }
    }
}
