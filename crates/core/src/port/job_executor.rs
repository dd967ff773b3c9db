// Job Executor Ports - drain the CGI and CLI queues during EXEC

use async_trait::async_trait;

use crate::domain::{CgiJob, CliJob, ProcessPool};
use crate::error::Result;

/// Runs in-process handler jobs
///
/// Per-job outcomes go into `pool.results` / `pool.errors`; an `Err`
/// return means the executor itself could not run.
#[async_trait]
pub trait CgiExecutor: Send + Sync {
    async fn exec_cgi(&self, pool: &mut ProcessPool, jobs: Vec<CgiJob>) -> Result<()>;
}

/// Spawns external commands for CLI jobs
///
/// Implementations honour each job's stdin payload and timeout
/// (`None` meaning no limit) and record outcomes in the pool.
#[async_trait]
pub trait CliExecutor: Send + Sync {
    async fn exec_cli(&self, pool: &mut ProcessPool, jobs: Vec<CliJob>) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every job it receives and marks each one done
    #[derive(Default, Clone)]
    pub struct RecordingExecutor {
        cgi: Arc<Mutex<Vec<CgiJob>>>,
        cli: Arc<Mutex<Vec<CliJob>>>,
    }

    impl RecordingExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn cgi_jobs(&self) -> Vec<CgiJob> {
            self.cgi.lock().unwrap().clone()
        }

        pub fn cli_jobs(&self) -> Vec<CliJob> {
            self.cli.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CgiExecutor for RecordingExecutor {
        async fn exec_cgi(&self, pool: &mut ProcessPool, jobs: Vec<CgiJob>) -> Result<()> {
            for job in &jobs {
                for method in &job.methods {
                    pool.set_result(job.result_key(method), serde_json::Value::Bool(true));
                }
            }
            self.cgi.lock().unwrap().extend(jobs);
            Ok(())
        }
    }

    #[async_trait]
    impl CliExecutor for RecordingExecutor {
        async fn exec_cli(&self, pool: &mut ProcessPool, jobs: Vec<CliJob>) -> Result<()> {
            for job in &jobs {
                pool.set_result(job.key(), serde_json::Value::String(job.command_line()));
            }
            self.cli.lock().unwrap().extend(jobs);
            Ok(())
        }
    }
}
