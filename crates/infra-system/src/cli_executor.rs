// Subprocess CLI executor
// reason: tokio::process for async child management, nix for graceful termination
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin};
use tokio::time::timeout;
use tracing::{info, warn};

use portico_core::domain::{CliJob, ProcessPool};
use portico_core::error::{GatewayError, Result};
use portico_core::port::{CliExecutor, TimeProvider};

use crate::shell::shell_command;

/// Variables passed through to child processes by default
pub const DEFAULT_ENV_ALLOWLIST: [&str; 6] = ["PATH", "HOME", "USER", "LANG", "TMPDIR", "SYSTEMROOT"];

/// Time a child gets between SIGTERM and a hard kill
const TERM_GRACE_MS: u64 = 2_000;

/// What one finished child produced
struct JobOutput {
    status: ExitStatus,
    stdout: String,
}

/// Runs CLI jobs through the platform shell
///
/// Children see only allowlisted variables from the gateway's environment.
pub struct SubprocessCliExecutor {
    time_provider: Arc<dyn TimeProvider>,
    env_allowlist: Vec<String>,
}

impl SubprocessCliExecutor {
    /// # Example
    /// ```ignore
    /// let executor = SubprocessCliExecutor::new(
    ///     Arc::new(SystemTimeProvider),
    ///     vec!["PATH".to_string(), "HOME".to_string()],
    /// );
    /// ```
    pub fn new(time_provider: Arc<dyn TimeProvider>, env_allowlist: Vec<String>) -> Self {
        Self {
            time_provider,
            env_allowlist,
        }
    }

    /// Filter environment variables to the allowlist
    fn filter_env(&self, env: &HashMap<String, String>) -> HashMap<String, String> {
        env.iter()
            .filter(|(k, _)| self.env_allowlist.contains(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn spawn(&self, job: &CliJob) -> Result<Child> {
        let process_env: HashMap<String, String> = std::env::vars().collect();

        let child = shell_command(&job.command_line())
            .env_clear()
            .envs(self.filter_env(&process_env))
            .stdin(if job.stdin_payload().is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        Ok(child)
    }

    async fn run_job(&self, job: &CliJob) -> Result<JobOutput> {
        let mut child = self.spawn(job)?;

        // stdout drains before any stdin byte is written so an echoing child never stalls
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| GatewayError::Execution(format!("{}: stdout not captured", job.key())))?;
        let reader = tokio::spawn(async move {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).await.map(|_| buf)
        });

        let writer = match (job.stdin_payload(), child.stdin.take()) {
            (Some(payload), Some(stdin)) => {
                Some(tokio::spawn(feed_stdin(stdin, payload.as_bytes().to_vec())))
            }
            _ => None,
        };

        let waited = match job.timeout() {
            Some(limit) => timeout(limit, child.wait()).await.ok(),
            None => Some(child.wait().await),
        };

        let status = match waited {
            Some(status) => status?,
            None => {
                self.terminate(&mut child).await;
                if let Some(writer) = &writer {
                    writer.abort();
                }
                reader.abort();
                return Err(GatewayError::Execution(format!(
                    "{}: timed out after {}s",
                    job.key(),
                    job.timeout_secs()
                )));
            }
        };

        if let Some(writer) = writer {
            writer
                .await
                .map_err(|e| GatewayError::Execution(format!("{}: {e}", job.key())))??;
        }

        let stdout = reader
            .await
            .map_err(|e| GatewayError::Execution(format!("{}: {e}", job.key())))??;

        Ok(JobOutput {
            status,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
        })
    }

    /// SIGTERM first, hard kill if the child outlives the grace period
    async fn terminate(&self, child: &mut Child) {
        #[cfg(unix)]
        {
            if let Some(pid) = child.id() {
                use nix::sys::signal::{kill, Signal};
                use nix::unistd::Pid;

                info!(pid = %pid, "Sending SIGTERM for graceful shutdown");
                match kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                    Ok(()) => {
                        let grace = Duration::from_millis(TERM_GRACE_MS);
                        if timeout(grace, child.wait()).await.is_ok() {
                            info!(pid = %pid, "Process exited after SIGTERM");
                            return;
                        }
                        warn!(pid = %pid, "Process did not exit after SIGTERM, killing");
                    }
                    Err(e) => warn!(pid = %pid, error = %e, "SIGTERM failed, killing"),
                }
            }
        }

        if let Err(e) = child.kill().await {
            warn!(error = %e, "Failed to kill timed-out process");
        }
    }
}

/// Writes the payload and closes the pipe
///
/// A child that exits without reading its input closes the pipe early;
/// that is not a failure, the exit status decides.
async fn feed_stdin(mut stdin: ChildStdin, payload: Vec<u8>) -> std::io::Result<()> {
    match stdin.write_all(&payload).await {
        Err(e) if e.kind() != ErrorKind::BrokenPipe => Err(e),
        _ => Ok(()),
    }
}

#[async_trait]
impl CliExecutor for SubprocessCliExecutor {
    /// Jobs run one after another; each failure lands in `pool.errors`
    async fn exec_cli(&self, pool: &mut ProcessPool, jobs: Vec<CliJob>) -> Result<()> {
        for job in jobs {
            let start_time = self.time_provider.now_millis();

            info!(
                key = %job.key(),
                command = %job.command_line(),
                timeout_secs = job.timeout_secs(),
                "Starting CLI job"
            );

            let output = match self.run_job(&job).await {
                Ok(output) => output,
                Err(e) => {
                    warn!(key = %job.key(), error = %e, "CLI job failed");
                    pool.push_error(&e);
                    continue;
                }
            };

            let duration_ms = self.time_provider.elapsed_millis(start_time);
            info!(
                key = %job.key(),
                duration_ms = %duration_ms,
                exit_code = ?output.status.code(),
                "CLI job completed"
            );

            if !output.status.success() {
                pool.push_error(&GatewayError::Execution(format!(
                    "{}: exited with {}",
                    job.key(),
                    output.status
                )));
                continue;
            }

            if job.return_output() {
                pool.set_result(job.key(), serde_json::Value::String(output.stdout.trim().to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_core::domain::{CliOptions, RequestEnv};
    use portico_core::port::time_provider::SystemTimeProvider;
    use serde_json::json;

    fn executor() -> SubprocessCliExecutor {
        SubprocessCliExecutor::new(
            Arc::new(SystemTimeProvider),
            DEFAULT_ENV_ALLOWLIST.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn job(command: &str, options: CliOptions) -> CliJob {
        CliJob::new("job", command, options)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdout_stored_when_requested() {
        let mut pool = ProcessPool::new(&RequestEnv::cli());
        let options = CliOptions {
            argv: "hello".into(),
            return_output: true,
            ..Default::default()
        };

        executor().exec_cli(&mut pool, vec![job("echo", options)]).await.unwrap();

        assert_eq!(pool.results.get("job"), Some(&json!("hello")));
        assert!(pool.errors.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pipe_reaches_stdin() {
        let mut pool = ProcessPool::new(&RequestEnv::cli());
        let options = CliOptions {
            pipe: "from-stdin".into(),
            return_output: true,
            ..Default::default()
        };

        executor().exec_cli(&mut pool, vec![job("cat", options)]).await.unwrap();

        assert_eq!(pool.results.get("job"), Some(&json!("from-stdin")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pipe_larger_than_pipe_buffer_echoes_back() {
        let mut pool = ProcessPool::new(&RequestEnv::cli());
        let payload = "x".repeat(1024 * 1024);
        let options = CliOptions {
            pipe: payload.clone(),
            time_limit: 5,
            return_output: true,
            ..Default::default()
        };

        tokio::time::timeout(
            Duration::from_secs(20),
            executor().exec_cli(&mut pool, vec![job("cat", options)]),
        )
        .await
        .expect("job finished")
        .unwrap();

        assert!(pool.errors.is_empty(), "errors: {:?}", pool.errors);
        assert_eq!(pool.results.get("job"), Some(&json!(payload)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_unread_pipe_is_not_an_error() {
        let mut pool = ProcessPool::new(&RequestEnv::cli());
        let options = CliOptions {
            pipe: "y".repeat(1024 * 1024),
            time_limit: 5,
            ..Default::default()
        };

        tokio::time::timeout(
            Duration::from_secs(20),
            executor().exec_cli(&mut pool, vec![job("true", options)]),
        )
        .await
        .expect("job finished")
        .unwrap();

        assert!(pool.errors.is_empty(), "errors: {:?}", pool.errors);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_fires_while_child_ignores_pipe() {
        let mut pool = ProcessPool::new(&RequestEnv::cli());
        let options = CliOptions {
            argv: "10".into(),
            pipe: "z".repeat(1024 * 1024),
            time_limit: 1,
            ..Default::default()
        };

        let started = std::time::Instant::now();
        executor().exec_cli(&mut pool, vec![job("sleep", options)]).await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(8));
        assert_eq!(pool.errors.len(), 1);
        assert!(pool.errors[0].message.contains("timed out"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_output_discarded_without_flag() {
        let mut pool = ProcessPool::new(&RequestEnv::cli());

        executor()
            .exec_cli(&mut pool, vec![job("echo", CliOptions::default())])
            .await
            .unwrap();

        assert!(pool.results.is_empty());
        assert!(pool.errors.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_and_records_error() {
        let mut pool = ProcessPool::new(&RequestEnv::cli());
        let options = CliOptions {
            argv: "10".into(),
            time_limit: 1,
            return_output: true,
            ..Default::default()
        };

        let started = std::time::Instant::now();
        executor().exec_cli(&mut pool, vec![job("sleep", options)]).await.unwrap();

        assert!(started.elapsed() < Duration::from_secs(8));
        assert_eq!(pool.errors.len(), 1);
        assert!(pool.errors[0].message.contains("timed out"));
        assert!(pool.results.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_error_and_next_job_runs() {
        let mut pool = ProcessPool::new(&RequestEnv::cli());
        let ok = CliJob::new(
            "second",
            "echo",
            CliOptions {
                argv: "ok".into(),
                return_output: true,
                ..Default::default()
            },
        );

        executor()
            .exec_cli(&mut pool, vec![job("exit 4", CliOptions::default()), ok])
            .await
            .unwrap();

        assert_eq!(pool.errors.len(), 1);
        assert_eq!(pool.errors[0].code, portico_core::error::code::EXECUTION_ERROR);
        assert_eq!(pool.results.get("second"), Some(&json!("ok")));
    }

    #[test]
    fn test_env_filtering() {
        let executor = SubprocessCliExecutor::new(
            Arc::new(SystemTimeProvider),
            vec!["ALLOWED_VAR".to_string()],
        );

        let mut env = HashMap::new();
        env.insert("ALLOWED_VAR".to_string(), "value1".to_string());
        env.insert("BLOCKED_VAR".to_string(), "value2".to_string());

        let filtered = executor.filter_env(&env);

        assert_eq!(filtered.len(), 1);
        assert!(filtered.contains_key("ALLOWED_VAR"));
        assert!(!filtered.contains_key("BLOCKED_VAR"));
    }
}
