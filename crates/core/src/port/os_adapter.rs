// OS Adapter Port - per-platform shell decoration and host probes

use async_trait::async_trait;
use thiserror::Error;

/// Probe failures
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("{platform}: '{utility}' exited with status {status}")]
    NonZeroExit {
        platform: &'static str,
        utility: String,
        status: i32,
    },

    #[error("Unparsable probe output: {0}")]
    Unparsable(String),
}

/// Platform strategy, selected once at startup
///
/// Implementations:
/// - LinuxAdapter / DarwinAdapter: `screen` backgrounding, `/etc/profile` sourcing
/// - WindowsAdapter: `start /B` backgrounding
/// - GenericAdapter: in-process fallback for anything else
#[async_trait]
pub trait OsAdapter: Send + Sync {
    /// Platform identifier used in logs and errors
    fn platform(&self) -> &'static str;

    /// Stable hex digest of the host's hardware/memory inventory
    ///
    /// # Errors
    /// - ProbeError::NonZeroExit if the inventory utility fails
    async fn fingerprint(&self) -> Result<String, ProbeError>;

    /// Absolute path of the running executable
    ///
    /// # Errors
    /// - ProbeError::NonZeroExit if the lookup utility fails
    /// - ProbeError::Unparsable if its output holds no absolute path
    async fn interpreter_path(&self) -> Result<String, ProbeError>;

    /// Wrap a command line so it runs detached with stdio discarded
    fn decorate_background(&self, command: &str) -> String;

    /// Prefix a command line with the platform's environment profile
    fn decorate_environment(&self, command: &str) -> String;
}

/// Owned builder over one pending command line
///
/// # Example
/// ```text
/// let line = ShellCommand::new(adapter.as_ref(), "php worker.php")
///     .with_environment()
///     .background()
///     .into_string();
/// ```
pub struct ShellCommand<'a> {
    adapter: &'a dyn OsAdapter,
    line: String,
}

impl<'a> ShellCommand<'a> {
    pub fn new(adapter: &'a dyn OsAdapter, line: impl Into<String>) -> Self {
        Self {
            adapter,
            line: line.into(),
        }
    }

    pub fn background(mut self) -> Self {
        self.line = self.adapter.decorate_background(&self.line);
        self
    }

    pub fn with_environment(mut self) -> Self {
        self.line = self.adapter.decorate_environment(&self.line);
        self
    }

    pub fn as_str(&self) -> &str {
        &self.line
    }

    pub fn into_string(self) -> String {
        self.line
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock adapter with a fixed interpreter path and bracket decorators
    pub struct MockOsAdapter {
        interpreter: Option<String>,
        probe_calls: AtomicUsize,
    }

    impl MockOsAdapter {
        pub fn new(interpreter: impl Into<String>) -> Self {
            Self {
                interpreter: Some(interpreter.into()),
                probe_calls: AtomicUsize::new(0),
            }
        }

        /// Every probe fails with a non-zero exit
        pub fn new_failing() -> Self {
            Self {
                interpreter: None,
                probe_calls: AtomicUsize::new(0),
            }
        }

        pub fn probe_calls(&self) -> usize {
            self.probe_calls.load(Ordering::SeqCst)
        }

        fn failure(&self, utility: &str) -> ProbeError {
            ProbeError::NonZeroExit {
                platform: "mock",
                utility: utility.to_string(),
                status: 1,
            }
        }
    }

    #[async_trait]
    impl OsAdapter for MockOsAdapter {
        fn platform(&self) -> &'static str {
            "mock"
        }

        async fn fingerprint(&self) -> Result<String, ProbeError> {
            self.probe_calls.fetch_add(1, Ordering::SeqCst);
            match self.interpreter {
                Some(_) => Ok("0123456789abcdef0123456789abcdef".to_string()),
                None => Err(self.failure("inventory")),
            }
        }

        async fn interpreter_path(&self) -> Result<String, ProbeError> {
            self.probe_calls.fetch_add(1, Ordering::SeqCst);
            self.interpreter
                .clone()
                .ok_or_else(|| self.failure("interpreter"))
        }

        fn decorate_background(&self, command: &str) -> String {
            format!("bg[{command}]")
        }

        fn decorate_environment(&self, command: &str) -> String {
            format!("env[{command}]")
        }
    }
}
