// Job Domain Model - queued CGI handler calls and CLI commands

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Line terminator appended to stdin payloads
pub const LINE_TERMINATOR: &str = "\n";

/// In-process handler invocation: one class, methods run in order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CgiJob {
    pub handler_class: String,
    pub methods: Vec<String>,
}

impl CgiJob {
    pub fn new<I, S>(handler_class: impl Into<String>, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            handler_class: handler_class.into(),
            methods: methods.into_iter().map(Into::into).collect(),
        }
    }

    /// Result key for one method of this job
    pub fn result_key(&self, method: &str) -> String {
        format!("{}/{}", self.handler_class, method)
    }
}

/// Caller-side options for enqueuing a CLI job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliOptions {
    /// Appended to the resolved command after one space
    #[serde(default)]
    pub argv: String,
    /// Written to the child's stdin followed by a line terminator
    #[serde(default)]
    pub pipe: String,
    /// Seconds; 0 disables the timeout
    #[serde(default)]
    pub time_limit: u64,
    /// Store stdout as the job result
    #[serde(default)]
    pub return_output: bool,
}

/// External command invocation, immutable once queued
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliJob {
    key: String,
    resolved_command: String,
    return_output: bool,
    timeout_secs: u64,
    stdin_payload: Option<String>,
    argument_suffix: Option<String>,
}

impl CliJob {
    pub fn new(key: impl Into<String>, resolved_command: impl Into<String>, options: CliOptions) -> Self {
        let stdin_payload = if options.pipe.is_empty() {
            None
        } else {
            Some(format!("{}{}", options.pipe, LINE_TERMINATOR))
        };

        let argument_suffix = if options.argv.is_empty() {
            None
        } else {
            Some(format!(" {}", options.argv))
        };

        Self {
            key: key.into(),
            resolved_command: resolved_command.into(),
            return_output: options.return_output,
            timeout_secs: options.time_limit,
            stdin_payload,
            argument_suffix,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn resolved_command(&self) -> &str {
        &self.resolved_command
    }

    pub fn return_output(&self) -> bool {
        self.return_output
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn stdin_payload(&self) -> Option<&str> {
        self.stdin_payload.as_deref()
    }

    pub fn argument_suffix(&self) -> Option<&str> {
        self.argument_suffix.as_deref()
    }

    /// Shell line to run: resolved command plus argument suffix
    pub fn command_line(&self) -> String {
        match &self.argument_suffix {
            Some(suffix) => format!("{}{}", self.resolved_command, suffix),
            None => self.resolved_command.clone(),
        }
    }

    /// None when no timeout is enforced
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// Job description produced by a command preparer, validated on enqueue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreparedJob {
    Cgi(CgiJob),
    Cli { key: String, options: CliOptions },
}

/// Pending CGI and CLI jobs for one request
#[derive(Debug, Clone, Default)]
pub struct JobQueue {
    cgi: Vec<CgiJob>,
    cli: Vec<CliJob>,
}

impl JobQueue {
    pub fn push_cgi(&mut self, job: CgiJob) {
        self.cgi.push(job);
    }

    pub fn push_cli(&mut self, job: CliJob) {
        self.cli.push(job);
    }

    pub fn cgi(&self) -> &[CgiJob] {
        &self.cgi
    }

    pub fn cli(&self) -> &[CliJob] {
        &self.cli
    }

    /// Hand the CGI jobs to an executor, leaving the queue empty
    pub fn drain_cgi(&mut self) -> Vec<CgiJob> {
        std::mem::take(&mut self.cgi)
    }

    pub fn drain_cli(&mut self) -> Vec<CliJob> {
        std::mem::take(&mut self.cli)
    }

    pub fn is_empty(&self) -> bool {
        self.cgi.is_empty() && self.cli.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipe_gets_exactly_one_terminator() {
        let job = CliJob::new(
            "echo",
            "cat",
            CliOptions {
                pipe: "hello".into(),
                ..Default::default()
            },
        );
        assert_eq!(job.stdin_payload(), Some("hello\n"));
    }

    #[test]
    fn test_empty_pipe_and_argv_are_absent() {
        let job = CliJob::new("ls", "ls -la", CliOptions::default());
        assert_eq!(job.stdin_payload(), None);
        assert_eq!(job.argument_suffix(), None);
        assert_eq!(job.command_line(), "ls -la");
        assert_eq!(job.timeout(), None);
    }

    #[test]
    fn test_argv_gets_leading_space() {
        let job = CliJob::new(
            "grep",
            "grep -n",
            CliOptions {
                argv: "foo bar.txt".into(),
                time_limit: 5,
                return_output: true,
                ..Default::default()
            },
        );
        assert_eq!(job.argument_suffix(), Some(" foo bar.txt"));
        assert_eq!(job.command_line(), "grep -n foo bar.txt");
        assert_eq!(job.timeout(), Some(Duration::from_secs(5)));
        assert!(job.return_output());
    }

    #[test]
    fn test_queue_drain_empties() {
        let mut queue = JobQueue::default();
        queue.push_cgi(CgiJob::new("user", ["login", "profile"]));
        queue.push_cli(CliJob::new("ls", "ls", CliOptions::default()));

        assert_eq!(queue.cgi()[0].result_key("login"), "user/login");

        let cgi = queue.drain_cgi();
        assert_eq!(cgi.len(), 1);
        assert_eq!(cgi[0].methods, vec!["login", "profile"]);
        assert!(queue.cgi().is_empty());
        assert!(!queue.is_empty());

        queue.drain_cli();
        assert!(queue.is_empty());
    }
}
