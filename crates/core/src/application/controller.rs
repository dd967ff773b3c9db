//! Stage Controller - drives one request through INIT -> READ -> EXEC -> FLUSH
//!
//! - INIT: CORS gate, then the configured dependency list (best effort)
//! - READ: input reader merges request data into the pool
//! - EXEC: command preparation, CGI jobs, then CLI jobs (CLI mode only)
//! - FLUSH: output formatter writes the MIME header and payload
//!
//! `stop()`, or a stop request left on the pool by any stage, flushes at
//! once and ends the request; every later `boot` is a no-op.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

use super::constants::{
    HEADER_ALLOW_CREDENTIALS, HEADER_ALLOW_HEADERS, HEADER_ALLOW_ORIGIN, INTERPRETER_ALIAS,
};
use super::output::OutputFormatter;
use crate::config::GatewayConfig;
use crate::domain::{
    get_ip, CgiJob, CliJob, CliOptions, CorsDecision, JobQueue, PreparedJob, ProcessPool,
    RequestEnv, Stage,
};
use crate::error::{GatewayError, Result};
use crate::port::{
    CgiExecutor, CliExecutor, CommandPreparer, DependencyExecutor, ErrorReporter, IdProvider,
    InputReader, OsAdapter, ResponseSink,
};

/// Why a boot stopped before reaching its target stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// Cross-origin request with no policy entry; nothing was written
    CorsDenied,
    /// OPTIONS request answered with CORS headers only
    Preflight,
    /// Flushed early by `stop()` or a pool stop request
    Stopped,
}

/// Result of one `boot` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootOutcome {
    Completed(Stage),
    Halted(Halt),
}

/// Everything the controller delegates to
#[derive(Clone)]
pub struct Collaborators {
    pub input_reader: Arc<dyn InputReader>,
    pub command_preparer: Arc<dyn CommandPreparer>,
    pub cgi_executor: Arc<dyn CgiExecutor>,
    pub cli_executor: Arc<dyn CliExecutor>,
    pub dependency_executor: Arc<dyn DependencyExecutor>,
    pub error_reporter: Arc<dyn ErrorReporter>,
    pub os_adapter: Arc<dyn OsAdapter>,
    pub id_provider: Arc<dyn IdProvider>,
}

impl Collaborators {
    /// Swap the input reader (readers usually carry per-request input)
    pub fn with_input_reader(mut self, input_reader: Arc<dyn InputReader>) -> Self {
        self.input_reader = input_reader;
        self
    }
}

/// Stage state machine for one request
pub struct Controller<S: ResponseSink> {
    config: Arc<GatewayConfig>,
    ports: Collaborators,
    env: RequestEnv,
    pool: ProcessPool,
    queue: JobQueue,
    commands: HashMap<String, String>,
    formatter: OutputFormatter,
    sink: S,
    dependencies_ready: bool,
    flushed: bool,
    stopped: bool,
}

impl<S: ResponseSink> Controller<S> {
    pub fn new(config: Arc<GatewayConfig>, ports: Collaborators, env: RequestEnv, sink: S) -> Self {
        let mut pool = ProcessPool::new(&env).with_request_id(ports.id_provider.generate_id());
        pool.mime = config.sys.mime.clone();

        Self {
            commands: config.cli.clone(),
            formatter: OutputFormatter::new(config.sys.diagnostic),
            config,
            ports,
            env,
            pool,
            queue: JobQueue::default(),
            sink,
            dependencies_ready: false,
            flushed: false,
            stopped: false,
        }
    }

    pub fn pool(&self) -> &ProcessPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut ProcessPool {
        &mut self.pool
    }

    pub fn queue(&self) -> &JobQueue {
        &self.queue
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_parts(self) -> (ProcessPool, S) {
        (self.pool, self.sink)
    }

    /// Client IP of this request's environment
    pub fn get_ip(&self) -> String {
        get_ip(&self.env)
    }

    /// Run stages from INIT up to and including `target`
    pub async fn boot(&mut self, target: Stage) -> BootOutcome {
        if self.stopped {
            debug!(request_id = %self.pool.request_id, "Boot after stop ignored");
            return BootOutcome::Halted(Halt::Stopped);
        }

        let span = info_span!(
            "boot",
            request_id = %self.pool.request_id,
            run_mode = %self.pool.run_mode(),
            target = %target
        );
        self.run_until(target).instrument(span).await
    }

    /// Flush now and end the request
    ///
    /// Queued jobs never run; later `boot` calls return `Halted(Stopped)`.
    pub fn stop(&mut self) -> BootOutcome {
        if !self.stopped {
            info!(request_id = %self.pool.request_id, "Stop requested, flushing early");
            self.stopped = true;
            self.flush();
        }
        BootOutcome::Halted(Halt::Stopped)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Queue an in-process handler job
    pub fn add_cgi_job<I, M>(&mut self, handler_class: impl Into<String>, methods: I)
    where
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        let job = CgiJob::new(handler_class, methods);
        debug!(handler = %job.handler_class, methods = ?job.methods, "CGI job queued");
        self.queue.push_cgi(job);
    }

    /// Validate and queue an external command job
    ///
    /// # Errors
    /// - GatewayError::Permission outside CLI mode (checked before anything else)
    /// - GatewayError::Probe if the interpreter alias cannot be resolved
    /// - GatewayError::Config if `key` is not in the command table
    pub async fn add_cli_job(&mut self, key: &str, options: CliOptions) -> Result<CliJob> {
        if !self.pool.is_cli() {
            return Err(GatewayError::Permission(format!(
                "CLI job '{key}' requires CLI mode"
            )));
        }

        if key == INTERPRETER_ALIAS {
            let path = self.ports.os_adapter.interpreter_path().await?;
            debug!(alias = INTERPRETER_ALIAS, path = %path, "Interpreter alias resolved");
            self.commands.insert(INTERPRETER_ALIAS.to_string(), path);
        }

        let resolved = self
            .commands
            .get(key)
            .ok_or_else(|| GatewayError::Config(format!("\"{key}\" NOT defined")))?;

        let job = CliJob::new(key, resolved.clone(), options);
        debug!(key = %key, command = %job.command_line(), "CLI job queued");
        self.queue.push_cli(job.clone());
        Ok(job)
    }

    async fn run_until(&mut self, target: Stage) -> BootOutcome {
        for stage in Stage::ALL {
            debug!(stage = %stage, "Entering stage");

            if let Some(halt) = self.run_stage(stage).await {
                info!(stage = %stage, halt = ?halt, "Boot halted");
                return BootOutcome::Halted(halt);
            }

            if self.pool.stop_requested() {
                info!(stage = %stage, "Stop requested by stage");
                return self.stop();
            }

            if stage == target {
                break;
            }
        }
        BootOutcome::Completed(target)
    }

    async fn run_stage(&mut self, stage: Stage) -> Option<Halt> {
        match stage {
            Stage::Init => {
                if let Some(halt) = self.validate_cors() {
                    return Some(halt);
                }
                self.initialize_dependencies().await;
            }
            Stage::Read => self.read_input().await,
            Stage::Exec => self.execute_jobs().await,
            Stage::Flush => self.flush(),
        }
        None
    }

    fn validate_cors(&mut self) -> Option<Halt> {
        match self
            .config
            .cors
            .evaluate(&self.env, self.pool.transport_secure())
        {
            CorsDecision::Bypass => None,
            CorsDecision::Deny => {
                warn!(origin = ?self.env.origin, "CORS: origin not permitted, terminating");
                Some(Halt::CorsDenied)
            }
            CorsDecision::Allow {
                origin,
                allowed_headers,
            } => {
                self.sink.set_header(HEADER_ALLOW_ORIGIN, &origin);
                self.sink.set_header(HEADER_ALLOW_HEADERS, &allowed_headers);
                self.sink.set_header(HEADER_ALLOW_CREDENTIALS, "true");

                if self.env.is_preflight() {
                    debug!(origin = %origin, "CORS preflight answered");
                    return Some(Halt::Preflight);
                }
                None
            }
        }
    }

    /// Runs at most once per request; failures are reported, not raised
    async fn initialize_dependencies(&mut self) {
        if self.dependencies_ready || self.config.init.is_empty() {
            return;
        }
        self.dependencies_ready = true;

        let list = self.config.init.flatten();
        info!(count = list.len(), "Executing init dependencies");

        if let Err(e) = self.ports.dependency_executor.exec_dependencies(&list).await {
            let wrapped = GatewayError::Execution(e.to_string());
            warn!(error = %wrapped, "Dependency initialization failed, continuing boot");
            self.ports.error_reporter.report(&wrapped);
        }
    }

    async fn read_input(&mut self) {
        if let Err(e) = self.ports.input_reader.read(&mut self.pool).await {
            warn!(error = %e, "Input reader failed");
            self.pool.push_error(&e);
        }
    }

    async fn execute_jobs(&mut self) {
        if !self.pool.command.is_empty() {
            self.prepare_command().await;
        }

        let cgi_jobs = self.queue.drain_cgi();
        if !cgi_jobs.is_empty() {
            info!(jobs = cgi_jobs.len(), "Executing CGI jobs");
            let executor = Arc::clone(&self.ports.cgi_executor);
            if let Err(e) = executor.exec_cgi(&mut self.pool, cgi_jobs).await {
                self.pool.push_error(&e);
            }
        }

        if !self.pool.is_cli() || self.pool.stop_requested() {
            return;
        }

        let cli_jobs = self.queue.drain_cli();
        if !cli_jobs.is_empty() {
            info!(jobs = cli_jobs.len(), "Executing CLI jobs");
            let executor = Arc::clone(&self.ports.cli_executor);
            if let Err(e) = executor.exec_cli(&mut self.pool, cli_jobs).await {
                self.pool.push_error(&e);
            }
        }
    }

    async fn prepare_command(&mut self) {
        let preparer = Arc::clone(&self.ports.command_preparer);
        let jobs = match preparer.prepare(&mut self.pool).await {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!(command = %self.pool.command, error = %e, "Command preparation failed");
                self.pool.push_error(&e);
                return;
            }
        };

        for job in jobs {
            match job {
                PreparedJob::Cgi(job) => self.add_cgi_job(job.handler_class, job.methods),
                PreparedJob::Cli { key, options } => {
                    if let Err(e) = self.add_cli_job(&key, options).await {
                        self.pool.push_error(&e);
                    }
                }
            }
        }
    }

    /// Writes the payload once per request
    fn flush(&mut self) {
        if self.flushed {
            return;
        }
        self.flushed = true;

        if let Err(e) = self.formatter.flush(&self.pool, &mut self.sink) {
            self.ports.error_reporter.report(&e);
        }
    }
}
