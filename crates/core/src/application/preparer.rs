// Delimited Command Preparer - `a-m1-m2|b-m3` into prepared jobs

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

use super::constants::{
    CLI_ARGV_KEY, CLI_PIPE_KEY, CLI_RET_KEY, CLI_TIME_KEY, INTERPRETER_ALIAS, JOB_SEPARATOR,
    METHOD_SEPARATOR,
};
use super::registry::HandlerRegistry;
use crate::config::GatewayConfig;
use crate::domain::{CgiJob, CliOptions, PreparedJob, ProcessPool};
use crate::error::{GatewayError, Result};
use crate::port::CommandPreparer;

/// Splits the command on `|`, each segment on `-` (target then methods)
///
/// Registered handlers win over command table keys with the same name.
pub struct DelimitedCommandPreparer {
    registry: Arc<HandlerRegistry>,
    config: Arc<GatewayConfig>,
}

impl DelimitedCommandPreparer {
    pub fn new(registry: Arc<HandlerRegistry>, config: Arc<GatewayConfig>) -> Self {
        Self { registry, config }
    }

    fn is_command(&self, target: &str) -> bool {
        target == INTERPRETER_ALIAS || self.config.cli.contains_key(target)
    }

    fn prepare_segment(&self, segment: &str, pool: &ProcessPool) -> Result<PreparedJob> {
        let mut parts = segment
            .split(METHOD_SEPARATOR)
            .map(str::trim)
            .filter(|p| !p.is_empty());

        let target = parts
            .next()
            .ok_or_else(|| GatewayError::Config(format!("empty job in command \"{segment}\"")))?;

        if self.registry.contains(target) {
            let methods: Vec<&str> = parts.collect();
            if methods.is_empty() {
                return Err(GatewayError::Config(format!(
                    "\"{target}\" needs at least one method"
                )));
            }
            return Ok(PreparedJob::Cgi(CgiJob::new(target, methods)));
        }

        if pool.is_cli() && self.is_command(target) {
            return Ok(PreparedJob::Cli {
                key: target.to_string(),
                options: cli_options(&pool.data)?,
            });
        }

        Err(GatewayError::Config(format!("\"{target}\" NOT found")))
    }
}

#[async_trait]
impl CommandPreparer for DelimitedCommandPreparer {
    /// Bad segments are pushed to `pool.errors`; the others still run
    async fn prepare(&self, pool: &mut ProcessPool) -> Result<Vec<PreparedJob>> {
        let command = pool.command.clone();
        let mut jobs = Vec::new();

        for segment in command.split(JOB_SEPARATOR).filter(|s| !s.trim().is_empty()) {
            match self.prepare_segment(segment, pool) {
                Ok(job) => jobs.push(job),
                Err(e) => pool.push_error(&e),
            }
        }

        debug!(command = %command, jobs = jobs.len(), "Command prepared");
        Ok(jobs)
    }
}

/// CLI options come from the request data (`argv`, `pipe`, `time`, `ret`)
fn cli_options(data: &Map<String, Value>) -> Result<CliOptions> {
    let text = |key: &str| match data.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    let time_limit = match data.get(CLI_TIME_KEY) {
        None | Some(Value::Null) => 0,
        Some(Value::Number(n)) => n.as_u64().ok_or_else(|| invalid(CLI_TIME_KEY, n))?,
        Some(Value::String(s)) => s.trim().parse().map_err(|_| invalid(CLI_TIME_KEY, s))?,
        Some(other) => return Err(invalid(CLI_TIME_KEY, other)),
    };

    let return_output = match data.get(CLI_RET_KEY) {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64() != Some(0),
        Some(Value::String(s)) => !matches!(s.as_str(), "" | "0" | "false"),
        Some(other) => return Err(invalid(CLI_RET_KEY, other)),
    };

    Ok(CliOptions {
        argv: text(CLI_ARGV_KEY),
        pipe: text(CLI_PIPE_KEY),
        time_limit,
        return_output,
    })
}

fn invalid(key: &str, value: impl std::fmt::Display) -> GatewayError {
    GatewayError::Config(format!("invalid \"{key}\" value: {value}"))
}
