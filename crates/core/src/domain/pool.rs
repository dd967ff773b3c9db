// Process Pool - per-request mutable state shared by every stage

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

use super::address::resolve_client_address;
use super::env::{RequestEnv, RunMode};
use crate::error::{GatewayError, Result};

/// Default response MIME type when the deployment sets none
pub const DEFAULT_MIME: &str = "application/json; charset=utf-8";

/// One accumulated error, reported in the final payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub code: i32,
    pub message: String,
}

impl From<&GatewayError> for ErrorEntry {
    fn from(err: &GatewayError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// Per-request state container
///
/// `run_mode` and `transport_secure` are fixed at construction and only
/// readable afterwards. Everything else is mutated by the stages and by
/// the collaborators they call.
#[derive(Debug, Clone)]
pub struct ProcessPool {
    pub request_id: String,
    pub client_address: String,
    pub command: String,
    pub mime: String,
    pub config: Map<String, Value>,
    pub data: Map<String, Value>,
    pub errors: Vec<ErrorEntry>,
    pub results: Map<String, Value>,

    run_mode: RunMode,
    transport_secure: bool,
    extensions: HashMap<String, Vec<Value>>,
    stop_requested: bool,
}

impl ProcessPool {
    /// Build the pool for one request
    ///
    /// In HTTP mode this resolves TLS and the client address from `env`.
    /// CLI mode skips both: the address stays empty and the transport is
    /// treated as secure.
    pub fn new(env: &RequestEnv) -> Self {
        let mut pool = Self {
            request_id: String::new(),
            client_address: String::new(),
            command: String::new(),
            mime: DEFAULT_MIME.to_string(),
            config: Map::new(),
            data: Map::new(),
            errors: Vec::new(),
            results: Map::new(),
            run_mode: env.run_mode,
            transport_secure: true,
            extensions: HashMap::new(),
            stop_requested: false,
        };

        if pool.run_mode == RunMode::Cli {
            return pool;
        }

        pool.transport_secure = env.is_tls();

        if let Some(addr) =
            resolve_client_address(env.forwarded_for.as_deref(), env.remote_addr.as_deref())
        {
            pool.client_address = addr.to_string();
        }

        pool
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    pub fn is_cli(&self) -> bool {
        self.run_mode == RunMode::Cli
    }

    pub fn transport_secure(&self) -> bool {
        self.transport_secure
    }

    /// Merge input values without replacing keys already present
    ///
    /// Returns how many keys were inserted.
    pub fn merge_data(&mut self, incoming: Map<String, Value>) -> usize {
        let mut inserted = 0;
        for (key, value) in incoming {
            if !self.data.contains_key(&key) {
                self.data.insert(key, value);
                inserted += 1;
            }
        }
        inserted
    }

    pub fn push_error(&mut self, err: &GatewayError) {
        self.errors.push(ErrorEntry::from(err));
    }

    pub fn set_result(&mut self, job_key: impl Into<String>, value: Value) {
        self.results.insert(job_key.into(), value);
    }

    /// Ask the controller to flush and end the request after the current step
    pub fn request_stop(&mut self) {
        debug!(request_id = %self.request_id, "Stop requested from within a stage");
        self.stop_requested = true;
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    /// Read an extension field; unknown fields read as an empty list
    pub fn extension(&self, name: &str) -> &[Value] {
        self.extensions
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Write an extension field; only list values are accepted
    pub fn set_extension(&mut self, name: impl Into<String>, value: Value) -> Result<()> {
        let name = name.into();
        match value {
            Value::Array(items) => {
                debug!(field = %name, len = items.len(), "Extension field set");
                self.extensions.insert(name, items);
                Ok(())
            }
            other => Err(GatewayError::TypeMismatch {
                field: name,
                found: value_kind(&other),
            }),
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
