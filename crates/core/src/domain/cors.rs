// CORS policy table and gate decision

use serde::Deserialize;
use std::collections::HashMap;

use super::env::RequestEnv;

/// Wildcard origin key
pub const ANY_ORIGIN: &str = "*";

/// Origin -> allowed request headers
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct CorsPolicy {
    origins: HashMap<String, String>,
}

/// Outcome of the CORS gate for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsDecision {
    /// No policy, no Origin, or same-origin request
    Bypass,
    /// Cross-origin request allowed; headers must be emitted
    Allow {
        origin: String,
        allowed_headers: String,
    },
    /// Cross-origin request with no matching entry
    Deny,
}

impl CorsPolicy {
    pub fn new(origins: HashMap<String, String>) -> Self {
        Self { origins }
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    /// Exact origin first, then the wildcard entry
    pub fn allowed_headers(&self, origin: &str) -> Option<&str> {
        self.origins
            .get(origin)
            .or_else(|| self.origins.get(ANY_ORIGIN))
            .map(String::as_str)
    }

    pub fn evaluate(&self, env: &RequestEnv, secure: bool) -> CorsDecision {
        let origin = match env.origin.as_deref() {
            Some(origin) if !self.is_empty() => origin,
            _ => return CorsDecision::Bypass,
        };

        if env.self_origin(secure).as_deref() == Some(origin) {
            return CorsDecision::Bypass;
        }

        match self.allowed_headers(origin) {
            Some(allowed_headers) => CorsDecision::Allow {
                origin: origin.to_string(),
                allowed_headers: allowed_headers.to_string(),
            },
            None => CorsDecision::Deny,
        }
    }
}
