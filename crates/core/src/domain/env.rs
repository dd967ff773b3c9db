// Request Environment - explicit snapshot of where a request came from

use serde::{Deserialize, Serialize};

/// How the current invocation reached the gateway
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunMode {
    #[default]
    Cli,
    Http,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Cli => write!(f, "CLI"),
            RunMode::Http => write!(f, "HTTP"),
        }
    }
}

/// Transport facts the pool and the CORS gate are derived from
///
/// Field names follow the CGI variables they are read from
/// (`HTTPS`, `HTTP_X_FORWARDED_PROTO`, `HTTP_X_FORWARDED_FOR`,
/// `REMOTE_ADDR`, `HTTP_HOST`, `HTTP_ORIGIN`, `REQUEST_METHOD`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestEnv {
    pub run_mode: RunMode,
    pub https: Option<String>,
    pub forwarded_proto: Option<String>,
    pub forwarded_for: Option<String>,
    pub remote_addr: Option<String>,
    pub host: Option<String>,
    pub origin: Option<String>,
    pub method: Option<String>,
}

impl RequestEnv {
    /// Command-line invocation, no transport facts
    pub fn cli() -> Self {
        Self::default()
    }

    /// HTTP invocation with every transport fact unset
    pub fn http() -> Self {
        Self {
            run_mode: RunMode::Http,
            ..Self::default()
        }
    }

    /// Read CGI-style variables from the current process environment
    pub fn from_process_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup (used by `from_process_env` and tests)
    ///
    /// The invocation is HTTP when `GATEWAY_INTERFACE` is present.
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let run_mode = if lookup("GATEWAY_INTERFACE").is_some() {
            RunMode::Http
        } else {
            RunMode::Cli
        };

        Self {
            run_mode,
            https: lookup("HTTPS"),
            forwarded_proto: lookup("HTTP_X_FORWARDED_PROTO"),
            forwarded_for: lookup("HTTP_X_FORWARDED_FOR"),
            remote_addr: lookup("REMOTE_ADDR"),
            host: lookup("HTTP_HOST"),
            origin: lookup("HTTP_ORIGIN"),
            method: lookup("REQUEST_METHOD"),
        }
    }

    /// TLS when HTTPS is "on" or a proxy forwarded "https"
    pub fn is_tls(&self) -> bool {
        self.https.as_deref() == Some("on") || self.forwarded_proto.as_deref() == Some("https")
    }

    /// `scheme://host` of this server, if the host is known
    pub fn self_origin(&self, secure: bool) -> Option<String> {
        let scheme = if secure { "https" } else { "http" };
        self.host.as_ref().map(|host| format!("{scheme}://{host}"))
    }

    pub fn is_preflight(&self) -> bool {
        self.method.as_deref() == Some("OPTIONS")
    }
}
