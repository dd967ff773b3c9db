// Central Error Type for the Gateway

use thiserror::Error;

/// Numeric codes attached to errors collected in the process pool
pub mod code {
    pub const TYPE_MISMATCH: i32 = 4000;
    pub const CONFIG_ERROR: i32 = 4001;
    pub const SERIALIZATION_ERROR: i32 = 4002;
    pub const PERMISSION_DENIED: i32 = 4003;
    pub const EXECUTION_ERROR: i32 = 5000;
    pub const IO_ERROR: i32 = 5001;
    pub const PROBE_ERROR: i32 = 5002;
}

/// Gateway-level error type
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation not permitted: {0}")]
    Permission(String),

    #[error("Probe error: {0}")]
    Probe(#[from] crate::port::ProbeError),

    #[error("Type mismatch on field '{field}': expected list, got {found}")]
    TypeMismatch { field: String, found: &'static str },

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GatewayError {
    /// Code reported alongside the message in the response payload
    pub fn code(&self) -> i32 {
        match self {
            GatewayError::Config(_) => code::CONFIG_ERROR,
            GatewayError::Permission(_) => code::PERMISSION_DENIED,
            GatewayError::Probe(_) => code::PROBE_ERROR,
            GatewayError::TypeMismatch { .. } => code::TYPE_MISMATCH,
            GatewayError::Execution(_) => code::EXECUTION_ERROR,
            GatewayError::Io(_) => code::IO_ERROR,
            GatewayError::Serialization(_) => code::SERIALIZATION_ERROR,
        }
    }
}

/// Result type alias using GatewayError
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::ProbeError;

    #[test]
    fn test_codes_are_distinct_per_kind() {
        let errors = [
            GatewayError::Config("x".into()),
            GatewayError::Permission("x".into()),
            GatewayError::Probe(ProbeError::Unparsable("x".into())),
            GatewayError::TypeMismatch {
                field: "x".into(),
                found: "string",
            },
            GatewayError::Execution("x".into()),
        ];

        let mut codes: Vec<i32> = errors.iter().map(GatewayError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_type_mismatch_message() {
        let err = GatewayError::TypeMismatch {
            field: "tags".into(),
            found: "number",
        };
        assert_eq!(
            err.to_string(),
            "Type mismatch on field 'tags': expected list, got number"
        );
    }
}
