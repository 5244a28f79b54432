//! Error types for the query optimizer caches
//!
//! Only [`OptimizerError::InvalidRequest`] ever reaches a caller of the optimizer
//! facade. The other variants are produced by lower layers (signature building,
//! configuration loading) and are either recovered locally or surfaced by
//! configuration entry points.

use thiserror::Error;

/// Main error type for optimizer operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptimizerError {
    /// The request is not the kind of JSON value the optimizer accepts
    #[error("Invalid request: expected {expected}, found {found}")]
    InvalidRequest {
        expected: &'static str,
        found: &'static str,
    },

    /// A recognized field is present with an unexpected shape
    #[error("Malformed field `{field}`: expected {expected}")]
    MalformedField {
        field: &'static str,
        expected: &'static str,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

impl OptimizerError {
    /// Whether the optimizer can recover from this error by bypassing its caches
    pub fn is_recoverable(&self) -> bool {
        matches!(self, OptimizerError::MalformedField { .. })
    }
}

/// Result type alias for optimizer operations
pub type Result<T> = std::result::Result<T, OptimizerError>;

impl From<serde_json::Error> for OptimizerError {
    fn from(e: serde_json::Error) -> Self {
        OptimizerError::Serialization(e.to_string())
    }
}

impl From<String> for OptimizerError {
    fn from(s: String) -> Self {
        OptimizerError::Other(s)
    }
}

impl From<&str> for OptimizerError {
    fn from(s: &str) -> Self {
        OptimizerError::Other(s.to_string())
    }
}
