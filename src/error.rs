/// Unified error types for the ban checker
use thiserror::Error;

/// Main error type for resolution and ban queries
///
/// The `Display` text of each variant is what ends up in front of the user,
/// so keep the messages short.
#[derive(Error, Debug)]
pub enum CheckError {
    /// No reply from the ban server within the protocol window
    #[error("query timed out")]
    Timeout,

    /// Transport-level failure, message preserved from the underlying cause
    #[error("query error: {0}")]
    Network(String),

    /// Name resolution produced no usable ID
    #[error("unable to resolve identifier {0}")]
    NotFound(String),

    /// A cached or freshly resolved value is not a valid numeric ID
    #[error("invalid id {0}")]
    InvalidState(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// Snapshot (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CheckError {
    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            CheckError::Timeout => "timeout",
            CheckError::Network(_) => "network",
            CheckError::NotFound(_) => "not_found",
            CheckError::InvalidState(_) => "invalid_state",
            CheckError::Config(_) => "config",
            CheckError::Internal(_) => "internal",
            CheckError::Serialization(_) => "serialization",
        }
    }
}

/// Result type alias for checker operations
pub type CheckResult<T> = Result<T, CheckError>;
