//! Error types for graphcache

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Query text could not be analyzed for graphs and patterns
    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    /// Backing key-value store failure
    #[error("Backend error: {0}")]
    Backend(String),

    /// An internal consistency check failed (e.g. a record references a
    /// missing record it expected to find)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// `commit_transaction` called with no transaction open
    #[error("No active transaction")]
    NoActiveTransaction,

    /// Persisted record did not round-trip through JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a malformed-query error
    pub fn malformed_query(msg: impl Into<String>) -> Self {
        Error::MalformedQuery(msg.into())
    }

    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Error::Backend(msg.into())
    }

    /// Create an invariant-violation error
    pub fn invariant(msg: impl Into<String>) -> Self {
        Error::InvariantViolation(msg.into())
    }
}
