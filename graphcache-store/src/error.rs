//! Error types for graphcache-store

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Facade error type
#[derive(Error, Debug)]
pub enum Error {
    /// The underlying store adapter failed; adapter errors propagate
    /// unchanged
    #[error("Adapter error: {0}")]
    Adapter(String),

    /// Query text the cache could not analyze; nothing was forwarded
    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    /// Failure inside the cache engine or its backing KV store
    #[error(transparent)]
    Cache(#[from] graphcache_core::Error),
}

impl Error {
    /// Create an adapter error
    pub fn adapter(msg: impl Into<String>) -> Self {
        Error::Adapter(msg.into())
    }
}
