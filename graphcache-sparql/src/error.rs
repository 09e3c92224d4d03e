//! Error types for graphcache-sparql

use thiserror::Error;

/// Result type alias using our ExtractError
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Extraction failure. Every variant carries the byte offset at which the
/// extractor gave up.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    /// The lexer hit an unrecognizable character sequence
    #[error("lexical error at byte {position}: {message}")]
    Lex { message: String, position: usize },

    /// The token stream did not match the SPARQL subset the cache understands
    #[error("parse error at byte {position}: {message}")]
    Parse { message: String, position: usize },

    /// A prefixed name used a prefix with no PREFIX declaration
    #[error("unknown prefix '{prefix}:' at byte {position}")]
    UnknownPrefix { prefix: String, position: usize },
}

impl ExtractError {
    /// Create a lexical error at a byte offset.
    pub fn lex(message: impl Into<String>, position: usize) -> Self {
        ExtractError::Lex {
            message: message.into(),
            position,
        }
    }

    /// Create a parse error at a byte offset.
    pub fn parse(message: impl Into<String>, position: usize) -> Self {
        ExtractError::Parse {
            message: message.into(),
            position,
        }
    }

    /// Create an unknown-prefix error at a byte offset.
    pub fn unknown_prefix(prefix: impl Into<String>, position: usize) -> Self {
        ExtractError::UnknownPrefix {
            prefix: prefix.into(),
            position,
        }
    }
}
