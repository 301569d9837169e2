//! Domain errors for the mrag retrieval pipeline.

use thiserror::Error;

/// Domain-level errors that can occur in the mrag system.
///
/// Adapters (encoder, store, generator) raise these on hard failures.
/// Malformed LLM output is deliberately *not* represented here: the
/// assistant layer downgrades it to safe defaults instead of erroring.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Backend(err.to_string())
    }
}

impl From<reqwest::Error> for DomainError {
    fn from(err: reqwest::Error) -> Self {
        DomainError::Backend(err.to_string())
    }
}
