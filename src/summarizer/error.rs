//! Errors raised by the summarizer.
//!
//! Only conditions that indicate a broken setup end up here. "Nothing worth
//! keeping" is an ordinary outcome, see [`super::outcome::EmptyReason`].

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SummarizerError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Aspect store {path:?} is corrupt: {reason}")]
    CorruptAspectStore { path: PathBuf, reason: String },

    #[error("Invalid aspect store: {0}")]
    InvalidAspects(String),

    #[error("Embedding provider failed: {0}")]
    Embedding(#[source] anyhow::Error),

    #[error("Embedding call timed out after {0:?}")]
    EmbeddingTimeout(std::time::Duration),

    #[error("Embedding provider returned {got} vectors for {expected} texts")]
    EmbeddingCount { expected: usize, got: usize },

    #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, SummarizerError>;
