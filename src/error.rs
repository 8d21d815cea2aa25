// src/error.rs
// Error taxonomy for the prompt-analysis engine (SPEC_FULL.md §7)

use thiserror::Error;

/// Errors from the LLM boundary — bubbles up only to the AI rewriter and the
/// judge merge, both of which absorb it into a fallback rather than propagating it.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM call timed out")]
    Timeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("unauthorized: missing or invalid credential")]
    Unauthorized,
    #[error("rate limited")]
    RateLimited,
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else if e.status().map(|s| s.as_u16()) == Some(401) {
            LlmError::Unauthorized
        } else if e.status().map(|s| s.as_u16()) == Some(429) {
            LlmError::RateLimited
        } else {
            LlmError::Network(e.to_string())
        }
    }
}

/// Errors from the embedded relational store. Surfaced to the orchestrator,
/// which logs them and marks the analysis non-persisted rather than failing the request.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type LlmResult<T> = Result<T, LlmError>;
pub type StorageResult<T> = Result<T, StorageError>;
