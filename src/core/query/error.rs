//! Query Core Error Types
//!
//! Lookups never fail: a miss or an ambiguity is a value. Only alias
//! persistence and alias command validation produce errors.

use thiserror::Error;

/// Errors that can occur while reading or mutating user aliases
#[derive(Debug, Error)]
pub enum AliasError {
    #[error("Unknown alias category: {0}")]
    UnknownCategory(String),

    #[error("Alias not found: [{category}] {alias}")]
    AliasNotFound { category: String, alias: String },

    #[error("Alias and target must not be empty")]
    EmptyAlias,

    #[error("Alias load failed: {0}")]
    Load(String),

    /// The in-memory table already holds the change; durable storage does not.
    #[error("Alias persist failed: {0}")]
    Persist(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AliasError {
    /// True when the change was applied in memory but could not be saved.
    pub fn is_persist_failure(&self) -> bool {
        matches!(self, AliasError::Persist(_))
    }
}

/// Result type alias for alias operations
pub type AliasResult<T> = Result<T, AliasError>;
