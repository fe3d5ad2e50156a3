//! Error types for conversation storage.

use thiserror::Error;

/// Errors emitted by conversation stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The supplied record failed validation.
    #[error("invalid conversation record: {0}")]
    InvalidRecord(&'static str),
    /// The storage backend failed.
    #[error("storage backend error: {reason}")]
    Backend {
        /// Human-readable reason describing the failure.
        reason: String,
    },
}

impl StoreError {
    /// Helper to construct backend errors from string-like values.
    #[must_use]
    pub fn backend(reason: impl Into<String>) -> Self {
        Self::Backend {
            reason: reason.into(),
        }
    }
}

/// Result type alias for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;
