//! Shared error definitions for conversation primitives.

use thiserror::Error;

/// Result alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while manipulating conversation primitives.
#[derive(Debug, Error)]
pub enum Error {
    /// The supplied role name is not one of `system`, `user`, `assistant`.
    #[error("unknown message role `{role}`")]
    UnknownRole {
        /// The offending role string.
        role: String,
    },

    /// The supplied name is not a known prompt type.
    #[error("unknown prompt type `{name}`")]
    UnknownPromptType {
        /// The offending name.
        name: String,
    },
}
