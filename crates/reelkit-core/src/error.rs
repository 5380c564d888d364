//! Error types for ReelKit.

use thiserror::Error;

/// A value violated one of the model's construction bounds.
///
/// Raised synchronously by constructors and edit operations. Validation is
/// deterministic: retrying with the same input fails the same way.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Validation error: {reason}")]
pub struct ValidationError {
    reason: String,
}

impl ValidationError {
    /// Create a validation error with a human-readable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Which field violated which bound.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Errors reported by the playback, processing and export collaborators.
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Not initialized: {0}")]
    NotInitialized(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl MediaError {
    /// True when the operation stopped because cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result alias for model construction and edits.
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Result alias for collaborator operations.
pub type Result<T> = std::result::Result<T, MediaError>;
