//! Error types for editing, import, and export operations.

use thiserror::Error;

/// Errors that can occur while editing a session or writing its artifacts.
#[derive(Error, Debug)]
pub enum EditorError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image could not be read or decoded
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// User-supplied value failed validation
    #[error("Invalid {field}: {reason}")]
    Validation {
        /// Name of the offending input
        field: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Operation attempted in a state that cannot accept it
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Description of the unmet state requirement
        message: String,
    },

    /// Export requested with nothing to write
    #[error("Nothing to export: {message}")]
    NothingToExport {
        /// What the export was missing
        message: String,
    },
}

impl EditorError {
    /// Create a validation error for a named input.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid state error with a message.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a nothing-to-export error with a message.
    pub fn nothing_to_export(message: impl Into<String>) -> Self {
        Self::NothingToExport {
            message: message.into(),
        }
    }

    /// Whether this error is recoverable by re-prompting the user.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}
