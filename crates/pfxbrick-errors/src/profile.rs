//! Sound profile errors.

use crate::common::ErrorSeverity;

/// Errors raised while loading, validating or compiling a sound profile.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileError {
    /// Profile document could not be parsed
    #[error("Invalid profile format in {path}: {reason}")]
    InvalidFormat {
        /// File path or profile source
        path: String,
        /// Reason for the format error
        reason: String,
    },

    /// Profile validation failed
    #[error("Profile validation failed: {0}")]
    ValidationFailed(String),

    /// A referenced audio file is missing or unreadable
    #[error("Audio file {path}: {reason}")]
    AudioFile {
        /// Path of the audio file
        path: String,
        /// Failure reason
        reason: String,
    },

    /// Image export failed
    #[error("Failed to write profile image {path}: {reason}")]
    ExportFailed {
        /// Output path
        path: String,
        /// Failure reason
        reason: String,
    },
}

impl ProfileError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Error
    }

    /// Create an invalid format error.
    pub fn invalid_format(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ProfileError::InvalidFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a validation failure.
    pub fn validation(msg: impl Into<String>) -> Self {
        ProfileError::ValidationFailed(msg.into())
    }

    /// Create an audio file error.
    pub fn audio_file(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ProfileError::AudioFile {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an image export error.
    pub fn export_failed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ProfileError::ExportFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
