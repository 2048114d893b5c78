//! Top-level error type and classification shared by every PFx Brick crate.

use core::fmt;

use crate::{FileSystemError, ProfileError, TransportError, ValidationError};

/// Top-level error type wrapping every sub-error.
#[derive(Debug, thiserror::Error)]
pub enum PfxError {
    /// Transport errors (framing, timeout, disconnect)
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Device file-system errors
    #[error("File system error: {0}")]
    FileSystem(#[from] FileSystemError),

    /// Host-side validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Sound profile errors
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),
}

impl PfxError {
    /// Get the error category for classification.
    pub fn category(&self) -> ErrorCategory {
        match self {
            PfxError::Transport(_) => ErrorCategory::Transport,
            PfxError::FileSystem(_) => ErrorCategory::FileSystem,
            PfxError::Validation(_) => ErrorCategory::Validation,
            PfxError::Profile(_) => ErrorCategory::Profile,
            PfxError::Io(_) => ErrorCategory::IO,
        }
    }

    /// Get the error severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PfxError::Transport(e) => e.severity(),
            PfxError::FileSystem(e) => e.severity(),
            PfxError::Validation(e) => e.severity(),
            PfxError::Profile(e) => e.severity(),
            PfxError::Io(_) => ErrorSeverity::Error,
        }
    }

    /// Check if retrying the same operation might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            PfxError::Transport(e) => e.is_retryable(),
            PfxError::FileSystem(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Check if the session must be closed and reopened before continuing.
    pub fn requires_reconnect(&self) -> bool {
        matches!(self, PfxError::Transport(e) if e.is_session_fatal())
    }
}

impl From<std::io::Error> for PfxError {
    fn from(e: std::io::Error) -> Self {
        PfxError::Io(e)
    }
}

/// Error category for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Transport errors
    Transport = 0,
    /// Device file-system errors
    FileSystem = 1,
    /// Validation errors
    Validation = 2,
    /// Profile errors
    Profile = 3,
    /// I/O errors
    IO = 4,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Transport => write!(f, "Transport"),
            ErrorCategory::FileSystem => write!(f, "FileSystem"),
            ErrorCategory::Validation => write!(f, "Validation"),
            ErrorCategory::Profile => write!(f, "Profile"),
            ErrorCategory::IO => write!(f, "IO"),
        }
    }
}

/// Error severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ErrorSeverity {
    /// Informational, no action required
    Info = 0,
    /// Warning, may require attention
    Warning = 1,
    /// Error, operation failed
    Error = 2,
    /// Critical, the session must be torn down
    Critical = 3,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Transport.to_string(), "Transport");
        assert_eq!(ErrorCategory::FileSystem.to_string(), "FileSystem");
    }

    #[test]
    fn test_error_severity_ordering() {
        assert!(ErrorSeverity::Critical > ErrorSeverity::Error);
        assert!(ErrorSeverity::Error > ErrorSeverity::Warning);
        assert!(ErrorSeverity::Warning > ErrorSeverity::Info);
    }

    #[test]
    fn test_category_follows_variant() {
        let err: PfxError = TransportError::Disconnected.into();
        assert_eq!(err.category(), ErrorCategory::Transport);

        let err: PfxError = FileSystemError::new("open", 0x55).into();
        assert_eq!(err.category(), ErrorCategory::FileSystem);
    }

    #[test]
    fn test_timeout_requires_reconnect() {
        let err: PfxError = TransportError::ResponseTimeout { waited_ms: 1000 }.into();
        assert!(err.requires_reconnect());
        assert_eq!(err.severity(), ErrorSeverity::Critical);

        let err: PfxError = ValidationError::LutFull.into();
        assert!(!err.requires_reconnect());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.wav");
        let err: PfxError = io.into();
        assert_eq!(err.category(), ErrorCategory::IO);
        assert!(err.to_string().contains("missing.wav"));
    }
}
