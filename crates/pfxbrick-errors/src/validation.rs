//! Host-side validation errors.

use crate::common::ErrorSeverity;

/// Validation failures detected before or instead of talking to the brick.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Value out of range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Field name
        field: String,
        /// The invalid value
        value: String,
        /// Minimum allowed value
        min: String,
        /// Maximum allowed value
        max: String,
    },

    /// An IR gesture description could not be parsed
    #[error("Unrecognized remote control gesture '{0}'")]
    InvalidGesture(String),

    /// A firmware version string is not `M.mm`
    #[error("Malformed version string '{0}'")]
    MalformedVersion(String),

    /// Value too long
    #[error("Field '{field}' is too long: {actual} bytes (max: {max})")]
    TooLong {
        /// Field name
        field: String,
        /// Actual length
        actual: usize,
        /// Maximum allowed length
        max: usize,
    },

    /// All startup event slots hold unrelated actions
    #[error("Startup event table is full")]
    LutFull,

    /// No unused file id left on the device
    #[error("No free file id available")]
    NoFreeFileId,

    /// A named file does not exist on the device
    #[error("File '{0}' not found on brick")]
    FileNotFound(String),

    /// Constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl ValidationError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ValidationError::LutFull | ValidationError::NoFreeFileId => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    /// Create an out of range error.
    pub fn out_of_range<T: ToString>(field: impl Into<String>, value: T, min: T, max: T) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }

    /// Create a too long error.
    pub fn too_long(field: impl Into<String>, actual: usize, max: usize) -> Self {
        ValidationError::TooLong {
            field: field.into(),
            actual,
            max,
        }
    }

    /// Create a constraint violation error.
    pub fn constraint(msg: impl Into<String>) -> Self {
        ValidationError::ConstraintViolation(msg.into())
    }
}
