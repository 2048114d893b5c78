//! Transport-level errors.
//!
//! Everything here means the request/response discipline was broken. The
//! caller cannot tell what state the device is in afterwards, so most of these
//! are fatal to the session.

use crate::common::ErrorSeverity;

/// Errors raised while carrying a request to the brick and back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Response tag did not match `request[0] | 0x80`
    #[error("Invalid response: expected tag {expected:#04x}, got {actual:#04x}")]
    InvalidResponse {
        /// Expected response tag
        expected: u8,
        /// Tag actually received
        actual: u8,
    },

    /// Response was too short to decode
    #[error("Short response to opcode {opcode:#04x}: expected {expected} bytes, got {actual}")]
    ShortResponse {
        /// Request opcode
        opcode: u8,
        /// Minimum byte count required
        expected: usize,
        /// Byte count received
        actual: usize,
    },

    /// No response within the retry budget
    #[error("Timeout waiting for response after {waited_ms}ms")]
    ResponseTimeout {
        /// Time spent waiting in milliseconds
        waited_ms: u64,
    },

    /// Request does not fit a single report
    #[error("Request of {len} bytes exceeds the {max}-byte report payload")]
    RequestTooLong {
        /// Request length
        len: usize,
        /// Maximum payload length
        max: usize,
    },

    /// The device went away
    #[error("Device disconnected")]
    Disconnected,

    /// The channel was already closed by this host
    #[error("Channel closed")]
    Closed,

    /// No matching device was found
    #[error("Device not found: {0}")]
    NotFound(String),

    /// Opening the device failed
    #[error("Failed to open device: {0}")]
    Open(String),

    /// Low-level read failure
    #[error("Failed to read from device: {0}")]
    Read(String),

    /// Low-level write failure
    #[error("Failed to write to device: {0}")]
    Write(String),

    /// Bluetooth stack failure
    #[error("Bluetooth error: {0}")]
    Ble(String),
}

impl TransportError {
    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TransportError::InvalidResponse { .. } => ErrorSeverity::Error,
            TransportError::ShortResponse { .. } => ErrorSeverity::Error,
            TransportError::ResponseTimeout { .. } => ErrorSeverity::Critical,
            TransportError::RequestTooLong { .. } => ErrorSeverity::Error,
            TransportError::Disconnected => ErrorSeverity::Critical,
            TransportError::Closed => ErrorSeverity::Error,
            TransportError::NotFound(_) => ErrorSeverity::Error,
            TransportError::Open(_) => ErrorSeverity::Error,
            TransportError::Read(_) => ErrorSeverity::Error,
            TransportError::Write(_) => ErrorSeverity::Error,
            TransportError::Ble(_) => ErrorSeverity::Error,
        }
    }

    /// Whether the session has to be closed and reopened.
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            TransportError::InvalidResponse { .. }
                | TransportError::ResponseTimeout { .. }
                | TransportError::Disconnected
                | TransportError::Read(_)
                | TransportError::Write(_)
                | TransportError::Ble(_)
        )
    }

    /// Whether retrying the same call might succeed without reopening.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::NotFound(_) | TransportError::Open(_))
    }

    /// Create an invalid response error from the request and response tags.
    pub fn invalid_response(request_opcode: u8, actual: u8) -> Self {
        TransportError::InvalidResponse {
            expected: request_opcode | 0x80,
            actual,
        }
    }

    /// Create a short response error.
    pub fn short_response(opcode: u8, expected: usize, actual: usize) -> Self {
        TransportError::ShortResponse {
            opcode,
            expected,
            actual,
        }
    }
}
