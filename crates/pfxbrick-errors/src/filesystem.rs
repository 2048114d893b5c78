//! Device file-system errors.
//!
//! File-system and transfer responses carry a status byte. Values up to 62
//! are byte counts or success codes; anything above is an error code from the
//! table in [`codes`].

use core::fmt;

use crate::common::ErrorSeverity;

/// Highest status value that still means success.
pub const FS_STATUS_MAX_OK: u8 = 62;

/// Error codes reported by the brick.
pub mod codes {
    /// Verify failed
    pub const VERIFY_FAIL: u8 = 0x3F;
    /// File exists
    pub const TRANSFER_FILE_EXISTS: u8 = 0x40;
    /// File too big
    pub const TRANSFER_TOO_BIG: u8 = 0x41;
    /// Transfer request invalid
    pub const TRANSFER_INVALID: u8 = 0x42;
    /// File not found
    pub const TRANSFER_FILE_NOT_FOUND: u8 = 0x43;
    /// Transfer error
    pub const TRANSFER_ERROR: u8 = 0x44;
    /// CRC mismatch
    pub const TRANSFER_CRC_MISMATCH: u8 = 0x45;
    /// Busy, try again
    pub const TRANSFER_BUSY_WAIT: u8 = 0x46;
    /// LUT full
    pub const TRANSFER_LUT_FULL: u8 = 0x47;
    /// Transfer complete
    pub const TRANSFER_COMPLETE: u8 = 0x48;
    /// Upgrade failed
    pub const UPGRADE_FAIL: u8 = 0x49;
    /// File system error
    pub const FILE_SYSTEM_ERR: u8 = 0x50;
    /// File is invalid
    pub const FILE_INVALID: u8 = 0x51;
    /// File access is out of range
    pub const FILE_OUT_OF_RANGE: u8 = 0x52;
    /// File is read only
    pub const FILE_READ_ONLY: u8 = 0x53;
    /// File is too big
    pub const FILE_TOO_BIG: u8 = 0x54;
    /// File not found
    pub const FILE_NOT_FOUND: u8 = 0x55;
    /// File ID is not unique
    pub const FILE_NOT_UNIQUE: u8 = 0x56;
    /// File system is locked or busy
    pub const FILE_LOCKED_BUSY: u8 = 0x57;
    /// File system is full
    pub const FILE_SYSTEM_FULL: u8 = 0x58;
    /// File system operation timed out
    pub const FILE_SYSTEM_TIMEOUT: u8 = 0x59;
    /// File system accessed invalid address
    pub const FILE_INVALID_ADDRESS: u8 = 0x5A;
    /// File system error reading next sector
    pub const FILE_NEXT_SECTOR: u8 = 0x5B;
    /// File system access denied
    pub const FILE_ACCESS_DENIED: u8 = 0x5C;
    /// Bluetooth fault
    pub const BLE_FAULT: u8 = 0x60;
    /// Short circuit on speaker output
    pub const SPKR_SHORTCIR_FAULT: u8 = 0x61;
    /// Overtemperature reported by DAC
    pub const DAC_OVERTEMP_FAULT: u8 = 0x62;
    /// Brown-out reset trap
    pub const TRAP_BROWNOUT_RST: u8 = 0x70;
    /// Reset trap conflict
    pub const TRAP_CONFLICT: u8 = 0x71;
    /// Reset trap due to illegal op code
    pub const TRAP_ILLEGAL_OPCODE: u8 = 0x72;
    /// Reset trap due to configuration mismatch
    pub const TRAP_CONFIG_MISMATCH: u8 = 0x73;
}

/// Human-readable message for a device error code.
pub fn fs_error_message(code: u8) -> &'static str {
    use codes::*;
    match code {
        VERIFY_FAIL => "Verify failed",
        TRANSFER_FILE_EXISTS => "File exists",
        TRANSFER_TOO_BIG => "File too big",
        TRANSFER_INVALID => "Transfer request invalid",
        TRANSFER_FILE_NOT_FOUND => "File not found",
        TRANSFER_ERROR => "Transfer error",
        TRANSFER_CRC_MISMATCH => "CRC mismatch",
        TRANSFER_BUSY_WAIT => "Busy, try again",
        TRANSFER_LUT_FULL => "LUT full",
        TRANSFER_COMPLETE => "Transfer complete",
        UPGRADE_FAIL => "Upgrade failed",
        FILE_SYSTEM_ERR => "File system error",
        FILE_INVALID => "File is invalid",
        FILE_OUT_OF_RANGE => "File access is out of range",
        FILE_READ_ONLY => "File is read only",
        FILE_TOO_BIG => "File is too big",
        FILE_NOT_FOUND => "File not found",
        FILE_NOT_UNIQUE => "File ID is not unique",
        FILE_LOCKED_BUSY => "File system is locked or busy",
        FILE_SYSTEM_FULL => "File system is full",
        FILE_SYSTEM_TIMEOUT => "File system operation timed out",
        FILE_INVALID_ADDRESS => "File system accessed invalid address",
        FILE_NEXT_SECTOR => "File system error reading next sector",
        FILE_ACCESS_DENIED => "File system access denied",
        BLE_FAULT => "Bluetooth fault",
        SPKR_SHORTCIR_FAULT => "Short circuit on speaker output",
        DAC_OVERTEMP_FAULT => "Overtemperature reported by DAC",
        TRAP_BROWNOUT_RST => "Brown-out reset trap",
        TRAP_CONFLICT => "Reset trap conflict",
        TRAP_ILLEGAL_OPCODE => "Reset trap due to illegal OP code",
        TRAP_CONFIG_MISMATCH => "Reset trap due to configuration mismatch",
        c if c <= FS_STATUS_MAX_OK => "None",
        _ => "Unknown error",
    }
}

/// Whether a file-system status byte signals an error.
pub fn is_fs_error(status: u8) -> bool {
    status > FS_STATUS_MAX_OK
}

/// A file-system operation was rejected by the brick.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct FileSystemError {
    /// Operation that failed, e.g. `"file open"`
    pub op: &'static str,
    /// Status byte returned by the device
    pub code: u8,
}

impl fmt::Display for FileSystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed with status {:#04x}: {}",
            self.op,
            self.code,
            self.message()
        )
    }
}

impl FileSystemError {
    /// Create a new file-system error.
    pub fn new(op: &'static str, code: u8) -> Self {
        Self { op, code }
    }

    /// Human-readable message for the status code.
    pub fn message(&self) -> &'static str {
        fs_error_message(self.code)
    }

    /// Get the error severity.
    pub fn severity(&self) -> ErrorSeverity {
        match self.code {
            codes::TRAP_BROWNOUT_RST..=codes::TRAP_CONFIG_MISMATCH => ErrorSeverity::Critical,
            codes::TRANSFER_BUSY_WAIT | codes::FILE_LOCKED_BUSY => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    /// Whether retrying the same operation might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.code,
            codes::TRANSFER_BUSY_WAIT | codes::FILE_LOCKED_BUSY | codes::FILE_SYSTEM_TIMEOUT
        )
    }

    /// Turn a status byte into a result.
    ///
    /// # Errors
    ///
    /// Returns a `FileSystemError` if `status` is above the success range.
    pub fn check(op: &'static str, status: u8) -> Result<u8, FileSystemError> {
        if is_fs_error(status) {
            Err(Self::new(op, status))
        } else {
            Ok(status)
        }
    }
}
