//! Snapshot tests for user-facing error messages.

use insta::assert_snapshot;
use pfxbrick_errors::prelude::*;

#[test]
fn test_transport_timeout_message() {
    let err: PfxError = TransportError::ResponseTimeout { waited_ms: 1000 }.into();
    assert_snapshot!(err.to_string(), @"Transport error: Timeout waiting for response after 1000ms");
}

#[test]
fn test_invalid_response_message() {
    let err = TransportError::invalid_response(0x02, 0x7E);
    assert_snapshot!(err.to_string(), @"Invalid response: expected tag 0x82, got 0x7e");
}

#[test]
fn test_fs_error_message() {
    let err: PfxError = FileSystemError::new("file open", fs_codes::FILE_SYSTEM_FULL).into();
    assert_snapshot!(err.to_string(), @"File system error: file open failed with status 0x58: File system is full");
}

#[test]
fn test_lut_full_message() {
    let err: PfxError = ValidationError::LutFull.into();
    assert_snapshot!(err.to_string(), @"Validation error: Startup event table is full");
}
