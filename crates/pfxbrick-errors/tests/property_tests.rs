//! Property-based tests for the file-system code table and error composition.

use pfxbrick_errors::prelude::*;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_status_threshold_matches_check(status in any::<u8>()) {
        let checked = FileSystemError::check("file read", status);
        prop_assert_eq!(checked.is_err(), status > 62);
        prop_assert_eq!(is_fs_error(status), status > 62);
    }

    #[test]
    fn prop_every_error_code_has_a_message(code in 63u8..=255) {
        let msg = fs_error_message(code);
        prop_assert!(!msg.is_empty());
        prop_assert_ne!(msg, "None");
    }

    #[test]
    fn prop_fs_errors_never_require_reconnect(code in 63u8..=255) {
        let err: PfxError = FileSystemError::new("file write", code).into();
        prop_assert!(!err.requires_reconnect());
        prop_assert_eq!(err.category(), ErrorCategory::FileSystem);
    }

    #[test]
    fn prop_invalid_response_expects_reply_bit(opcode in 0u8..0x80, actual in any::<u8>()) {
        let err = TransportError::invalid_response(opcode, actual);
        match err {
            TransportError::InvalidResponse { expected, .. } => {
                prop_assert_eq!(expected, opcode | 0x80);
            }
            other => prop_assert!(false, "unexpected variant {other:?}"),
        }
    }
}
