//! Error types for the PFx Brick host libraries.
//!
//! Errors fall into four families, each with its own module:
//!
//! - [`transport`]: malformed or missing responses, disconnects. Fatal to the
//!   current session; the channel should be closed and reopened.
//! - [`filesystem`]: device file-system status codes (`> 62`) mapped through a
//!   fixed code table. Recoverable by the caller.
//! - [`validation`]: out-of-range addresses, unparseable gestures, full
//!   startup table and similar host-side checks.
//! - [`profile`]: sound-profile loading and compilation failures.
//!
//! [`PfxError`] wraps all of them and is what the command layers return.
//!
//! # Example
//!
//! ```
//! use pfxbrick_errors::prelude::*;
//!
//! fn check_channel(ch: u8) -> PfxResult<u8> {
//!     if ch > 3 {
//!         return Err(ValidationError::out_of_range("channel", ch, 0, 3).into());
//!     }
//!     Ok(ch)
//! }
//!
//! assert!(check_channel(5).is_err());
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod common;
pub mod filesystem;
pub mod prelude;
pub mod profile;
pub mod transport;
pub mod validation;

pub use common::{ErrorCategory, ErrorSeverity, PfxError};
pub use filesystem::{FileSystemError, fs_error_message, is_fs_error};
pub use profile::ProfileError;
pub use transport::TransportError;
pub use validation::ValidationError;

/// A specialized `Result` type for PFx Brick operations.
pub type PfxResult<T> = std::result::Result<T, PfxError>;
