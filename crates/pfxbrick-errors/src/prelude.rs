//! Convenience re-exports.
//!
//! ```
//! use pfxbrick_errors::prelude::*;
//!
//! fn name_fits(name: &str) -> PfxResult<()> {
//!     if name.len() > 24 {
//!         return Err(ValidationError::too_long("name", name.len(), 24).into());
//!     }
//!     Ok(())
//! }
//! # assert!(name_fits("Loco").is_ok());
//! ```

pub use crate::{
    PfxResult,
    common::{ErrorCategory, ErrorSeverity, PfxError},
    filesystem::{FileSystemError, codes as fs_codes, fs_error_message, is_fs_error},
    profile::ProfileError,
    transport::TransportError,
    validation::ValidationError,
};
