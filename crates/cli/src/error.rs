//! Error types for pfxctl

use pfxbrick_errors::{ErrorCategory, PfxError, TransportError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Brick not found: {0}")]
    DeviceNotFound(String),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("{failed} of {total} profile steps failed")]
    StepsFailed { failed: usize, total: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Process exit code for a failed command.
pub fn exit_code(error: &anyhow::Error) -> i32 {
    if let Some(e) = error.downcast_ref::<CliError>() {
        return match e {
            CliError::DeviceNotFound(_) => 2,
            CliError::ProfileNotFound(_) => 3,
            CliError::ValidationError(_) | CliError::JsonError(_) => 4,
            CliError::StepsFailed { .. } => 7,
            CliError::IoError(_) => 1,
        };
    }
    match error.downcast_ref::<PfxError>() {
        Some(PfxError::Transport(TransportError::NotFound(_))) => 2,
        Some(e) => match e.category() {
            ErrorCategory::Validation | ErrorCategory::Profile => 4,
            ErrorCategory::Transport => 5,
            ErrorCategory::FileSystem => 6,
            ErrorCategory::IO => 1,
        },
        None => 1,
    }
}
