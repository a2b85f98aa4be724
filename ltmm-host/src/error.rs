//! Host error types.

use ltmm_core::LtmmError;
use thiserror::Error;

/// Errors surfaced to the host application.
#[derive(Debug, Error)]
pub enum HostError {
    /// Error from the core pipeline (format, validation, storage, ...).
    #[error(transparent)]
    Core(#[from] LtmmError),

    /// Neither a command argument nor a user message was available.
    #[error("no message to process")]
    NoInput,

    /// The extension is switched off in settings.
    #[error("LTM Manager is disabled")]
    Disabled,

    /// A blocking storage task panicked or was cancelled.
    #[error("storage task failed: {0}")]
    Join(String),
}

impl From<tokio::task::JoinError> for HostError {
    fn from(err: tokio::task::JoinError) -> Self {
        HostError::Join(err.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, HostError>;
