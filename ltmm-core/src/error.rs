//! Error types for the LTMM core library.

use thiserror::Error;

/// Top-level error type for all LTMM operations.
#[derive(Error, Debug)]
pub enum LtmmError {
    /// The scanned text contains no recognizable LTM tag.
    #[error("No LTM tag found in message")]
    Format,

    /// A World Info document is missing its entry collection or is otherwise unusable.
    #[error("Invalid World Info document '{document}': {reason}")]
    Validation {
        /// Name of the offending document (empty when unnamed).
        document: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A named World Info document could not be located.
    #[error("World Info document not found: {0}")]
    NotFound(String),

    /// A roster character with the given ID does not exist.
    #[error("Character not found: {0}")]
    CharacterNotFound(u64),

    /// Removing the character would leave the roster empty.
    #[error("At least one character is required")]
    LastCharacter,

    /// A position value outside `0` (before character) / `1` (after character).
    #[error("Invalid position value {0}: use 0 (before character) or 1 (after character)")]
    InvalidPosition(u8),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LtmmError {
    /// Shorthand for a [`LtmmError::Validation`] error.
    #[must_use]
    pub fn validation(document: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            document: document.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, LtmmError>;
