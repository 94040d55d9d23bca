//! Storage-layer errors.

use thiserror::Error;

/// Errors produced by the store engine, the WAL, and the settings store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not look like a store file, or its integrity check failed
    #[error("corrupt store file: {0}")]
    Corrupt(String),

    /// The file was written by a format this build cannot read
    #[error("unsupported store format version {found} (this build reads {supported})")]
    UnsupportedFormat {
        /// Format version found in the file header
        found: u16,
        /// Format version this build reads and writes
        supported: u16,
    },

    /// Record or metadata encoding failure
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Settings store failure
    #[error("settings error: {0}")]
    Settings(String),
}

impl From<bincode::Error> for StoreError {
    fn from(e: bincode::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;
