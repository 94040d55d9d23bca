//! Unified error type for Strongbox.
//!
//! This module wraps the member-crate errors and presents one stable type
//! to hosts. Migration failures carried here are fatal by the engine's own
//! rules; [`crate::Migration::run_or_abort`] is the entry point for hosts
//! that want the crash-before-damage behavior instead of a `Result`.

use strongbox_migrate::MigrateError;
use strongbox_storage::StoreError;
use thiserror::Error;

/// All Strongbox errors.
#[derive(Debug, Error)]
pub enum Error {
    /// The startup migration failed; the original store is untouched
    #[error("migration failed: {0}")]
    Migration(#[from] MigrateError),

    /// Storage engine failure outside migration
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error means the store could not be brought to the
    /// current schema version.
    ///
    /// A host must not let any store-dependent subsystem start when this
    /// returns true.
    pub fn is_migration_failure(&self) -> bool {
        matches!(self, Error::Migration(_))
    }
}

/// Result type for Strongbox operations.
pub type Result<T> = std::result::Result<T, Error>;
