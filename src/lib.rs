//! # Strongbox
//!
//! Embedded account store with schema-versioned startup migration.
//!
//! A Strongbox store is a single file plus a WAL sidecar. Builds evolve the
//! store's schema over time; when a newer build opens a store written by an
//! older one, the file is upgraded step by step along the version chain —
//! deduplicating legacy accounts, folding old settings into records, and
//! atomically replacing the file — before any caller gets a handle.
//!
//! ## Quick start
//!
//! ```ignore
//! use strongbox::Strongbox;
//!
//! // Migrates if needed, then opens. Creates a fresh store when absent.
//! let sb = Strongbox::open("./wallet/accounts.sbx")?;
//! println!("accounts: {}", sb.records("Account").len());
//! ```
//!
//! ## Hosts that must not outlive a failed migration
//!
//! ```ignore
//! use std::sync::Arc;
//! use strongbox::{Migration, MigrationConfig};
//! use strongbox::settings::JsonSettings;
//!
//! let settings = Arc::new(JsonSettings::open("./wallet/settings.json")?);
//! // Logs the typed error and aborts the process on any fatal condition.
//! let report = Migration::run_or_abort(
//!     MigrationConfig::new("./wallet/accounts.sbx", settings),
//! );
//! ```

#![warn(missing_docs)]

mod error;
mod migration;
mod store;

pub mod prelude;

// Re-export main entry points
pub use error::{Error, Result};
pub use migration::{Migration, MigrationConfig};
pub use store::{Strongbox, StrongboxBuilder};

// Re-export the types hosts handle directly
pub use strongbox_core::{FieldKind, FieldValue, Record, SchemaVersion, StoreMetadata};
pub use strongbox_migrate::{MigrationPhase, MigrationReport, SchemaCatalog, StepReport};

/// Settings collaborator types.
pub mod settings {
    pub use strongbox_storage::settings::{
        JsonSettings, MemorySettings, SettingsExt, SettingsStore,
    };
}
