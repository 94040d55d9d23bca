//! Convenience re-exports for Strongbox hosts.
//!
//! ```ignore
//! use strongbox::prelude::*;
//! ```

pub use crate::error::{Error, Result};
pub use crate::migration::{Migration, MigrationConfig};
pub use crate::settings::{JsonSettings, MemorySettings, SettingsExt, SettingsStore};
pub use crate::store::{Strongbox, StrongboxBuilder};
pub use strongbox_core::{FieldKind, FieldValue, Record, SchemaVersion, StoreMetadata};
pub use strongbox_migrate::{MigrationPhase, MigrationReport, SchemaCatalog, StepReport};
