//! Main entry point for Strongbox.
//!
//! [`Strongbox::open`] is the migrate-then-open sequence every host goes
//! through: compact the WAL, bring the store file to the current schema
//! version, then load it. No handle exists — and therefore no reader can
//! exist — until the migration has reached its terminal state.

use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use strongbox_core::{Record, StoreMetadata};
use strongbox_migrate::{MigrationReport, Migrator, SchemaCatalog};
use strongbox_storage::{JsonSettings, SettingsStore, Store};

/// File name of the default settings store, next to the store file.
const SETTINGS_FILE: &str = "settings.json";

/// An open, fully migrated store.
///
/// # Example
///
/// ```ignore
/// use strongbox::Strongbox;
///
/// let sb = Strongbox::open("./wallet/accounts.sbx")?;
/// for account in sb.records("Account") {
///     println!("{account:?}");
/// }
/// ```
pub struct Strongbox {
    store: Store,
    report: MigrationReport,
}

impl Strongbox {
    /// Migrate (if needed) and open the store at `path`.
    ///
    /// Uses the bundled schema catalog and a JSON settings store next to
    /// the store file. A missing store file becomes a fresh, empty store at
    /// the current schema version.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::builder().path(path).open()
    }

    /// Create a builder for custom catalog or settings wiring.
    pub fn builder() -> StrongboxBuilder {
        StrongboxBuilder::new()
    }

    /// Path of the store file.
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Metadata of the (now current-version) store file.
    pub fn metadata(&self) -> &StoreMetadata {
        self.store.metadata()
    }

    /// Records of one entity.
    pub fn records(&self, entity: &str) -> &[Record] {
        self.store.records(entity)
    }

    /// Entity names present in the store.
    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.store.entities()
    }

    /// Append a record (durable in the WAL before returning).
    pub fn append(&mut self, entity: impl Into<String>, record: Record) -> Result<()> {
        self.store.append(entity, record).map_err(Error::from)
    }

    /// Fold pending appends into the store file and truncate the WAL.
    pub fn checkpoint(&mut self) -> Result<()> {
        self.store.checkpoint().map_err(Error::from)
    }

    /// What the startup migration did.
    pub fn migration_report(&self) -> &MigrationReport {
        &self.report
    }
}

impl fmt::Debug for Strongbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strongbox")
            .field("path", &self.path())
            .field("report", &self.report)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Strongbox`].
pub struct StrongboxBuilder {
    path: Option<PathBuf>,
    settings: Option<Arc<dyn SettingsStore>>,
    catalog: Option<SchemaCatalog>,
}

impl StrongboxBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        StrongboxBuilder {
            path: None,
            settings: None,
            catalog: None,
        }
    }

    /// Set the store file path (required).
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use a specific settings collaborator instead of the default JSON
    /// file next to the store.
    pub fn settings(mut self, settings: Arc<dyn SettingsStore>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Use a custom schema catalog instead of the bundled one.
    pub fn catalog(mut self, catalog: SchemaCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Run the startup migration and open the store.
    pub fn open(self) -> Result<Strongbox> {
        let path = self.path.ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "store path not set",
            ))
        })?;

        let settings: Arc<dyn SettingsStore> = match self.settings {
            Some(settings) => settings,
            None => Arc::new(JsonSettings::open(path.with_file_name(SETTINGS_FILE))?),
        };
        let catalog = self.catalog.unwrap_or_else(SchemaCatalog::bundled);

        let migrator = Migrator::new(catalog, settings);
        let report = migrator.run(&path)?;

        let store = if path.exists() {
            Store::load(&path)?
        } else {
            let catalog = migrator.catalog();
            let target = catalog.descriptor(catalog.target())?;
            Store::create(&path, target.metadata())?
        };

        Ok(Strongbox { store, report })
    }
}

impl Default for StrongboxBuilder {
    fn default() -> Self {
        Self::new()
    }
}
