//! Startup migration entry points.
//!
//! Hosts run the migration before anything else touches the store, either
//! synchronously on the current thread ([`Migration::run`]), on a dedicated
//! worker thread with a completion callback ([`Migration::spawn`]), or with
//! the crash-before-damage policy ([`Migration::run_or_abort`]). There is
//! no cancellation and no timeout: a stuck migration is preferable to a
//! subsystem racing ahead on an unmigrated store.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use strongbox_migrate::{MigrationReport, Migrator, SchemaCatalog};
use strongbox_storage::SettingsStore;
use tracing::error;

/// Everything a migration run needs.
pub struct MigrationConfig {
    store_path: PathBuf,
    settings: Arc<dyn SettingsStore>,
    catalog: Option<SchemaCatalog>,
}

impl MigrationConfig {
    /// Configure a migration of the store at `store_path`.
    pub fn new(store_path: impl Into<PathBuf>, settings: Arc<dyn SettingsStore>) -> Self {
        MigrationConfig {
            store_path: store_path.into(),
            settings,
            catalog: None,
        }
    }

    /// Use a custom catalog instead of the bundled one.
    pub fn with_catalog(mut self, catalog: SchemaCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// The store file this migration targets.
    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    fn into_migrator(self) -> (Migrator, PathBuf) {
        let catalog = self.catalog.unwrap_or_else(SchemaCatalog::bundled);
        (
            Migrator::new(catalog, self.settings),
            self.store_path,
        )
    }
}

/// Startup migration runner.
pub struct Migration;

impl Migration {
    /// Run the migration synchronously on the calling thread.
    pub fn run(config: MigrationConfig) -> Result<MigrationReport> {
        let (migrator, store_path) = config.into_migrator();
        migrator.run(&store_path).map_err(Error::from)
    }

    /// Run the migration on a dedicated worker thread.
    ///
    /// `on_done` is invoked exactly once, on the worker thread, after the
    /// run reaches its terminal state. The surrounding application is
    /// expected to block its startup sequence on that callback.
    pub fn spawn(
        config: MigrationConfig,
        on_done: impl FnOnce(Result<MigrationReport>) + Send + 'static,
    ) -> Result<JoinHandle<()>> {
        let handle = std::thread::Builder::new()
            .name("strongbox-migration".into())
            .spawn(move || on_done(Self::run(config)))?;
        Ok(handle)
    }

    /// Run the migration; on any failure, log the typed error and abort.
    ///
    /// Continuing with an unmigrated or half-migrated store risks silent
    /// data loss, which is worse than a hard crash with diagnostics. Hosts
    /// whose startup must never proceed past a failed migration call this
    /// instead of handling the `Result` themselves.
    pub fn run_or_abort(config: MigrationConfig) -> MigrationReport {
        match Self::run(config) {
            Ok(report) => report,
            Err(err) => {
                error!(%err, "store migration failed, aborting");
                std::process::abort();
            }
        }
    }
}
