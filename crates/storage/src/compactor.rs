//! WAL compaction.
//!
//! Before a store file's metadata can be trusted, any pending WAL content
//! must be folded into the primary file. [`WalCompactor::compact`] does this
//! with a transient open-checkpoint-close cycle; afterwards the file on disk
//! is the complete picture and the sidecar is gone.

use crate::error::Result;
use crate::store::Store;
use crate::wal::{wal_path, Wal};
use std::path::Path;
use tracing::{debug, info};

/// Folds pending WAL data into the primary store file.
pub struct WalCompactor;

impl WalCompactor {
    /// Compact the store at `store_path`.
    ///
    /// No-op when the store file does not exist or the WAL is empty. Any
    /// failure is propagated: inspecting a file whose sidecar could not be
    /// folded in risks reading stale metadata.
    pub fn compact(store_path: &Path) -> Result<()> {
        if !store_path.exists() {
            debug!(path = %store_path.display(), "no store file, nothing to compact");
            return Ok(());
        }
        let wal = Wal::open(wal_path(store_path));
        if !wal.has_entries() {
            debug!(path = %store_path.display(), "WAL empty, nothing to compact");
            return Ok(());
        }

        let mut store = Store::load(store_path)?;
        store.checkpoint()?;
        info!(path = %store_path.display(), "compacted WAL into store file");
        Ok(())
    }
}
