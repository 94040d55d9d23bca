//! The store engine.
//!
//! A [`Store`] is the primary file plus its WAL sidecar. Opening a store
//! loads the file and replays committed WAL entries on top, so the in-memory
//! image always reflects every acknowledged write. Appends go to the WAL
//! first; [`Store::checkpoint`] folds them into the primary file (atomic
//! rewrite) and truncates the log.

use crate::error::Result;
use crate::format::{self, StoreImage};
use crate::wal::{wal_path, Wal, WalEntry};
use std::path::{Path, PathBuf};
use strongbox_core::{Record, StoreMetadata};
use tracing::debug;

/// An open store: primary file image plus WAL.
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    image: StoreImage,
    wal: Wal,
}

impl Store {
    /// Create a new, empty store file carrying `metadata`.
    pub fn create(path: impl Into<PathBuf>, metadata: StoreMetadata) -> Result<Self> {
        let path = path.into();
        let image = StoreImage::new(metadata);
        format::write_store(&path, &image)?;
        let wal = Wal::open(wal_path(&path));
        debug!(path = %path.display(), "created store");
        Ok(Store { path, image, wal })
    }

    /// Open an existing store file and replay its WAL.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut image = format::read_store(&path)?;
        let wal = Wal::open(wal_path(&path));
        let pending = wal.replay()?;
        let replayed = pending.len();
        for entry in pending {
            match entry {
                WalEntry::Append { entity, record } => image.push_record(entity, record),
            }
        }
        debug!(path = %path.display(), replayed, "loaded store");
        Ok(Store { path, image, wal })
    }

    /// Path of the primary store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The metadata the primary file was written with.
    pub fn metadata(&self) -> &StoreMetadata {
        &self.image.metadata
    }

    /// Records of one entity, committed and pending alike.
    pub fn records(&self, entity: &str) -> &[Record] {
        self.image.records(entity)
    }

    /// Entity names present in the store, in name order.
    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.image.entities.keys().map(String::as_str)
    }

    /// Whether the WAL holds entries not yet folded into the primary file.
    pub fn has_pending_wal(&self) -> bool {
        self.wal.has_entries()
    }

    /// Append a record. Durable (in the WAL) before this returns.
    pub fn append(&mut self, entity: impl Into<String>, record: Record) -> Result<()> {
        let entity = entity.into();
        self.wal.append(&WalEntry::Append {
            entity: entity.clone(),
            record: record.clone(),
        })?;
        self.image.push_record(entity, record);
        Ok(())
    }

    /// Rewrite the primary file from the in-memory image and truncate the WAL.
    pub fn checkpoint(&mut self) -> Result<()> {
        format::write_store(&self.path, &self.image)?;
        self.wal.reset()?;
        debug!(path = %self.path.display(), records = self.image.record_count(), "checkpointed store");
        Ok(())
    }

    /// Consume the store, returning its in-memory image.
    pub fn into_image(self) -> StoreImage {
        self.image
    }
}
