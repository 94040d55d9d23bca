//! Write-ahead log sidecar.
//!
//! Records appended between checkpoints are written to `<store>.wal` before
//! the in-memory image is touched, so a crash never loses an acknowledged
//! append. Each entry is framed as `len u32 | crc32 u32 | bincode payload`,
//! all little-endian.
//!
//! Replay is tolerant of a torn tail: a short read or a checksum mismatch at
//! the end of the file ends replay without error, and whatever follows is
//! discarded at the next checkpoint. Corruption *before* the tail is still
//! fatal — a hole in the middle of the log means acknowledged writes are
//! gone.

use crate::error::{Result, StoreError};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use strongbox_core::Record;
use tracing::{debug, warn};

/// One logged operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WalEntry {
    /// A record appended to an entity section.
    Append {
        /// Entity the record belongs to
        entity: String,
        /// The record payload
        record: Record,
    },
}

/// The sidecar path for a store file (`accounts.sbx` → `accounts.sbx.wal`).
pub fn wal_path(store_path: &Path) -> PathBuf {
    let mut name = store_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".wal");
    store_path.with_file_name(name)
}

/// Append-only log of operations not yet folded into the store file.
#[derive(Debug)]
pub struct Wal {
    path: PathBuf,
    file: Option<File>,
}

impl Wal {
    /// Open (or lazily create) the log at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Wal {
            path: path.into(),
            file: None,
        }
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the log file exists and holds at least one byte.
    pub fn has_entries(&self) -> bool {
        std::fs::metadata(&self.path)
            .map(|m| m.len() > 0)
            .unwrap_or(false)
    }

    /// Read every committed entry, stopping silently at a torn tail.
    pub fn replay(&self) -> Result<Vec<WalEntry>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        let mut cursor = std::io::Cursor::new(bytes.as_slice());
        loop {
            let offset = cursor.position();
            let len = match cursor.read_u32::<LittleEndian>() {
                Ok(len) => len as usize,
                Err(_) => break, // end of log
            };
            let crc = match cursor.read_u32::<LittleEndian>() {
                Ok(crc) => crc,
                Err(_) => {
                    warn!(offset, "torn WAL entry header, discarding tail");
                    break;
                }
            };
            let mut payload = vec![0u8; len];
            if cursor.read_exact(&mut payload).is_err() {
                warn!(offset, "torn WAL entry payload, discarding tail");
                break;
            }
            if crc32fast::hash(&payload) != crc {
                // Bad checksum mid-file would mean acknowledged writes are
                // gone; at the tail it is just an interrupted append.
                if cursor.position() as usize == bytes.len() {
                    warn!(offset, "checksum mismatch on final WAL entry, discarding");
                    break;
                }
                return Err(StoreError::Corrupt(format!(
                    "WAL checksum mismatch at offset {offset}"
                )));
            }
            let entry: WalEntry = bincode::deserialize(&payload)
                .map_err(|e| StoreError::Corrupt(format!("undecodable WAL entry: {e}")))?;
            entries.push(entry);
        }

        debug!(count = entries.len(), path = %self.path.display(), "replayed WAL");
        Ok(entries)
    }

    /// Append one entry, durable before returning.
    pub fn append(&mut self, entry: &WalEntry) -> Result<()> {
        let payload = bincode::serialize(entry)?;
        let mut frame = Vec::with_capacity(payload.len() + 8);
        frame.write_u32::<LittleEndian>(payload.len() as u32)?;
        frame.write_u32::<LittleEndian>(crc32fast::hash(&payload))?;
        frame.write_all(&payload)?;

        let file = self.file_handle()?;
        file.write_all(&frame)?;
        file.sync_data()?;
        Ok(())
    }

    /// Drop all entries (after a checkpoint has folded them into the store).
    pub fn reset(&mut self) -> Result<()> {
        self.file = None;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn file_handle(&mut self) -> Result<&mut File> {
        if self.file.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            self.file = Some(file);
        }
        Ok(self.file.as_mut().expect("just initialized"))
    }
}
