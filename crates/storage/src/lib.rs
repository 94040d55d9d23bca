//! Storage engine for the Strongbox store
//!
//! This crate owns everything that touches the filesystem:
//! - the store file codec ([`format`])
//! - the write-ahead log sidecar ([`wal`])
//! - the store engine itself ([`store`])
//! - WAL compaction ([`compactor`])
//! - the legacy settings collaborator ([`settings`])

pub mod compactor;
pub mod error;
pub mod format;
pub mod settings;
pub mod store;
pub mod wal;

pub use compactor::WalCompactor;
pub use error::{Result, StoreError};
pub use format::StoreImage;
pub use settings::{JsonSettings, MemorySettings, SettingsExt, SettingsStore};
pub use store::Store;
pub use wal::{Wal, WalEntry};
