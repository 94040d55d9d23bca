//! Core types for the Strongbox store
//!
//! This crate defines the fundamental types shared by the storage engine and
//! the migration engine:
//! - [`SchemaVersion`] / [`VersionChain`]: ordered schema evolution points
//! - [`Record`] / [`FieldValue`]: schema-agnostic record payloads
//! - [`StoreMetadata`]: the compatibility bag embedded in every store file

pub mod metadata;
pub mod record;
pub mod version;

pub use metadata::StoreMetadata;
pub use record::{FieldKind, FieldValue, Record};
pub use version::{SchemaVersion, VersionChain};
