//! Store metadata.
//!
//! Every store file embeds an opaque key-value bag describing the layout it
//! was written with. The bag is produced by the store engine when a file is
//! written and is only ever *read* afterwards, to test which schema version
//! a file is compatible with. One `entity.<Name>` key per entity holds that
//! entity's canonical layout string.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Prefix of the per-entity layout keys.
pub const ENTITY_KEY_PREFIX: &str = "entity.";

/// The opaque compatibility bag embedded in a store file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMetadata {
    entries: BTreeMap<String, String>,
}

impl StoreMetadata {
    /// Create an empty bag.
    pub fn new() -> Self {
        StoreMetadata::default()
    }

    /// Look up a raw entry.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Insert a raw entry.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Record the layout string for one entity.
    pub fn set_entity_layout(&mut self, entity: &str, layout: impl Into<String>) {
        self.entries
            .insert(format!("{ENTITY_KEY_PREFIX}{entity}"), layout.into());
    }

    /// All entity layout entries, keyed by entity name.
    pub fn entity_layouts(&self) -> BTreeMap<&str, &str> {
        self.entries
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(ENTITY_KEY_PREFIX)
                    .map(|entity| (entity, value.as_str()))
            })
            .collect()
    }

    /// Iterate over all raw entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
