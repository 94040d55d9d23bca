//! Schema descriptors.
//!
//! A descriptor is the loadable description of one schema version's entity
//! and field layout, parsed from a bundled TOML resource. Descriptors are
//! immutable once loaded and are what store metadata is tested against:
//! a store file is compatible with a descriptor exactly when their
//! per-entity layout strings are equal.

use crate::error::{MigrateError, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use strongbox_core::{FieldKind, StoreMetadata};

/// One field of an entity.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDescriptor {
    /// Field name
    pub name: String,
    /// Declared value kind
    pub kind: FieldKind,
    /// Whether every record must carry this field
    #[serde(default)]
    pub required: bool,
}

/// One entity of a schema version.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityDescriptor {
    /// Entity name
    pub name: String,
    /// Declared fields
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl EntityDescriptor {
    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Canonical layout string: `name:kind` pairs sorted by field name.
    ///
    /// This is what gets embedded in store metadata and compared during
    /// version detection, so it must stay stable across builds.
    pub fn layout(&self) -> String {
        let mut parts: Vec<String> = self
            .fields
            .iter()
            .map(|f| format!("{}:{}", f.name, f.kind))
            .collect();
        parts.sort();
        parts.join(",")
    }
}

/// The loadable description of one schema version.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaDescriptor {
    /// Version name (matches the chain entry and the resource stem)
    pub name: String,
    /// Version ordinal (matches the chain entry)
    pub ordinal: u16,
    /// Entities of this version
    #[serde(default)]
    pub entities: Vec<EntityDescriptor>,
}

impl SchemaDescriptor {
    /// Parse a descriptor from its TOML resource.
    pub fn parse(resource_name: &str, text: &str) -> Result<Self> {
        let descriptor: SchemaDescriptor =
            toml::from_str(text).map_err(|e| MigrateError::MalformedResource {
                name: resource_name.to_string(),
                reason: e.to_string(),
            })?;
        descriptor.validate(resource_name)?;
        Ok(descriptor)
    }

    fn validate(&self, resource_name: &str) -> Result<()> {
        let mut entity_names = BTreeSet::new();
        for entity in &self.entities {
            if !entity_names.insert(entity.name.as_str()) {
                return Err(MigrateError::MalformedResource {
                    name: resource_name.to_string(),
                    reason: format!("duplicate entity `{}`", entity.name),
                });
            }
            let mut field_names = BTreeSet::new();
            for field in &entity.fields {
                if !field_names.insert(field.name.as_str()) {
                    return Err(MigrateError::MalformedResource {
                        name: resource_name.to_string(),
                        reason: format!(
                            "duplicate field `{}` in entity `{}`",
                            field.name, entity.name
                        ),
                    });
                }
            }
        }
        Ok(())
    }

    /// Look up an entity by name.
    pub fn entity(&self, name: &str) -> Option<&EntityDescriptor> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Layout strings per entity name.
    pub fn layouts(&self) -> BTreeMap<&str, String> {
        self.entities
            .iter()
            .map(|e| (e.name.as_str(), e.layout()))
            .collect()
    }

    /// The metadata bag a store written with this descriptor carries.
    pub fn metadata(&self) -> StoreMetadata {
        let mut metadata = StoreMetadata::new();
        for entity in &self.entities {
            metadata.set_entity_layout(&entity.name, entity.layout());
        }
        metadata
    }

    /// Structural compatibility test against a store file's metadata.
    pub fn is_compatible(&self, metadata: &StoreMetadata) -> bool {
        let stored = metadata.entity_layouts();
        let own = self.layouts();
        stored.len() == own.len()
            && own
                .iter()
                .all(|(name, layout)| stored.get(name) == Some(&layout.as_str()))
    }
}
