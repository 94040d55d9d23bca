//! Mapping descriptors and resolution.
//!
//! A mapping describes how the records of one schema version become records
//! of its successor. Hand-written mappings are bundled TOML documents and
//! are the only way a step acquires a custom policy; when no document exists
//! for a pair of versions, a structural mapping is inferred instead.
//! Inference is always a valid fallback — a *malformed* hand-written
//! document, on the other hand, is fatal.

use crate::catalog::SchemaCatalog;
use crate::error::{MigrateError, Result};
use crate::policy;
use crate::schema::{EntityDescriptor, SchemaDescriptor};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use strongbox_core::Record;
use tracing::debug;

/// How one entity's records map onto a target entity.
#[derive(Debug, Clone)]
pub struct EntityMapping {
    /// Source entity name
    pub source: String,
    /// Target entity name
    pub target: String,
    /// Field correspondence, source name to target name
    pub fields: BTreeMap<String, String>,
    /// Name of the attached policy, if any
    pub policy: Option<String>,
}

impl EntityMapping {
    /// Produce the draft destination record for one source record.
    ///
    /// Mapped fields are copied when their value matches the target field's
    /// declared kind; every required target field missing afterwards gets
    /// its kind default. Optional target fields stay absent.
    pub fn apply(&self, target_entity: &EntityDescriptor, source: &Record) -> Record {
        let mut out = Record::new();
        for (source_field, target_field) in &self.fields {
            let Some(value) = source.get(source_field) else {
                continue;
            };
            let Some(decl) = target_entity.field(target_field) else {
                continue;
            };
            if value.kind() == decl.kind {
                out.set(target_field.clone(), value.clone());
            }
        }
        for field in &target_entity.fields {
            if field.required && !out.contains(&field.name) {
                out.set(field.name.clone(), field.kind.default_value());
            }
        }
        out
    }
}

/// The full transformation description for one step.
#[derive(Debug, Clone)]
pub struct MappingDescriptor {
    /// Resource name, or `"inferred"` for structural mappings
    pub name: String,
    /// Per-entity mappings
    pub entities: Vec<EntityMapping>,
    /// Whether this mapping was inferred rather than hand-written
    pub inferred: bool,
}

#[derive(Debug, Deserialize)]
struct RawMapping {
    source: String,
    target: String,
    #[serde(default)]
    entities: Vec<RawEntityMapping>,
}

#[derive(Debug, Deserialize)]
struct RawEntityMapping {
    source: String,
    target: String,
    policy: Option<String>,
    #[serde(default)]
    fields: BTreeMap<String, String>,
}

/// Resolves the mapping for one step of the chain.
pub struct MappingResolver<'a> {
    catalog: &'a SchemaCatalog,
}

impl<'a> MappingResolver<'a> {
    /// Create a resolver over the catalog's bundled mapping documents.
    pub fn new(catalog: &'a SchemaCatalog) -> Self {
        MappingResolver { catalog }
    }

    /// Resolve the mapping from `from` to `to`.
    pub fn resolve(
        &self,
        from: &SchemaDescriptor,
        to: &SchemaDescriptor,
    ) -> Result<MappingDescriptor> {
        let explicit = self
            .catalog
            .chain()
            .versions()
            .iter()
            .find(|v| v.name() == from.name)
            .zip(
                self.catalog
                    .chain()
                    .versions()
                    .iter()
                    .find(|v| v.name() == to.name),
            )
            .and_then(|(f, t)| self.catalog.mapping_resource(*f, *t));

        match explicit {
            Some((name, text)) => {
                debug!(mapping = %name, "using hand-written mapping");
                parse_explicit(&name, text, from, to)
            }
            None => {
                debug!(from = %from.name, to = %to.name, "no hand-written mapping, inferring");
                Ok(infer(from, to))
            }
        }
    }
}

/// Parse and validate a hand-written mapping document.
fn parse_explicit(
    name: &str,
    text: &str,
    from: &SchemaDescriptor,
    to: &SchemaDescriptor,
) -> Result<MappingDescriptor> {
    let malformed = |reason: String| MigrateError::MalformedMapping {
        name: name.to_string(),
        reason,
    };

    let raw: RawMapping =
        toml::from_str(text).map_err(|e| malformed(e.to_string()))?;
    if raw.source != from.name || raw.target != to.name {
        return Err(malformed(format!(
            "document maps `{}` -> `{}`, expected `{}` -> `{}`",
            raw.source, raw.target, from.name, to.name
        )));
    }

    let mut targets_used = BTreeSet::new();
    let mut entities = Vec::with_capacity(raw.entities.len());
    for raw_entity in raw.entities {
        let source_entity = from
            .entity(&raw_entity.source)
            .ok_or_else(|| malformed(format!("unknown source entity `{}`", raw_entity.source)))?;
        let target_entity = to
            .entity(&raw_entity.target)
            .ok_or_else(|| malformed(format!("unknown target entity `{}`", raw_entity.target)))?;
        if !targets_used.insert(raw_entity.target.clone()) {
            return Err(malformed(format!(
                "target entity `{}` mapped twice",
                raw_entity.target
            )));
        }

        for (source_field, target_field) in &raw_entity.fields {
            let sf = source_entity.field(source_field).ok_or_else(|| {
                malformed(format!(
                    "entity `{}` has no field `{source_field}`",
                    raw_entity.source
                ))
            })?;
            let tf = target_entity.field(target_field).ok_or_else(|| {
                malformed(format!(
                    "entity `{}` has no field `{target_field}`",
                    raw_entity.target
                ))
            })?;
            if sf.kind != tf.kind {
                return Err(malformed(format!(
                    "field `{source_field}` ({}) cannot map to `{target_field}` ({})",
                    sf.kind, tf.kind
                )));
            }
        }

        if let Some(policy_name) = &raw_entity.policy {
            if policy::lookup(policy_name).is_none() {
                return Err(malformed(format!("unknown policy `{policy_name}`")));
            }
        }

        entities.push(EntityMapping {
            source: raw_entity.source,
            target: raw_entity.target,
            fields: raw_entity.fields,
            policy: raw_entity.policy,
        });
    }

    Ok(MappingDescriptor {
        name: name.to_string(),
        entities,
        inferred: false,
    })
}

/// Infer a structural mapping by name/kind correspondence.
///
/// Entities match by exact name; fields match by exact name with equal
/// kind. Source-only entities and fields are dropped; target-only required
/// fields pick up kind defaults when the mapping is applied. Inferred
/// mappings never carry a policy.
fn infer(from: &SchemaDescriptor, to: &SchemaDescriptor) -> MappingDescriptor {
    let mut entities = Vec::new();
    for target_entity in &to.entities {
        let Some(source_entity) = from.entity(&target_entity.name) else {
            // Brand-new entity: map nothing into it, defaults fill it in.
            entities.push(EntityMapping {
                source: target_entity.name.clone(),
                target: target_entity.name.clone(),
                fields: BTreeMap::new(),
                policy: None,
            });
            continue;
        };
        let fields = source_entity
            .fields
            .iter()
            .filter(|sf| {
                target_entity
                    .field(&sf.name)
                    .is_some_and(|tf| tf.kind == sf.kind)
            })
            .map(|sf| (sf.name.clone(), sf.name.clone()))
            .collect();
        entities.push(EntityMapping {
            source: source_entity.name.clone(),
            target: target_entity.name.clone(),
            fields,
            policy: None,
        });
    }
    MappingDescriptor {
        name: "inferred".to_string(),
        entities,
        inferred: true,
    }
}
