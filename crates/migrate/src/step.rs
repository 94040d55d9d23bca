//! Single-step execution.
//!
//! A step turns a store at one schema version into a brand-new store at its
//! successor. The source file is only ever read; the destination is written
//! inside the scratch directory, so a failed or interrupted step leaves
//! nothing that could be mistaken for a finished store.

use crate::error::{MigrateError, Result};
use crate::mapping::MappingDescriptor;
use crate::policy::{self, PolicyContext, PolicyOutcome, SkipReason};
use crate::scratch::ScratchDir;
use crate::schema::SchemaDescriptor;
use std::path::{Path, PathBuf};
use strongbox_storage::format::{self, StoreImage};
use tracing::info;

/// What one step produced.
#[derive(Debug)]
pub struct StepOutcome {
    /// The freshly written destination store inside the scratch directory
    pub destination: PathBuf,
    /// Records written to the destination
    pub emitted: usize,
    /// Records dropped as duplicates by a policy
    pub skipped_duplicates: usize,
    /// Records dropped as uninterpretable by a policy
    pub skipped_anomalies: usize,
}

/// Executes exactly one version-to-successor migration.
pub struct StepRunner;

impl StepRunner {
    /// Run one step.
    ///
    /// Reads the store at `source_path` (never writing it), checks it really
    /// is a `source`-layout store, streams every record of every mapped
    /// entity through the mapping and its policy, and writes the destination
    /// store into `scratch`. Any failure aborts the step with nothing
    /// promoted.
    pub fn run(
        source_path: &Path,
        source: &SchemaDescriptor,
        target: &SchemaDescriptor,
        mapping: &MappingDescriptor,
        ctx: &PolicyContext,
        scratch: &ScratchDir,
    ) -> Result<StepOutcome> {
        let image = format::read_store(source_path)?;
        if !source.is_compatible(&image.metadata) {
            return Err(MigrateError::Internal(format!(
                "store at {} is not an `{}` store",
                source_path.display(),
                source.name
            )));
        }
        let mut out = StoreImage::new(target.metadata());
        let mut emitted = 0usize;
        let mut skipped_duplicates = 0usize;
        let mut skipped_anomalies = 0usize;

        for entity_mapping in &mapping.entities {
            let target_entity = target.entity(&entity_mapping.target).ok_or_else(|| {
                MigrateError::Internal(format!(
                    "mapping targets entity `{}` absent from `{}`",
                    entity_mapping.target, target.name
                ))
            })?;

            let mut policy = match &entity_mapping.policy {
                Some(name) => {
                    let spec = policy::lookup(name).ok_or_else(|| {
                        MigrateError::Internal(format!(
                            "mapping passed validation with unknown policy `{name}`"
                        ))
                    })?;
                    Some((spec.build)())
                }
                None => None,
            };

            if let Some(policy) = policy.as_mut() {
                policy.begin_step(ctx)?;
            }

            for record in image.records(&entity_mapping.source) {
                let draft = entity_mapping.apply(target_entity, record);
                let outcome = match policy.as_mut() {
                    Some(policy) => policy.transform(ctx, record, draft)?,
                    None => PolicyOutcome::Emit(draft),
                };
                match outcome {
                    PolicyOutcome::Emit(record) => {
                        out.push_record(entity_mapping.target.clone(), record);
                        emitted += 1;
                    }
                    PolicyOutcome::Skip(SkipReason::Duplicate) => skipped_duplicates += 1,
                    PolicyOutcome::Skip(SkipReason::Anomaly) => skipped_anomalies += 1,
                }
            }

            if let Some(policy) = policy.as_mut() {
                policy.end_step(ctx)?;
            }
        }

        // Every target entity gets a section, mapped or not, so the file is
        // a complete store at the target version.
        for entity in &target.entities {
            out.entities.entry(entity.name.clone()).or_default();
        }

        let destination = scratch.store_path(&format!("{}.sbx", target.name));
        format::write_store(&destination, &out)?;

        info!(
            target = %target.name,
            emitted,
            skipped_duplicates,
            skipped_anomalies,
            "wrote intermediate store"
        );

        Ok(StepOutcome {
            destination,
            emitted,
            skipped_duplicates,
            skipped_anomalies,
        })
    }
}
