//! The migration orchestrator.
//!
//! Walks the version chain from a store's detected version to the target,
//! one step at a time, and promotes the final result with an atomic rename.
//! The run is strictly sequential — each step's output is the next step's
//! input — and strictly all-or-nothing: until the promotion rename, the
//! original store file is never written, and on any failure the scratch
//! directory (with every intermediate file) is removed.

use crate::catalog::SchemaCatalog;
use crate::error::{MigrateError, Result};
use crate::mapping::MappingResolver;
use crate::policy::{self, PolicyContext};
use crate::scratch::ScratchDir;
use crate::step::StepRunner;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use strongbox_core::SchemaVersion;
use strongbox_storage::wal::wal_path;
use strongbox_storage::{format, SettingsStore, WalCompactor};
use tracing::{info, warn};

/// Where a migration run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationPhase {
    /// Nothing has happened yet
    NotStarted,
    /// Folding pending WAL data into the store file
    Compacting,
    /// Matching store metadata against cataloged schemas
    DetectingVersion,
    /// The store already has the target layout (or does not exist)
    AlreadyCurrent,
    /// Running version-to-version steps
    Stepping,
    /// Promoting the final intermediate over the original
    Replacing,
    /// Finished successfully
    Done,
    /// Aborted; the original store is untouched
    Failed,
}

impl fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MigrationPhase::NotStarted => "not-started",
            MigrationPhase::Compacting => "compacting",
            MigrationPhase::DetectingVersion => "detecting-version",
            MigrationPhase::AlreadyCurrent => "already-current",
            MigrationPhase::Stepping => "stepping",
            MigrationPhase::Replacing => "replacing",
            MigrationPhase::Done => "done",
            MigrationPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Counters for one executed step.
#[derive(Debug, Clone)]
pub struct StepReport {
    /// Version the step read
    pub from: SchemaVersion,
    /// Version the step wrote
    pub to: SchemaVersion,
    /// Records written
    pub emitted: usize,
    /// Records dropped as duplicates
    pub skipped_duplicates: usize,
    /// Records dropped as uninterpretable
    pub skipped_anomalies: usize,
}

/// Summary of a finished migration run.
#[derive(Debug, Clone)]
pub struct MigrationReport {
    /// Version the store was detected at (`None`: no store file existed)
    pub detected: Option<SchemaVersion>,
    /// The chain's target version
    pub target: SchemaVersion,
    /// Executed steps, in order
    pub steps: Vec<StepReport>,
}

impl MigrationReport {
    /// Whether the run changed nothing on disk.
    pub fn was_noop(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Orchestrates one complete migration run.
pub struct Migrator {
    catalog: SchemaCatalog,
    settings: Arc<dyn SettingsStore>,
}

impl Migrator {
    /// Create a migrator over a catalog and the legacy settings collaborator.
    pub fn new(catalog: SchemaCatalog, settings: Arc<dyn SettingsStore>) -> Self {
        Migrator { catalog, settings }
    }

    /// The catalog this migrator runs against.
    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    /// Migrate the store at `store_path` to the catalog's target version.
    ///
    /// Runs synchronously on the calling thread. On success the store file
    /// at `store_path` conforms to the target schema and the report says
    /// what happened; on error the original file, its WAL, and the legacy
    /// settings are exactly as they were.
    pub fn run(&self, store_path: &Path) -> Result<MigrationReport> {
        let mut phase = MigrationPhase::NotStarted;
        match self.run_phases(store_path, &mut phase) {
            Ok(report) => Ok(report),
            Err(err) => {
                warn!(error = %err, "migration aborted");
                self.transition(&mut phase, MigrationPhase::Failed);
                Err(err)
            }
        }
    }

    fn run_phases(&self, store_path: &Path, phase: &mut MigrationPhase) -> Result<MigrationReport> {
        let target = self.catalog.target();

        self.transition(phase, MigrationPhase::Compacting);
        WalCompactor::compact(store_path)?;

        self.transition(phase, MigrationPhase::DetectingVersion);
        if !store_path.exists() {
            // No store file: nothing to migrate. Creating a fresh store is
            // the caller's business, not the migration engine's.
            self.transition(phase, MigrationPhase::AlreadyCurrent);
            self.transition(phase, MigrationPhase::Done);
            return Ok(MigrationReport {
                detected: None,
                target,
                steps: Vec::new(),
            });
        }

        let metadata = format::read_metadata(store_path)?;
        let detected = self.catalog.detect_version(&metadata)?.ok_or_else(|| {
            MigrateError::UnknownSourceVersion {
                path: store_path.to_path_buf(),
            }
        })?;

        if detected == target {
            self.transition(phase, MigrationPhase::AlreadyCurrent);
            self.transition(phase, MigrationPhase::Done);
            info!(version = %target, "store already at target version");
            return Ok(MigrationReport {
                detected: Some(detected),
                target,
                steps: Vec::new(),
            });
        }

        self.transition(phase, MigrationPhase::Stepping);
        let scratch = ScratchDir::create_near(store_path)?;
        let ctx = PolicyContext::new(self.settings.clone());
        let resolver = MappingResolver::new(&self.catalog);

        let mut steps = Vec::new();
        let mut policies_used: BTreeSet<String> = BTreeSet::new();
        let mut current = detected;
        let mut current_path = store_path.to_path_buf();
        let mut previous_intermediate = None;

        while current != target {
            let next = self.catalog.successor(current).ok_or_else(|| {
                MigrateError::Internal(format!("version `{current}` has no successor"))
            })?;
            let from_descriptor = self.catalog.descriptor(current)?;
            let to_descriptor = self.catalog.descriptor(next)?;
            let mapping = resolver.resolve(&from_descriptor, &to_descriptor)?;
            for entity_mapping in &mapping.entities {
                if let Some(policy) = &entity_mapping.policy {
                    policies_used.insert(policy.clone());
                }
            }

            info!(from = %current, to = %next, inferred = mapping.inferred, "running migration step");
            let outcome = StepRunner::run(
                &current_path,
                &from_descriptor,
                &to_descriptor,
                &mapping,
                &ctx,
                &scratch,
            )
            .map_err(|e| MigrateError::Step {
                from: current.name(),
                to: next.name(),
                source: Box::new(e),
            })?;

            // The previous intermediate has served its purpose; the original
            // store file is never touched here.
            if let Some(stale) = previous_intermediate.take() {
                std::fs::remove_file(&stale)?;
            }

            steps.push(StepReport {
                from: current,
                to: next,
                emitted: outcome.emitted,
                skipped_duplicates: outcome.skipped_duplicates,
                skipped_anomalies: outcome.skipped_anomalies,
            });
            previous_intermediate = Some(outcome.destination.clone());
            current_path = outcome.destination;
            current = next;
        }

        self.transition(phase, MigrationPhase::Replacing);
        // The WAL was drained during compaction; drop the stale sidecar
        // before the new-format file takes the store's place.
        match std::fs::remove_file(wal_path(store_path)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        // Same filesystem by construction: the scratch directory lives next
        // to the store file.
        std::fs::rename(&current_path, store_path)?;
        drop(scratch);

        self.transition(phase, MigrationPhase::Done);
        for policy_name in &policies_used {
            if let Some(spec) = policy::lookup(policy_name) {
                if let Some(finish) = spec.finish_chain {
                    finish(&ctx);
                }
            }
        }

        info!(
            from = %detected,
            to = %target,
            steps = steps.len(),
            "migration complete"
        );
        Ok(MigrationReport {
            detected: Some(detected),
            target,
            steps,
        })
    }

    fn transition(&self, phase: &mut MigrationPhase, next: MigrationPhase) {
        info!(from = %phase, to = %next, "migration phase");
        *phase = next;
    }
}
