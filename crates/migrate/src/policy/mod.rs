//! Per-record migration policies.
//!
//! A policy is the programmatic part of a hand-written mapping: it sees
//! every source record of its entity during one step and decides what (if
//! anything) reaches the destination store. Policies can suppress records,
//! enrich them from external state, and register cleanup that runs only
//! after the whole chain has succeeded.
//!
//! Policy instances live exactly as long as one step. Anything that must
//! survive the step — the settings collaborator, end-of-chain cleanup —
//! travels through [`PolicyContext`] and the registry instead.

mod accounts;

pub use accounts::{AccountConsolidationPolicy, ASSET_ORDER_KEY, SELECTED_ACCOUNT_KEY};

use crate::error::Result;
use std::sync::Arc;
use strongbox_core::Record;
use strongbox_storage::SettingsStore;

/// Orchestrator-level state handed to every policy invocation.
#[derive(Clone)]
pub struct PolicyContext {
    settings: Arc<dyn SettingsStore>,
}

impl PolicyContext {
    /// Create a context around the settings collaborator.
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        PolicyContext { settings }
    }

    /// The legacy settings store.
    pub fn settings(&self) -> &dyn SettingsStore {
        self.settings.as_ref()
    }
}

/// Why a policy dropped a record.
///
/// The two reasons are deliberately distinguishable: duplicates are the
/// policy doing its job, anomalies are damaged input surviving by being
/// left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The record collapses to an identity already emitted this step.
    Duplicate,
    /// The record could not be interpreted (e.g. undecodable address).
    Anomaly,
}

/// What a policy decided about one record.
#[derive(Debug)]
pub enum PolicyOutcome {
    /// Write this record to the destination store.
    Emit(Record),
    /// Drop the record.
    Skip(SkipReason),
}

/// Per-record transformation logic attached to a hand-written mapping.
pub trait MigrationPolicy: Send {
    /// Called once before the first record of the step.
    fn begin_step(&mut self, _ctx: &PolicyContext) -> Result<()> {
        Ok(())
    }

    /// Called once per source record.
    ///
    /// `source` is the untouched source record; `draft` is the destination
    /// record the mapping produced from it. The policy may emit the draft
    /// (enriched or not), replace it, or skip the record entirely.
    fn transform(
        &mut self,
        ctx: &PolicyContext,
        source: &Record,
        draft: Record,
    ) -> Result<PolicyOutcome>;

    /// Called once after the last record of the step.
    fn end_step(&mut self, _ctx: &PolicyContext) -> Result<()> {
        Ok(())
    }
}

/// Registry entry for a named policy.
pub struct PolicySpec {
    /// Name mappings refer to this policy by
    pub name: &'static str,
    /// Build a fresh instance for one step
    pub build: fn() -> Box<dyn MigrationPolicy>,
    /// Cleanup to run once the whole chain (including the final atomic
    /// replace) has succeeded. Must never fail the migration; implementations
    /// log and swallow their own errors.
    pub finish_chain: Option<fn(&PolicyContext)>,
}

static REGISTRY: &[PolicySpec] = &[PolicySpec {
    name: accounts::POLICY_NAME,
    build: accounts::build,
    finish_chain: Some(accounts::finish_chain),
}];

/// Look up a policy by the name a mapping uses.
pub fn lookup(name: &str) -> Option<&'static PolicySpec> {
    REGISTRY.iter().find(|spec| spec.name == name)
}
