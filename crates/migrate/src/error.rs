//! Migration-engine errors.
//!
//! Everything in this enum is fatal to a migration run: the engine never
//! promotes a partially-migrated store, so there is no recoverable subset.
//! Per-record anomalies inside a policy are *not* errors — they are handled
//! locally as skips and only surface in logs and step counters.

use std::path::PathBuf;
use strongbox_storage::StoreError;
use thiserror::Error;

/// Errors produced by the migration engine.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// The store's embedded metadata matches no cataloged schema version.
    ///
    /// Guessing a starting point risks misinterpreting every record, so the
    /// engine refuses to proceed.
    #[error("store at {path} matches no known schema version")]
    UnknownSourceVersion {
        /// Location of the unrecognized store file
        path: PathBuf,
    },

    /// A bundled schema or mapping resource is missing.
    ///
    /// This is a packaging defect of the build, not a property of the user's
    /// data, and is never retried.
    #[error("missing bundled resource `{name}`")]
    MissingResource {
        /// Resource name that failed to resolve
        name: String,
    },

    /// A bundled schema resource exists but cannot be parsed.
    #[error("malformed resource `{name}`: {reason}")]
    MalformedResource {
        /// Resource name
        name: String,
        /// What was wrong with it
        reason: String,
    },

    /// A hand-written mapping resource is inconsistent with its schemas.
    #[error("malformed mapping `{name}`: {reason}")]
    MalformedMapping {
        /// Mapping resource name
        name: String,
        /// What was wrong with it
        reason: String,
    },

    /// A custom policy rejected the step.
    #[error("policy `{policy}` failed: {reason}")]
    Policy {
        /// Policy name from the mapping
        policy: String,
        /// Failure description
        reason: String,
    },

    /// One version-to-version step failed; nothing was promoted.
    #[error("migration step {from} -> {to} failed: {source}")]
    Step {
        /// Source version name of the failed step
        from: &'static str,
        /// Target version name of the failed step
        to: &'static str,
        /// The underlying failure
        #[source]
        source: Box<MigrateError>,
    },

    /// Storage-layer failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Filesystem failure outside the store codec
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invariant violation inside the engine itself
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
