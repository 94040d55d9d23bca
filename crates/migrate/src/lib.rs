//! Versioned store migration engine
//!
//! Upgrades a Strongbox store file from whatever schema version it was
//! written with to the version the current build expects, before anything
//! else reads it. The moving parts, leaves first:
//!
//! - [`SchemaCatalog`]: version chain plus loadable schema descriptors,
//!   and detection of a store file's version from its metadata
//! - [`MappingResolver`]: hand-written or structurally inferred
//!   transformation descriptions for each step
//! - [`MigrationPolicy`]: per-record hooks a mapping can attach (dedup,
//!   enrichment, end-of-chain cleanup)
//! - [`StepRunner`]: executes one version-to-successor step into a fresh
//!   scratch file
//! - [`Migrator`]: walks the chain, promotes the result atomically
//!
//! Everything here is fatal-on-error by design: a partially migrated store
//! must never be promoted, so errors abort the run with the original file
//! untouched.

pub mod catalog;
pub mod error;
pub mod mapping;
pub mod migrator;
pub mod policy;
pub mod scratch;
pub mod schema;
pub mod step;

pub use catalog::{
    builtin_chain, mapping_resource_name, SchemaCatalog, ACCOUNTS_V1, ACCOUNTS_V2, ACCOUNTS_V3,
};
pub use error::{MigrateError, Result};
pub use mapping::{EntityMapping, MappingDescriptor, MappingResolver};
pub use migrator::{MigrationPhase, MigrationReport, Migrator, StepReport};
pub use policy::{
    AccountConsolidationPolicy, MigrationPolicy, PolicyContext, PolicyOutcome, SkipReason,
    ASSET_ORDER_KEY, SELECTED_ACCOUNT_KEY,
};
pub use schema::{EntityDescriptor, FieldDescriptor, SchemaDescriptor};
pub use scratch::ScratchDir;
pub use step::{StepOutcome, StepRunner};
