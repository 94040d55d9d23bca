//! The schema catalog.
//!
//! The catalog owns the version chain and the resources behind it: one
//! schema descriptor per version, plus any hand-written mapping documents.
//! Descriptors are parsed lazily and cached for the lifetime of the catalog
//! (one catalog lives exactly as long as one migration run).
//!
//! [`SchemaCatalog::bundled`] is the chain compiled into this build; tests
//! assemble custom catalogs with [`SchemaCatalog::new`].

use crate::error::{MigrateError, Result};
use crate::schema::SchemaDescriptor;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use strongbox_core::{SchemaVersion, StoreMetadata, VersionChain};
use tracing::debug;

/// First store layout: flat imported accounts.
pub const ACCOUNTS_V1: SchemaVersion = SchemaVersion::new(1, "accounts_v1");
/// Consolidated accounts with ordering, selection and asset order.
pub const ACCOUNTS_V2: SchemaVersion = SchemaVersion::new(2, "accounts_v2");
/// Adds the per-account hidden flag.
pub const ACCOUNTS_V3: SchemaVersion = SchemaVersion::new(3, "accounts_v3");

/// The chain compiled into this build, oldest to newest.
pub fn builtin_chain() -> VersionChain {
    VersionChain::new(vec![ACCOUNTS_V1, ACCOUNTS_V2, ACCOUNTS_V3])
}

/// Resource name of the mapping for one step of the chain.
pub fn mapping_resource_name(from: SchemaVersion, to: SchemaVersion) -> String {
    format!("{}_to_{}", from.name(), to.name())
}

/// Version chain plus the schema and mapping resources behind it.
pub struct SchemaCatalog {
    chain: VersionChain,
    schemas: BTreeMap<String, String>,
    mappings: BTreeMap<String, String>,
    cache: Mutex<BTreeMap<u16, Arc<SchemaDescriptor>>>,
}

impl SchemaCatalog {
    /// The catalog compiled into this build.
    pub fn bundled() -> Self {
        let mut schemas = BTreeMap::new();
        schemas.insert(
            ACCOUNTS_V1.name().to_string(),
            include_str!("../resources/schemas/accounts_v1.toml").to_string(),
        );
        schemas.insert(
            ACCOUNTS_V2.name().to_string(),
            include_str!("../resources/schemas/accounts_v2.toml").to_string(),
        );
        schemas.insert(
            ACCOUNTS_V3.name().to_string(),
            include_str!("../resources/schemas/accounts_v3.toml").to_string(),
        );

        let mut mappings = BTreeMap::new();
        mappings.insert(
            mapping_resource_name(ACCOUNTS_V1, ACCOUNTS_V2),
            include_str!("../resources/mappings/accounts_v1_to_accounts_v2.toml").to_string(),
        );

        SchemaCatalog::new(builtin_chain(), schemas, mappings)
    }

    /// Assemble a catalog from an explicit chain and resource texts.
    ///
    /// `schemas` is keyed by version name, `mappings` by
    /// [`mapping_resource_name`].
    pub fn new(
        chain: VersionChain,
        schemas: BTreeMap<String, String>,
        mappings: BTreeMap<String, String>,
    ) -> Self {
        SchemaCatalog {
            chain,
            schemas,
            mappings,
            cache: Mutex::new(BTreeMap::new()),
        }
    }

    /// The version chain.
    pub fn chain(&self) -> &VersionChain {
        &self.chain
    }

    /// The version this build reads and writes.
    pub fn target(&self) -> SchemaVersion {
        self.chain.target()
    }

    /// Immediate successor of `version` in the chain.
    pub fn successor(&self, version: SchemaVersion) -> Option<SchemaVersion> {
        self.chain.successor(version)
    }

    /// Load (or fetch from cache) the descriptor for `version`.
    ///
    /// A missing or unparsable resource is a packaging defect and fails
    /// loudly; there is no fallback.
    pub fn descriptor(&self, version: SchemaVersion) -> Result<Arc<SchemaDescriptor>> {
        if let Some(cached) = self.cache.lock().get(&version.ordinal()) {
            return Ok(cached.clone());
        }

        let text = self
            .schemas
            .get(version.name())
            .ok_or_else(|| MigrateError::MissingResource {
                name: version.name().to_string(),
            })?;
        let descriptor = SchemaDescriptor::parse(version.name(), text)?;
        if descriptor.name != version.name() || descriptor.ordinal != version.ordinal() {
            return Err(MigrateError::MalformedResource {
                name: version.name().to_string(),
                reason: format!(
                    "descriptor identifies itself as `{}` (ordinal {}), expected `{}` (ordinal {})",
                    descriptor.name,
                    descriptor.ordinal,
                    version.name(),
                    version.ordinal()
                ),
            });
        }

        let descriptor = Arc::new(descriptor);
        self.cache
            .lock()
            .insert(version.ordinal(), descriptor.clone());
        debug!(version = %version, "loaded schema descriptor");
        Ok(descriptor)
    }

    /// The hand-written mapping text for one step, if one is bundled.
    pub fn mapping_resource(
        &self,
        from: SchemaVersion,
        to: SchemaVersion,
    ) -> Option<(String, &str)> {
        let name = mapping_resource_name(from, to);
        self.mappings
            .get(&name)
            .map(|text| (name, text.as_str()))
    }

    /// Detect which cataloged version a store file's metadata belongs to.
    ///
    /// Descriptors are tested in chain order and the first structural match
    /// wins; versions are laid out so at most one can match. `None` means
    /// the store was written by a layout this build has never heard of.
    pub fn detect_version(&self, metadata: &StoreMetadata) -> Result<Option<SchemaVersion>> {
        for version in self.chain.versions() {
            let descriptor = self.descriptor(*version)?;
            if descriptor.is_compatible(metadata) {
                debug!(version = %version, "detected store version");
                return Ok(Some(*version));
            }
        }
        Ok(None)
    }
}
