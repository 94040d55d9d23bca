//! Shared helpers for the migration suite.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use strongbox_core::{FieldValue, Record};
use strongbox_migrate::{
    builtin_chain, mapping_resource_name, SchemaCatalog, ACCOUNTS_V1, ACCOUNTS_V2,
};
use strongbox_storage::format::{self, StoreImage};
use strongbox_storage::MemorySettings;

/// Route engine tracing into the test harness output (first caller wins).
pub fn trace_init() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Build a v1 account record.
pub fn account(address: &str, label: &str) -> Record {
    let mut record = Record::new();
    record.set("address", FieldValue::Str(address.into()));
    record.set("label", FieldValue::Str(label.into()));
    record
}

/// Write a store file at the given schema version with the given accounts.
pub fn write_store_at(path: &Path, version: strongbox_core::SchemaVersion, accounts: &[Record]) {
    let catalog = SchemaCatalog::bundled();
    let descriptor = catalog.descriptor(version).unwrap();
    let mut image = StoreImage::new(descriptor.metadata());
    for record in accounts {
        image.push_record("Account", record.clone());
    }
    // Entities declared by the schema but without records still get
    // sections, mirroring what the engine itself writes.
    for entity in &descriptor.entities {
        image.entities.entry(entity.name.clone()).or_default();
    }
    format::write_store(path, &image).unwrap();
}

/// Write a v1 store file.
pub fn write_v1_store(path: &Path, accounts: &[Record]) {
    write_store_at(path, ACCOUNTS_V1, accounts);
}

/// Fresh in-memory settings wrapped for sharing with the engine.
pub fn settings() -> Arc<MemorySettings> {
    Arc::new(MemorySettings::new())
}

/// A catalog with the full chain but no `accounts_v3` schema resource.
///
/// Migrations from v1 run their first step, then die loading the v3
/// descriptor — the injection point for atomicity tests.
pub fn catalog_missing_v3() -> SchemaCatalog {
    let mut schemas = BTreeMap::new();
    schemas.insert(
        ACCOUNTS_V1.name().to_string(),
        include_str!("../../crates/migrate/resources/schemas/accounts_v1.toml").to_string(),
    );
    schemas.insert(
        ACCOUNTS_V2.name().to_string(),
        include_str!("../../crates/migrate/resources/schemas/accounts_v2.toml").to_string(),
    );
    let mut mappings = BTreeMap::new();
    mappings.insert(
        mapping_resource_name(ACCOUNTS_V1, ACCOUNTS_V2),
        include_str!("../../crates/migrate/resources/mappings/accounts_v1_to_accounts_v2.toml")
            .to_string(),
    );
    SchemaCatalog::new(builtin_chain(), schemas, mappings)
}

/// Orders of the emitted account records, in stored order.
pub fn orders(records: &[Record]) -> Vec<i64> {
    records
        .iter()
        .map(|r| r.get("order").and_then(FieldValue::as_int).unwrap())
        .collect()
}

/// Addresses of the emitted account records, in stored order.
pub fn addresses(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|r| {
            r.get("address")
                .and_then(FieldValue::as_str)
                .unwrap()
                .to_string()
        })
        .collect()
}
