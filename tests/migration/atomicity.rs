//! A failed run must leave no trace: original bytes, WAL, settings and
//! directory contents exactly as they were.

use crate::common::*;
use serde_json::json;
use strongbox::prelude::*;
use strongbox_migrate::{MigrateError, ASSET_ORDER_KEY};

fn scratch_leftovers(dir: &std::path::Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(".sbx-migrate-"))
        .collect()
}

#[test]
fn mid_chain_failure_leaves_store_untouched() {
    trace_init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.sbx");
    write_v1_store(&path, &[account("0xa1", "one"), account("0xa1", "dup")]);
    let before = std::fs::read(&path).unwrap();

    let settings = settings();
    settings.set(ASSET_ORDER_KEY, json!({ "0xa1": ["eth"] }));

    // First step (v1 -> v2) succeeds; loading the v3 descriptor fails.
    let result = Strongbox::builder()
        .path(&path)
        .settings(settings.clone())
        .catalog(catalog_missing_v3())
        .open();

    match result {
        Err(Error::Migration(MigrateError::MissingResource { name })) => {
            assert_eq!(name, "accounts_v3");
        }
        other => panic!("expected MissingResource, got {other:?}"),
    }

    assert_eq!(std::fs::read(&path).unwrap(), before, "original modified");
    assert!(settings.contains(ASSET_ORDER_KEY), "settings modified");
    assert!(
        scratch_leftovers(dir.path()).is_empty(),
        "scratch directory left behind"
    );
}

#[test]
fn unknown_source_version_aborts_before_any_step() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.sbx");

    // A valid store file whose layout no cataloged schema matches.
    let mut metadata = StoreMetadata::new();
    metadata.set_entity_layout("Account", "something:bytes,else:int");
    let image = strongbox_storage::format::StoreImage::new(metadata);
    strongbox_storage::format::write_store(&path, &image).unwrap();
    let before = std::fs::read(&path).unwrap();

    let result = Strongbox::builder()
        .path(&path)
        .settings(settings())
        .open();

    match result {
        Err(Error::Migration(MigrateError::UnknownSourceVersion { path: p })) => {
            assert_eq!(p, path);
        }
        other => panic!("expected UnknownSourceVersion, got {other:?}"),
    }
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn corrupt_store_file_aborts_with_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.sbx");
    write_v1_store(&path, &[account("0xa1", "one")]);

    // Flip a byte so the checksum fails.
    let mut bytes = std::fs::read(&path).unwrap();
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0xff;
    std::fs::write(&path, &bytes).unwrap();

    let result = Strongbox::builder()
        .path(&path)
        .settings(settings())
        .open();
    assert!(matches!(result, Err(Error::Migration(_))));
    assert_eq!(std::fs::read(&path).unwrap(), bytes, "file rewritten");
}

#[test]
fn migration_error_is_flagged_for_hosts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.sbx");
    write_v1_store(&path, &[account("0xa1", "one")]);

    let err = Strongbox::builder()
        .path(&path)
        .settings(settings())
        .catalog(catalog_missing_v3())
        .open()
        .unwrap_err();
    assert!(err.is_migration_failure());
}
