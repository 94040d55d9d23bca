//! Legacy-settings cleanup timing: consumed keys survive every failure and
//! disappear only after the whole chain, replace included, has succeeded.

use crate::common::*;
use serde_json::json;
use strongbox::prelude::*;
use strongbox_migrate::{ASSET_ORDER_KEY, SELECTED_ACCOUNT_KEY};

#[test]
fn consumed_keys_removed_after_full_success() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.sbx");
    write_v1_store(&path, &[account("0xa1", "one")]);

    let settings = settings();
    settings.set(ASSET_ORDER_KEY, json!({ "0xa1": ["eth"] }));
    settings.set(SELECTED_ACCOUNT_KEY, json!("0xa1"));
    settings.set("ui.theme", json!("dark"));

    Strongbox::builder()
        .path(&path)
        .settings(settings.clone())
        .open()
        .unwrap();

    assert!(!settings.contains(ASSET_ORDER_KEY));
    assert!(!settings.contains(SELECTED_ACCOUNT_KEY));
    assert!(settings.contains("ui.theme"), "unrelated key removed");
}

#[test]
fn consumed_keys_survive_a_failed_chain() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.sbx");
    write_v1_store(&path, &[account("0xa1", "one")]);

    let settings = settings();
    settings.set(ASSET_ORDER_KEY, json!({ "0xa1": ["eth"] }));
    settings.set(SELECTED_ACCOUNT_KEY, json!("0xa1"));

    Strongbox::builder()
        .path(&path)
        .settings(settings.clone())
        .catalog(catalog_missing_v3())
        .open()
        .unwrap_err();

    // The step that consumed them ran, but the chain failed: a retry still
    // needs these values.
    assert!(settings.contains(ASSET_ORDER_KEY));
    assert!(settings.contains(SELECTED_ACCOUNT_KEY));
}

#[test]
fn keys_survive_an_already_current_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.sbx");
    write_store_at(&path, strongbox_migrate::ACCOUNTS_V3, &[]);

    let settings = settings();
    settings.set(ASSET_ORDER_KEY, json!({}));

    Strongbox::builder()
        .path(&path)
        .settings(settings.clone())
        .open()
        .unwrap();

    // No consolidation step ran, so nothing was consumed and nothing may
    // be deleted.
    assert!(settings.contains(ASSET_ORDER_KEY));
}

#[test]
fn keys_survive_a_v2_to_v3_only_chain() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.sbx");

    let mut record = Record::new();
    record.set("address", FieldValue::Str("0xa1".into()));
    record.set("label", FieldValue::Str("kept".into()));
    record.set("public_key", FieldValue::Bytes(vec![0xa1]));
    record.set("order", FieldValue::Int(0));
    record.set("is_selected", FieldValue::Bool(false));
    record.set("asset_order", FieldValue::StrList(Vec::new()));
    write_store_at(&path, strongbox_migrate::ACCOUNTS_V2, &[record]);

    let settings = settings();
    settings.set(ASSET_ORDER_KEY, json!({}));

    Strongbox::builder()
        .path(&path)
        .settings(settings.clone())
        .open()
        .unwrap();

    // The inferred v2 -> v3 step carries no policy, so the legacy keys are
    // not its to delete.
    assert!(settings.contains(ASSET_ORDER_KEY));
}
