//! Chain determinism, no-op idempotence, inference, fresh stores.

use crate::common::*;
use strongbox::prelude::*;
use strongbox_migrate::{ACCOUNTS_V1, ACCOUNTS_V2, ACCOUNTS_V3};

#[test]
fn v1_store_walks_the_whole_chain() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.sbx");
    write_v1_store(&path, &[account("0xa1", "one")]);

    let sb = Strongbox::builder()
        .path(&path)
        .settings(settings())
        .open()
        .unwrap();

    let report = sb.migration_report();
    assert_eq!(report.detected, Some(ACCOUNTS_V1));
    assert_eq!(report.target, ACCOUNTS_V3);
    let path_taken: Vec<_> = report.steps.iter().map(|s| (s.from, s.to)).collect();
    assert_eq!(
        path_taken,
        vec![(ACCOUNTS_V1, ACCOUNTS_V2), (ACCOUNTS_V2, ACCOUNTS_V3)]
    );
}

#[test]
fn store_at_target_version_is_byte_identical_after_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.sbx");
    write_store_at(&path, ACCOUNTS_V3, &[]);
    let before = std::fs::read(&path).unwrap();

    let sb = Strongbox::builder()
        .path(&path)
        .settings(settings())
        .open()
        .unwrap();

    assert!(sb.migration_report().was_noop());
    assert_eq!(sb.migration_report().detected, Some(ACCOUNTS_V3));
    drop(sb);
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn v2_store_takes_exactly_the_inferred_step() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.sbx");

    // A store already consolidated by an older build.
    let mut record = Record::new();
    record.set("address", FieldValue::Str("0xa1".into()));
    record.set("label", FieldValue::Str("kept".into()));
    record.set("public_key", FieldValue::Bytes(vec![0xa1]));
    record.set("order", FieldValue::Int(0));
    record.set("is_selected", FieldValue::Bool(true));
    record.set("asset_order", FieldValue::StrList(vec!["eth".into()]));
    write_store_at(&path, ACCOUNTS_V2, &[record]);

    let sb = Strongbox::builder()
        .path(&path)
        .settings(settings())
        .open()
        .unwrap();

    let report = sb.migration_report();
    assert_eq!(report.detected, Some(ACCOUNTS_V2));
    assert_eq!(report.steps.len(), 1);

    // Inference carried every matching field and defaulted the new one.
    let records = sb.records("Account");
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].get("hidden").and_then(FieldValue::as_bool),
        Some(false)
    );
    assert_eq!(
        records[0].get("is_selected").and_then(FieldValue::as_bool),
        Some(true)
    );
    assert_eq!(
        records[0].get("public_key").and_then(FieldValue::as_bytes),
        Some(&[0xa1][..])
    );
}

#[test]
fn missing_store_becomes_fresh_target_version_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.sbx");

    let sb = Strongbox::builder()
        .path(&path)
        .settings(settings())
        .open()
        .unwrap();

    assert!(sb.migration_report().was_noop());
    assert_eq!(sb.migration_report().detected, None);
    assert!(sb.records("Account").is_empty());
    drop(sb);

    // The fresh file detects as already-current on the next open.
    let sb = Strongbox::open(&path).unwrap();
    assert_eq!(sb.migration_report().detected, Some(ACCOUNTS_V3));
    assert!(sb.migration_report().was_noop());
}

#[test]
fn migrated_store_reopens_as_current() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.sbx");
    write_v1_store(&path, &[account("0xa1", "one"), account("0xb2", "two")]);

    {
        let sb = Strongbox::builder()
            .path(&path)
            .settings(settings())
            .open()
            .unwrap();
        assert_eq!(sb.migration_report().steps.len(), 2);
    }

    let sb = Strongbox::builder()
        .path(&path)
        .settings(settings())
        .open()
        .unwrap();
    assert!(sb.migration_report().was_noop());
    assert_eq!(sb.records("Account").len(), 2);
}

#[test]
fn appends_after_migration_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.sbx");

    {
        let mut sb = Strongbox::builder()
            .path(&path)
            .settings(settings())
            .open()
            .unwrap();
        let mut record = Record::new();
        record.set("address", FieldValue::Str("0xa1".into()));
        record.set("label", FieldValue::Str("added later".into()));
        record.set("public_key", FieldValue::Bytes(vec![0xa1]));
        record.set("order", FieldValue::Int(0));
        record.set("is_selected", FieldValue::Bool(false));
        record.set("asset_order", FieldValue::StrList(Vec::new()));
        record.set("hidden", FieldValue::Bool(false));
        sb.append("Account", record).unwrap();
    }

    let sb = Strongbox::builder()
        .path(&path)
        .settings(settings())
        .open()
        .unwrap();
    assert_eq!(sb.records("Account").len(), 1);
}
