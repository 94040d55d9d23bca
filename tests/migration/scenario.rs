//! The consolidation scenario: duplicated legacy accounts collapse, the
//! selected account and asset order come along, ordering is gap-free.

use crate::common::*;
use serde_json::json;
use strongbox::prelude::*;
use strongbox_migrate::{ASSET_ORDER_KEY, SELECTED_ACCOUNT_KEY};

#[test]
fn duplicated_selected_account_consolidates() {
    trace_init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.sbx");
    write_v1_store(
        &path,
        &[
            account("0xa1", "primary"),
            account("0xb2", "secondary"),
            account("0xa1", "imported again"),
        ],
    );

    let settings = settings();
    settings.set(SELECTED_ACCOUNT_KEY, json!("0xa1"));

    let sb = Strongbox::builder()
        .path(&path)
        .settings(settings)
        .open()
        .unwrap();

    let records = sb.records("Account");
    assert_eq!(records.len(), 2, "duplicate must collapse");
    assert_eq!(orders(records), vec![0, 1]);
    assert_eq!(addresses(records), vec!["0xa1", "0xb2"]);

    let selected: Vec<bool> = records
        .iter()
        .map(|r| r.get("is_selected").and_then(FieldValue::as_bool).unwrap())
        .collect();
    assert_eq!(selected, vec![true, false]);

    // First-encountered record's data wins.
    let first_label = records[0].get("label").and_then(FieldValue::as_str);
    assert_eq!(first_label, Some("primary"));
}

#[test]
fn case_variant_addresses_are_one_identity() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.sbx");
    write_v1_store(
        &path,
        &[
            account("0xAB12", "spelled loud"),
            account("ab12", "spelled quiet"),
        ],
    );

    let sb = Strongbox::builder()
        .path(&path)
        .settings(settings())
        .open()
        .unwrap();

    let records = sb.records("Account");
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].get("public_key").and_then(FieldValue::as_bytes),
        Some(&[0xab, 0x12][..])
    );
}

#[test]
fn asset_order_travels_into_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.sbx");
    write_v1_store(&path, &[account("0xa1", "one"), account("0xb2", "two")]);

    let settings = settings();
    settings.set(
        ASSET_ORDER_KEY,
        json!({ "0xa1": ["eth", "dai"], "0xb2": ["btc"] }),
    );

    let sb = Strongbox::builder()
        .path(&path)
        .settings(settings)
        .open()
        .unwrap();

    let records = sb.records("Account");
    let assets: Vec<&[String]> = records
        .iter()
        .map(|r| r.get("asset_order").and_then(FieldValue::as_str_list).unwrap())
        .collect();
    assert_eq!(assets[0], ["eth".to_string(), "dai".to_string()]);
    assert_eq!(assets[1], ["btc".to_string()]);
}

#[test]
fn undecodable_address_is_left_behind_without_failing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.sbx");
    write_v1_store(
        &path,
        &[account("0xa1", "good"), account("definitely not hex", "bad")],
    );

    let sb = Strongbox::builder()
        .path(&path)
        .settings(settings())
        .open()
        .unwrap();

    assert_eq!(sb.records("Account").len(), 1);
    let report = sb.migration_report();
    assert_eq!(report.steps[0].skipped_anomalies, 1);
    assert_eq!(report.steps[0].skipped_duplicates, 0);
}

#[test]
fn no_account_selected_when_setting_matches_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.sbx");
    write_v1_store(&path, &[account("0xa1", "one"), account("0xb2", "two")]);

    let settings = settings();
    settings.set(SELECTED_ACCOUNT_KEY, json!("0xdead"));

    let sb = Strongbox::builder()
        .path(&path)
        .settings(settings)
        .open()
        .unwrap();

    assert!(sb
        .records("Account")
        .iter()
        .all(|r| r.get("is_selected").and_then(FieldValue::as_bool) == Some(false)));
}
