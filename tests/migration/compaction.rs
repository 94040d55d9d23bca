//! WAL compaction runs before inspection, so records still sitting in the
//! sidecar take part in the migration.

use crate::common::*;
use strongbox::prelude::*;
use strongbox_storage::wal::wal_path;
use strongbox_storage::Store;

#[test]
fn pending_wal_records_join_the_migration() {
    trace_init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.sbx");
    write_v1_store(&path, &[account("0xa1", "committed")]);

    // An old build appended two more accounts and never checkpointed; one
    // is a duplicate of the committed record.
    {
        let mut store = Store::load(&path).unwrap();
        store.append("Account", account("0xb2", "pending")).unwrap();
        store
            .append("Account", account("0xA1", "pending dup"))
            .unwrap();
    }
    assert!(wal_path(&path).exists());

    let sb = Strongbox::builder()
        .path(&path)
        .settings(settings())
        .open()
        .unwrap();

    // Both the committed and the pending record made it; the duplicate did
    // not, which proves the WAL was folded in before detection.
    let records = sb.records("Account");
    assert_eq!(addresses(records), vec!["0xa1", "0xb2"]);
    assert_eq!(
        sb.migration_report().steps[0].skipped_duplicates,
        1
    );

    // The stale sidecar is gone after promotion.
    assert!(!wal_path(&path).exists());
}

#[test]
fn torn_wal_tail_does_not_block_migration() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.sbx");
    write_v1_store(&path, &[account("0xa1", "committed")]);

    {
        let mut store = Store::load(&path).unwrap();
        store.append("Account", account("0xb2", "pending")).unwrap();
        store.append("Account", account("0xc3", "torn")).unwrap();
    }

    // Truncate mid-frame, as a crash during append would.
    let wal = wal_path(&path);
    let bytes = std::fs::read(&wal).unwrap();
    std::fs::write(&wal, &bytes[..bytes.len() - 4]).unwrap();

    let sb = Strongbox::builder()
        .path(&path)
        .settings(settings())
        .open()
        .unwrap();

    // The committed record and the intact pending record survive; the torn
    // tail is discarded.
    assert_eq!(addresses(sb.records("Account")), vec!["0xa1", "0xb2"]);
}
