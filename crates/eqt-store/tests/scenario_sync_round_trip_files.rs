//! Scenario: a sync pass over on-disk exports rewrites only status columns.
//!
//! # Invariants under test
//!
//! 1. History rows carry `row-<n>` ids, so issues point at sheet rows.
//! 2. Only rows the plan schedules are changed, and only in columns E..H.
//! 3. Columns the sync does not own (notes, priority, extra columns) survive
//!    the rewrite byte for byte.
//! 4. A second pass over the rewritten table schedules nothing.

use std::fs;

use chrono::{TimeZone, Utc};
use eqt_normalize::IdentifierPolicy;
use eqt_reconcile::{reconcile, IssueKind};
use eqt_store::{read_history_file, EquipmentSheet};
use eqt_sync::{plan_sync, SyncOptions};

const HISTORY: &str = "\
Timestamp,Nama Alat,Merk,Tipe,Serial Number,Aksi,Teknisi,Lokasi,Catatan
01/03/2024 08:00,Multimeter,Fluke,87V,SN-1,Peminjaman,Budi,Site A,
02/03/2024 08:00,Drill,Bosch,GSR,SN-2,Pengembalian,Sari,,salah input
03/03/2024 08:00,Ladder,Krisbow,,sn_3,Peminjaman,Andi,Site C,
";

const TABLE: &str = "\
Nama,Merk,Tipe,Serial,Status,Lokasi,Pemegang,Update,Kondisi,Catatan,Prioritas,Extra
Multimeter,Fluke,87V,SN-1,available,Gudang,-,,Aktif,kalibrasi,high,x1
Drill,Bosch,GSR,SN-2,available,Gudang,-,2024-01-01T00:00:00.000Z,Aktif,,low,x2
Ladder,Krisbow,,SN-3,borrowed,Site C,Andi,,Aktif,,,x3
";

#[test]
fn sync_pass_rewrites_only_owned_columns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let history_path = dir.path().join("history.csv");
    let table_path = dir.path().join("equipment.csv");
    fs::write(&history_path, HISTORY).expect("write history");
    fs::write(&table_path, TABLE).expect("write table");

    let history = read_history_file(&history_path).expect("read history");
    let result = reconcile(&history);

    let orphan = result
        .issues
        .iter()
        .find(|e| e.issue_kind == Some(IssueKind::OrphanCheckin))
        .expect("orphan checkin");
    assert_eq!(orphan.event_id(), "row-3");

    let mut sheet = EquipmentSheet::read_file(&table_path).expect("read table");
    let plan = plan_sync(
        &sheet.typed_rows(),
        &result,
        &IdentifierPolicy::default(),
        SyncOptions::default(),
    );
    let rows: Vec<usize> = plan.changes.iter().map(|c| c.row_number).collect();
    assert_eq!(rows, vec![2]);

    let now = Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).single().expect("ts");
    sheet.apply_changes(&plan.changes, now).expect("apply");
    sheet.write_file(&table_path).expect("write");

    let written = fs::read_to_string(&table_path).expect("reread");
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], TABLE.lines().next().expect("header"));
    assert_eq!(
        lines[1],
        "Multimeter,Fluke,87V,SN-1,borrowed,Site A,Budi,2024-03-05T10:00:00.000Z,Aktif,kalibrasi,high,x1"
    );
    assert_eq!(lines[2], TABLE.lines().nth(2).expect("row 3"));
    assert_eq!(lines[3], TABLE.lines().nth(3).expect("row 4"));
    assert!(!dir.path().join("equipment.csv.tmp").exists());

    let sheet = EquipmentSheet::read_file(&table_path).expect("read again");
    let again = plan_sync(
        &sheet.typed_rows(),
        &result,
        &IdentifierPolicy::default(),
        SyncOptions::default(),
    );
    assert!(again.changes.is_empty());
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = read_history_file(&dir.path().join("nope.csv")).expect_err("missing");
    assert!(err.to_string().contains("nope.csv"));
}

#[test]
fn interior_blank_history_row_counts_as_ignored_record() {
    let src = "\
Timestamp,Nama Alat,Merk,Tipe,Serial Number,Aksi,Teknisi,Lokasi,Catatan
01/03/2024 08:00,Multimeter,Fluke,87V,SN-1,Peminjaman,Budi,Site A,
,,,,,,,,
02/03/2024 08:00,Multimeter,Fluke,87V,SN-1,Pengembalian,Budi,,
,,,,,,,,
";
    let history = eqt_store::read_history_str(src).expect("parse");
    assert_eq!(history.len(), 3);

    let result = reconcile(&history);
    assert_eq!(result.ignored_identifier_count, 1);
    let blank = result
        .issues
        .iter()
        .find(|e| e.issue_kind == Some(IssueKind::InvalidIdentifier))
        .expect("blank row quarantined");
    assert_eq!(blank.event_id(), "row-3");

    let sheet = EquipmentSheet::read_str(TABLE).expect("table");
    let plan = plan_sync(
        &sheet.typed_rows(),
        &result,
        &IdentifierPolicy::default(),
        SyncOptions::default(),
    );
    assert_eq!(plan.stats.history_records, 3);
    assert_eq!(plan.stats.ignored_history_records, 1);
    assert_eq!(plan.stats.valid_history_records, 2);
}
