//! Equipment master table export.
//!
//! Columns A..K: name, brand, type, serial, status, location, holder,
//! last_update, condition, notes, priority. Sync only ever writes E..H; every
//! other cell is carried through untouched, including any columns past K.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use eqt_sync::{ChangeRecord, EquipmentRow};
use tracing::{debug, info};

use crate::error::{io_error, StoreError};
use crate::sheet_row_number;

pub const EQUIPMENT_COLUMNS: [&str; 11] = [
    "name",
    "brand",
    "type",
    "serial",
    "status",
    "location",
    "holder",
    "last_update",
    "condition",
    "notes",
    "priority",
];

const COL_NAME: usize = 0;
const COL_SERIAL: usize = 3;
const COL_STATUS: usize = 4;
const COL_LOCATION: usize = 5;
const COL_HOLDER: usize = 6;
const COL_LAST_UPDATE: usize = 7;
const COL_CONDITION: usize = 8;

/// The equipment table as raw cells, so a rewrite preserves what sync does
/// not own.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EquipmentSheet {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl EquipmentSheet {
    pub fn read_file(path: &Path) -> Result<Self, StoreError> {
        let src = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        Self::read_str(&src)
    }

    pub fn read_str(src: &str) -> Result<Self, StoreError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(src.as_bytes());

        let mut records = rdr.records();
        let header = match records.next() {
            Some(r) => r?.iter().map(str::to_string).collect(),
            None => EQUIPMENT_COLUMNS.iter().map(|s| s.to_string()).collect(),
        };

        let mut rows = Vec::new();
        for record in records {
            rows.push(record?.iter().map(str::to_string).collect());
        }

        debug!(rows = rows.len(), "equipment export read");
        Ok(Self { header, rows })
    }

    /// Typed view of every data row, numbered as the sheet numbers them.
    pub fn typed_rows(&self) -> Vec<EquipmentRow> {
        self.rows
            .iter()
            .enumerate()
            .map(|(index, cells)| {
                let cell = |i: usize| cells.get(i).map(String::as_str).unwrap_or("");
                EquipmentRow::from_cells(
                    sheet_row_number(index),
                    cell(COL_NAME),
                    cell(COL_SERIAL),
                    cell(COL_STATUS),
                    cell(COL_LOCATION),
                    cell(COL_HOLDER),
                    cell(COL_CONDITION),
                )
            })
            .collect()
    }

    /// Write each change's target into columns E..H and stamp `now` as the
    /// last update. All rows are validated before any cell is touched.
    pub fn apply_changes(
        &mut self,
        changes: &[ChangeRecord],
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        for change in changes {
            self.row_index(change.row_number)?;
        }

        let stamp = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        for change in changes {
            let index = self.row_index(change.row_number)?;
            let row = &mut self.rows[index];
            if row.len() <= COL_LAST_UPDATE {
                row.resize(COL_LAST_UPDATE + 1, String::new());
            }
            row[COL_STATUS] = change.after.status.as_str().to_string();
            row[COL_LOCATION] = change.after.location.clone();
            row[COL_HOLDER] = change.after.holder.clone();
            row[COL_LAST_UPDATE] = stamp.clone();
        }

        Ok(changes.len())
    }

    pub fn to_csv_string(&self) -> Result<String, StoreError> {
        let mut wtr = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(Vec::new());
        wtr.write_record(&self.header)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| StoreError::Csv(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| StoreError::Csv(e.to_string()))
    }

    /// Rewrite the whole file. The new content goes to a sibling temp file
    /// first and is renamed over `path`.
    pub fn write_file(&self, path: &Path) -> Result<(), StoreError> {
        let body = self.to_csv_string()?;
        let tmp = path.with_extension("csv.tmp");
        std::fs::write(&tmp, body).map_err(|e| io_error(&tmp, e))?;
        std::fs::rename(&tmp, path).map_err(|e| io_error(path, e))?;
        info!(path = %path.display(), rows = self.rows.len(), "equipment export written");
        Ok(())
    }

    fn row_index(&self, row_number: usize) -> Result<usize, StoreError> {
        row_number
            .checked_sub(2)
            .filter(|i| *i < self.rows.len())
            .ok_or(StoreError::RowOutOfRange {
                row_number,
                rows: self.rows.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eqt_sync::{RowStatus, SyncTarget};

    const TABLE: &str = "\
Nama,Merk,Tipe,Serial,Status,Lokasi,Pemegang,Update,Kondisi,Catatan,Prioritas
Multimeter,Fluke,87V,SN-1,available,Gudang,-,,Aktif,kalibrasi 2023,high
Drill,Bosch,GSR,SN-3
";

    fn change(row_number: usize) -> ChangeRecord {
        ChangeRecord {
            row_number,
            name: "Multimeter".into(),
            serial: "SN-1".into(),
            before: SyncTarget::never_referenced(),
            after: SyncTarget {
                status: RowStatus::Borrowed,
                location: "Site A".into(),
                holder: "Budi".into(),
            },
            reason: "changed:status,location,holder".into(),
        }
    }

    #[test]
    fn short_rows_take_defaults() {
        let sheet = EquipmentSheet::read_str(TABLE).expect("parse");
        let rows = sheet.typed_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].row_number, 3);
        assert_eq!(rows[1].serial, "SN-3");
        assert_eq!(rows[1].location, "Gudang");
        assert!(rows[1].is_active());
    }

    #[test]
    fn apply_writes_status_columns_only() {
        let mut sheet = EquipmentSheet::read_str(TABLE).expect("parse");
        let now = DateTime::parse_from_rfc3339("2024-03-05T10:00:00Z")
            .expect("ts")
            .with_timezone(&Utc);

        let mut on_short = change(3);
        on_short.serial = "SN-3".into();
        assert_eq!(sheet.apply_changes(&[change(2), on_short], now).expect("apply"), 2);

        assert_eq!(
            sheet.rows[0],
            vec![
                "Multimeter", "Fluke", "87V", "SN-1", "borrowed", "Site A", "Budi",
                "2024-03-05T10:00:00.000Z", "Aktif", "kalibrasi 2023", "high"
            ]
        );
        assert_eq!(sheet.rows[1].len(), 8);
        assert_eq!(sheet.rows[1][4], "borrowed");
    }

    #[test]
    fn out_of_range_row_leaves_sheet_untouched() {
        let mut sheet = EquipmentSheet::read_str(TABLE).expect("parse");
        let before = sheet.clone();
        let err = sheet
            .apply_changes(&[change(2), change(9)], Utc::now())
            .expect_err("row 9 does not exist");
        assert!(matches!(err, StoreError::RowOutOfRange { row_number: 9, rows: 2 }));
        assert_eq!(sheet, before);

        assert!(sheet.apply_changes(&[change(1)], Utc::now()).is_err());
    }

    #[test]
    fn csv_output_keeps_header_and_quoting() {
        let mut sheet = EquipmentSheet::read_str(TABLE).expect("parse");
        sheet.rows[0][9] = "a, b".into();
        let out = sheet.to_csv_string().expect("write");
        assert!(out.starts_with("Nama,Merk,Tipe,Serial,"));
        assert!(out.contains("\"a, b\""));
        let again = EquipmentSheet::read_str(&out).expect("reparse");
        assert_eq!(again, sheet);
    }
}
