//! Form-response history export.
//!
//! | Col | Field      | Used for                 |
//! |-----|------------|--------------------------|
//! | A   | timestamp  | `RawEventRecord.timestamp` |
//! | B   | name       | display only             |
//! | C   | brand      | display only             |
//! | D   | type       | display only             |
//! | E   | serial     | `equipment_id`           |
//! | F   | action     | `action`                 |
//! | G   | technician | `actor`                  |
//! | H   | location   | `location`               |
//! | I   | notes      | ignored                  |
//!
//! Each record gets the event id `row-<n>` with `n` its sheet row number, so
//! issues can be traced back to the form response. Missing trailing cells
//! read as empty. A blank row between responses is kept (it reconciles as an
//! invalid identifier); blank rows after the last response are dropped.

use std::path::Path;

use eqt_normalize::RawEventRecord;
use tracing::debug;

use crate::error::{io_error, StoreError};
use crate::sheet_row_number;

pub const HISTORY_COLUMNS: [&str; 9] = [
    "timestamp",
    "name",
    "brand",
    "type",
    "serial",
    "action",
    "technician",
    "location",
    "notes",
];

const COL_TIMESTAMP: usize = 0;
const COL_SERIAL: usize = 4;
const COL_ACTION: usize = 5;
const COL_TECHNICIAN: usize = 6;
const COL_LOCATION: usize = 7;

pub fn read_history_file(path: &Path) -> Result<Vec<RawEventRecord>, StoreError> {
    let src = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    read_history_str(&src)
}

/// Parse a history export. The first line is the header and is not checked
/// by name; columns are positional.
pub fn read_history_str(src: &str) -> Result<Vec<RawEventRecord>, StoreError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(src.as_bytes());

    let mut out = Vec::new();
    // Sheet exports pad the range with blank rows; those past the last
    // response are not history. Interior blank rows are kept.
    let mut last_filled = 0;
    for (index, record) in rdr.records().enumerate() {
        let record = record?;
        if !record.iter().all(|cell| cell.trim().is_empty()) {
            last_filled = index + 1;
        }
        let cell = |i: usize| record.get(i).unwrap_or("").to_string();

        out.push(
            RawEventRecord::new(
                cell(COL_TIMESTAMP),
                cell(COL_SERIAL),
                cell(COL_ACTION),
                cell(COL_TECHNICIAN),
                cell(COL_LOCATION),
            )
            .with_event_id(format!("row-{}", sheet_row_number(index))),
        );
    }

    out.truncate(last_filled);

    debug!(records = out.len(), "history export read");
    Ok(out)
}
