//! eqt-store
//!
//! CSV boundary for the two spreadsheet exports the tracker works from:
//! the form-response history (read only) and the equipment master table
//! (read, then status columns rewritten in place).
//!
//! Rows are numbered the way the sheet shows them: the header is row 1, so
//! the first data row is row 2.

mod equipment;
mod error;
mod history;

pub use equipment::{EquipmentSheet, EQUIPMENT_COLUMNS};
pub use error::StoreError;
pub use history::{read_history_file, read_history_str, HISTORY_COLUMNS};

/// Sheet row number of the data row at `index` (0-based, header excluded).
pub fn sheet_row_number(index: usize) -> usize {
    index + 2
}
