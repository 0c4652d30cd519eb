//! Equipment-status sync planning.
//!
//! For each active, non-maintenance equipment row the target triple
//! (status, location, holder) comes from the reconciled state of its
//! normalized serial, or the Available/"-"/"Gudang" default when the serial
//! never appears in valid history. A row is written only when the target
//! differs from what is stored, or unconditionally under `force_update_all`.

use eqt_normalize::{EquipmentKey, IdentifierPolicy};
use eqt_reconcile::{EquipmentStatus, ReconciliationResult, NO_HOLDER, WAREHOUSE};
use serde::Serialize;
use tracing::debug;

/// Condition value of rows that take part in sync (compared case-insensitively).
pub const ACTIVE_CONDITION: &str = "Aktif";

/// Status as stored in the equipment table. Maintenance is set by hand and
/// never derived from history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    Available,
    Borrowed,
    Maintenance,
}

impl RowStatus {
    /// Unknown or empty text reads as Available.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "borrowed" => RowStatus::Borrowed,
            "maintenance" => RowStatus::Maintenance,
            _ => RowStatus::Available,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RowStatus::Available => "available",
            RowStatus::Borrowed => "borrowed",
            RowStatus::Maintenance => "maintenance",
        }
    }
}

impl From<EquipmentStatus> for RowStatus {
    fn from(s: EquipmentStatus) -> Self {
        match s {
            EquipmentStatus::Available => RowStatus::Available,
            EquipmentStatus::Borrowed => RowStatus::Borrowed,
        }
    }
}

/// One equipment-table row, decoded once at the store boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EquipmentRow {
    /// 1-based sheet row (header is row 1).
    pub row_number: usize,
    pub name: String,
    pub serial: String,
    pub status: RowStatus,
    pub location: String,
    pub holder: String,
    pub condition: String,
}

impl EquipmentRow {
    /// Apply the table's defaults for empty cells: location "Gudang",
    /// holder "-", condition "Aktif".
    pub fn from_cells(
        row_number: usize,
        name: &str,
        serial: &str,
        status: &str,
        location: &str,
        holder: &str,
        condition: &str,
    ) -> Self {
        let or = |v: &str, d: &str| if v.is_empty() { d.to_string() } else { v.to_string() };
        Self {
            row_number,
            name: name.to_string(),
            serial: serial.to_string(),
            status: RowStatus::parse(status),
            location: or(location, WAREHOUSE),
            holder: or(holder, NO_HOLDER),
            condition: or(condition, ACTIVE_CONDITION).trim().to_string(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.condition.eq_ignore_ascii_case(ACTIVE_CONDITION)
    }

    pub fn current(&self) -> SyncTarget {
        SyncTarget {
            status: self.status,
            location: self.location.clone(),
            holder: self.holder.clone(),
        }
    }
}

/// The (status, location, holder) triple that sync writes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SyncTarget {
    pub status: RowStatus,
    pub location: String,
    pub holder: String,
}

impl SyncTarget {
    /// Target for equipment never referenced by valid history.
    pub fn never_referenced() -> Self {
        Self {
            status: RowStatus::Available,
            location: WAREHOUSE.to_string(),
            holder: NO_HOLDER.to_string(),
        }
    }

    /// Names of fields that differ, in write order.
    fn changed_fields(&self, other: &SyncTarget) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.status != other.status {
            fields.push("status");
        }
        if self.location != other.location {
            fields.push("location");
        }
        if self.holder != other.holder {
            fields.push("holder");
        }
        fields
    }
}

/// Before/after record of one planned write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    pub row_number: usize,
    pub name: String,
    pub serial: String,
    pub before: SyncTarget,
    pub after: SyncTarget,
    /// `changed:<fields>` or `force-update`.
    pub reason: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncOptions {
    pub force_update_all: bool,
    pub dry_run: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub available: usize,
    pub borrowed: usize,
    pub maintenance: usize,
    pub history_records: usize,
    pub valid_history_records: usize,
    pub ignored_history_records: usize,
    /// Duplicate checkouts + orphan checkins.
    pub invalid_action_records: usize,
    pub duplicate_checkout_records: usize,
    pub orphan_checkin_records: usize,
    /// Rows whose action text matched no rule and was read by fallback.
    pub unrecognized_action_records: usize,
    pub unique_equipment_with_history: usize,
    pub skipped_invalid_serial: usize,
    pub skipped_maintenance: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SyncPlan {
    pub updated: usize,
    pub unchanged: usize,
    pub dry_run: bool,
    pub changes: Vec<ChangeRecord>,
    pub stats: SyncStats,
}

impl SyncPlan {
    pub fn has_writes(&self) -> bool {
        !self.dry_run && !self.changes.is_empty()
    }
}

/// Diff `rows` against `history` and plan the writes.
pub fn plan_sync(
    rows: &[EquipmentRow],
    history: &ReconciliationResult,
    identifiers: &IdentifierPolicy,
    options: SyncOptions,
) -> SyncPlan {
    let issue_counts = history.issue_counts();
    let mut stats = SyncStats {
        total: rows.len(),
        history_records: history.events.len(),
        valid_history_records: history.valid_event_count,
        ignored_history_records: history.ignored_identifier_count,
        invalid_action_records: issue_counts.invalid_action(),
        duplicate_checkout_records: issue_counts.duplicate_checkout,
        orphan_checkin_records: issue_counts.orphan_checkin,
        unrecognized_action_records: history.unrecognized_action_count(),
        unique_equipment_with_history: history.states.len(),
        ..SyncStats::default()
    };
    let mut changes = Vec::new();
    let mut unchanged = 0;

    for row in rows {
        if !row.is_active() {
            stats.inactive += 1;
            unchanged += 1;
            continue;
        }

        if row.status == RowStatus::Maintenance {
            stats.maintenance += 1;
            stats.skipped_maintenance += 1;
            unchanged += 1;
            continue;
        }

        let key = EquipmentKey::normalize(&row.serial);
        if !identifiers.is_valid(&key) {
            stats.skipped_invalid_serial += 1;
            count_status(&mut stats, row.status);
            unchanged += 1;
            continue;
        }

        let target = match history.state(&key) {
            Some(state) => SyncTarget {
                status: state.status.into(),
                location: state.current_location.clone(),
                holder: state.current_holder.clone(),
            },
            None => SyncTarget::never_referenced(),
        };
        count_status(&mut stats, target.status);

        let before = row.current();
        let changed = before.changed_fields(&target);
        if changed.is_empty() && !options.force_update_all {
            unchanged += 1;
            continue;
        }

        let reason = if changed.is_empty() {
            "force-update".to_string()
        } else {
            format!("changed:{}", changed.join(","))
        };
        debug!(row = row.row_number, serial = %row.serial, %reason, "row scheduled for update");
        changes.push(ChangeRecord {
            row_number: row.row_number,
            name: row.name.clone(),
            serial: row.serial.clone(),
            before,
            after: target,
            reason,
        });
    }

    stats.active = stats.total - stats.inactive;

    SyncPlan {
        updated: changes.len(),
        unchanged,
        dry_run: options.dry_run,
        changes,
        stats,
    }
}

fn count_status(stats: &mut SyncStats, status: RowStatus) {
    match status {
        RowStatus::Borrowed => stats.borrowed += 1,
        RowStatus::Available => stats.available += 1,
        RowStatus::Maintenance => stats.maintenance += 1,
    }
}
