//! eqt-sync
//!
//! Consumer side of the reconciliation engine:
//! - `plan`: diff reconciled states against the equipment table and produce
//!   only the rows that need writing (plus before/after audit records)
//! - `throttle`: process-scoped rate limiter for on-demand syncs
//!
//! No IO. The caller reads the sheets, writes the deltas and owns the clock.

pub mod plan;
pub mod throttle;

pub use plan::{
    plan_sync, ChangeRecord, EquipmentRow, RowStatus, SyncOptions, SyncPlan, SyncStats, SyncTarget,
    ACTIVE_CONDITION,
};
pub use throttle::{SyncThrottle, ThrottleDecision, DEFAULT_MIN_INTERVAL};
