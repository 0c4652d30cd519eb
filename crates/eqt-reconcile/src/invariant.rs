//! Two-state invariant over a finished reconciliation.
//!
//! For every key: valid checkouts minus valid checkins is 0 or 1, and is 1
//! exactly when the equipment is borrowed. Replay enforces this by
//! quarantining; this check exists so callers and tests can assert it on any
//! result they hold.

use std::fmt;

use eqt_normalize::EquipmentKey;

use crate::{EquipmentStatus, ReconciliationResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvariantViolation {
    pub equipment_key: EquipmentKey,
    pub net_checkouts: i64,
    pub status: EquipmentStatus,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "two-state invariant violated for '{}': net valid checkouts={} status={}",
            self.equipment_key,
            self.net_checkouts,
            self.status.as_str()
        )
    }
}

impl std::error::Error for InvariantViolation {}

/// First violating state in key order, if any.
pub fn check_two_state_invariant(result: &ReconciliationResult) -> Result<(), InvariantViolation> {
    for state in result.states.values() {
        let net = state.net_checkouts();
        let expected = if state.is_borrowed() { 1 } else { 0 };
        if net != expected {
            return Err(InvariantViolation {
                equipment_key: state.equipment_key.clone(),
                net_checkouts: net,
                status: state.status,
            });
        }
    }
    Ok(())
}
