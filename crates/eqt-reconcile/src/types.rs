use std::collections::BTreeMap;

use eqt_normalize::{EquipmentKey, NormalizedEvent};
use serde::Serialize;

/// Holder shown while equipment is available.
pub const NO_HOLDER: &str = "-";

/// Location shown while equipment is available (the warehouse).
pub const WAREHOUSE: &str = "Gudang";

/// Stand-in for an empty actor/location on a checkout.
pub const UNKNOWN_FIELD: &str = "-";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentStatus {
    Available,
    Borrowed,
}

impl EquipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentStatus::Available => "available",
            EquipmentStatus::Borrowed => "borrowed",
        }
    }
}

/// Why an event was quarantined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    DuplicateCheckout,
    OrphanCheckin,
    InvalidIdentifier,
}

impl IssueKind {
    pub fn message(&self) -> &'static str {
        match self {
            IssueKind::DuplicateCheckout => "duplicate checkout while equipment is still borrowed",
            IssueKind::OrphanCheckin => "checkin without an active checkout; event ignored",
            IssueKind::InvalidIdentifier => "invalid equipment identifier; event ignored",
        }
    }
}

/// A normalized event plus its replay verdict. Immutable once produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReconciledEvent {
    #[serde(flatten)]
    pub event: NormalizedEvent,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_kind: Option<IssueKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_message: Option<String>,
}

impl ReconciledEvent {
    pub fn accepted(event: NormalizedEvent) -> Self {
        Self {
            event,
            valid: true,
            issue_kind: None,
            issue_message: None,
        }
    }

    pub fn rejected(event: NormalizedEvent, kind: IssueKind) -> Self {
        Self {
            event,
            valid: false,
            issue_kind: Some(kind),
            issue_message: Some(kind.message().to_string()),
        }
    }

    pub fn event_id(&self) -> &str {
        &self.event.event_id
    }
}

/// Current state of one piece of equipment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EquipmentState {
    pub equipment_key: EquipmentKey,
    pub status: EquipmentStatus,
    pub current_holder: String,
    pub current_location: String,
    /// Original timestamp text of the last valid transition ("" if none).
    pub last_event_timestamp: String,
    pub last_event_id: Option<String>,
    /// All checkout events seen, including rejected ones.
    pub checkout_count: u64,
    /// All checkin events seen, including rejected ones.
    pub checkin_count: u64,
    pub invalid_checkout_count: u64,
    pub invalid_checkin_count: u64,
}

impl EquipmentState {
    /// Default state for a key: available, in the warehouse, no holder.
    pub fn new(equipment_key: EquipmentKey) -> Self {
        Self {
            equipment_key,
            status: EquipmentStatus::Available,
            current_holder: NO_HOLDER.to_string(),
            current_location: WAREHOUSE.to_string(),
            last_event_timestamp: String::new(),
            last_event_id: None,
            checkout_count: 0,
            checkin_count: 0,
            invalid_checkout_count: 0,
            invalid_checkin_count: 0,
        }
    }

    pub fn is_borrowed(&self) -> bool {
        self.status == EquipmentStatus::Borrowed
    }

    /// Valid checkouts minus valid checkins. Always 0 or 1 after replay.
    pub fn net_checkouts(&self) -> i64 {
        let valid_out = self.checkout_count as i64 - self.invalid_checkout_count as i64;
        let valid_in = self.checkin_count as i64 - self.invalid_checkin_count as i64;
        valid_out - valid_in
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IssueCounts {
    pub duplicate_checkout: usize,
    pub orphan_checkin: usize,
    pub invalid_identifier: usize,
}

impl IssueCounts {
    /// State-machine rejections (duplicate + orphan), excluding bad identifiers.
    pub fn invalid_action(&self) -> usize {
        self.duplicate_checkout + self.orphan_checkin
    }
}

/// Full output of one reconciliation run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    /// Every event, in chronological replay order.
    pub events: Vec<ReconciledEvent>,
    /// Final state per key referenced by at least one event with a valid
    /// identifier.
    pub states: BTreeMap<EquipmentKey, EquipmentState>,
    /// The `valid == false` subsequence of `events`.
    pub issues: Vec<ReconciledEvent>,
    pub valid_event_count: usize,
    pub ignored_identifier_count: usize,
}

impl ReconciliationResult {
    pub fn state(&self, key: &EquipmentKey) -> Option<&EquipmentState> {
        self.states.get(key)
    }

    /// Look up by raw (un-normalized) identifier text.
    pub fn state_for(&self, raw_identifier: &str) -> Option<&EquipmentState> {
        self.state(&EquipmentKey::normalize(raw_identifier))
    }

    pub fn issue_counts(&self) -> IssueCounts {
        let mut counts = IssueCounts::default();
        for issue in &self.issues {
            match issue.issue_kind {
                Some(IssueKind::DuplicateCheckout) => counts.duplicate_checkout += 1,
                Some(IssueKind::OrphanCheckin) => counts.orphan_checkin += 1,
                Some(IssueKind::InvalidIdentifier) => counts.invalid_identifier += 1,
                None => {}
            }
        }
        counts
    }

    /// Events whose action text matched no rule (resolved by fallback).
    pub fn unrecognized_action_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| !e.event.action_recognized)
            .count()
    }
}
