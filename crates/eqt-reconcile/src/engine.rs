use std::collections::BTreeMap;

use eqt_normalize::{
    normalize_record, Action, ActionPolicy, EquipmentKey, IdentifierPolicy, NormalizedEvent,
    RawEventRecord,
};
use tracing::{debug, info};

use crate::ordering::sort_for_replay;
use crate::{
    EquipmentState, EquipmentStatus, IssueKind, ReconciledEvent, ReconciliationResult, NO_HOLDER,
    UNKNOWN_FIELD, WAREHOUSE,
};

/// Policies the normalizer applies before replay.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcilePolicy {
    pub actions: ActionPolicy,
    pub identifiers: IdentifierPolicy,
}

/// Reconcile with the legacy action policy and default placeholder set.
pub fn reconcile(records: &[RawEventRecord]) -> ReconciliationResult {
    reconcile_with(records, &ReconcilePolicy::default())
}

/// Normalize, sort into replay order, replay.
///
/// Never fails: malformed or contradictory rows come back as issues.
pub fn reconcile_with(records: &[RawEventRecord], policy: &ReconcilePolicy) -> ReconciliationResult {
    let mut prepared: Vec<NormalizedEvent> = records
        .iter()
        .enumerate()
        .map(|(position, raw)| normalize_record(raw, position, &policy.actions))
        .collect();
    sort_for_replay(&mut prepared);

    let mut replay = Replay::default();
    for event in prepared {
        replay.apply(event, &policy.identifiers);
    }
    let result = replay.finish();

    info!(
        records = records.len(),
        valid = result.valid_event_count,
        issues = result.issues.len(),
        ignored_identifiers = result.ignored_identifier_count,
        equipment = result.states.len(),
        "history reconciled"
    );
    result
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Replay {
    states: BTreeMap<EquipmentKey, EquipmentState>,
    events: Vec<ReconciledEvent>,
    valid_event_count: usize,
    ignored_identifier_count: usize,
}

impl Replay {
    fn apply(&mut self, event: NormalizedEvent, identifiers: &IdentifierPolicy) {
        if !identifiers.is_valid(&event.equipment_key) {
            self.ignored_identifier_count += 1;
            debug!(
                event_id = %event.event_id,
                equipment_id = %event.equipment_id,
                "event quarantined: invalid identifier"
            );
            self.events
                .push(ReconciledEvent::rejected(event, IssueKind::InvalidIdentifier));
            return;
        }

        let state = self
            .states
            .entry(event.equipment_key.clone())
            .or_insert_with(|| EquipmentState::new(event.equipment_key.clone()));

        let verdict = match event.action {
            Action::Checkout => checkout(state, &event),
            Action::Checkin => checkin(state, &event),
        };

        match verdict {
            Ok(()) => {
                self.valid_event_count += 1;
                self.events.push(ReconciledEvent::accepted(event));
            }
            Err(kind) => {
                debug!(
                    event_id = %event.event_id,
                    equipment_key = %event.equipment_key,
                    issue = ?kind,
                    "event quarantined"
                );
                self.events.push(ReconciledEvent::rejected(event, kind));
            }
        }
    }

    fn finish(self) -> ReconciliationResult {
        let issues = self.events.iter().filter(|e| !e.valid).cloned().collect();
        ReconciliationResult {
            events: self.events,
            states: self.states,
            issues,
            valid_event_count: self.valid_event_count,
            ignored_identifier_count: self.ignored_identifier_count,
        }
    }
}

/// Available -> Borrowed. A checkout of borrowed equipment leaves holder,
/// location and last-event fields untouched.
fn checkout(state: &mut EquipmentState, event: &NormalizedEvent) -> Result<(), IssueKind> {
    state.checkout_count += 1;
    if state.status == EquipmentStatus::Borrowed {
        state.invalid_checkout_count += 1;
        return Err(IssueKind::DuplicateCheckout);
    }

    state.status = EquipmentStatus::Borrowed;
    state.current_holder = or_unknown(&event.actor);
    state.current_location = or_unknown(&event.location);
    mark_transition(state, event);
    Ok(())
}

/// Borrowed -> Available.
fn checkin(state: &mut EquipmentState, event: &NormalizedEvent) -> Result<(), IssueKind> {
    state.checkin_count += 1;
    if state.status == EquipmentStatus::Available {
        state.invalid_checkin_count += 1;
        return Err(IssueKind::OrphanCheckin);
    }

    state.status = EquipmentStatus::Available;
    state.current_holder = NO_HOLDER.to_string();
    state.current_location = WAREHOUSE.to_string();
    mark_transition(state, event);
    Ok(())
}

fn mark_transition(state: &mut EquipmentState, event: &NormalizedEvent) {
    state.last_event_timestamp = event.timestamp.clone();
    state.last_event_id = Some(event.event_id.clone());
}

fn or_unknown(value: &str) -> String {
    if value.is_empty() {
        UNKNOWN_FIELD.to_string()
    } else {
        value.to_string()
    }
}
