//! Raw history rows and their normalized form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::action::ActionPolicy;
use crate::key::EquipmentKey;
use crate::timestamp::parse_timestamp;
use crate::Action;

/// One history row as submitted through the form. All fields are free text
/// and may be empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEventRecord {
    /// Caller-assigned id (e.g. `row-12`). Positional `evt-N` when absent.
    pub event_id: Option<String>,
    pub timestamp: String,
    pub equipment_id: String,
    pub action: String,
    pub actor: String,
    pub location: String,
}

impl RawEventRecord {
    pub fn new(
        timestamp: impl Into<String>,
        equipment_id: impl Into<String>,
        action: impl Into<String>,
        actor: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            event_id: None,
            timestamp: timestamp.into(),
            equipment_id: equipment_id.into(),
            action: action.into(),
            actor: actor.into(),
            location: location.into(),
        }
    }

    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }
}

/// A typed history event. `equipment_key` is used for all matching;
/// `equipment_id` and `timestamp` keep the original text for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NormalizedEvent {
    pub event_id: String,
    pub timestamp: String,
    pub equipment_id: String,
    pub equipment_key: EquipmentKey,
    pub action: Action,
    /// `false` when the action text matched no rule and the policy fallback
    /// was applied.
    pub action_recognized: bool,
    pub instant: DateTime<Utc>,
    pub actor: String,
    pub location: String,
}

/// Normalize one record. `position` is the 0-based index of the record in
/// its batch and only matters when the record carries no event id.
pub fn normalize_record(
    raw: &RawEventRecord,
    position: usize,
    actions: &ActionPolicy,
) -> NormalizedEvent {
    let event_id = match raw.event_id.as_deref() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => format!("evt-{}", position + 1),
    };
    let action = actions.classify(&raw.action);

    NormalizedEvent {
        event_id,
        timestamp: raw.timestamp.clone(),
        equipment_id: raw.equipment_id.clone(),
        equipment_key: EquipmentKey::normalize(&raw.equipment_id),
        action: action.action(),
        action_recognized: action.is_recognized(),
        instant: parse_timestamp(&raw.timestamp),
        actor: raw.actor.clone(),
        location: raw.location.clone(),
    }
}
