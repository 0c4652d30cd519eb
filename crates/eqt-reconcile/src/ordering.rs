//! Replay order for history events.
//!
//! Primary key is the parsed instant. Ties (including every event stuck on
//! the epoch sentinel) are broken by the integer suffix of the event id when
//! both ids have one, so `row-9` replays before `row-10`; otherwise by plain
//! string comparison of the ids.

use std::cmp::Ordering;

use eqt_normalize::NormalizedEvent;

/// Trailing integer of an event id (`"row-12"` -> 12). Trailing whitespace
/// is ignored.
pub fn event_sequence(event_id: &str) -> Option<u128> {
    let trimmed = event_id.trim_end();
    let digits_start = trimmed
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    trimmed[digits_start..].parse().ok()
}

pub fn replay_order(a: &NormalizedEvent, b: &NormalizedEvent) -> Ordering {
    a.instant.cmp(&b.instant).then_with(|| {
        match (event_sequence(&a.event_id), event_sequence(&b.event_id)) {
            (Some(sa), Some(sb)) if sa != sb => sa.cmp(&sb),
            _ => a.event_id.cmp(&b.event_id),
        }
    })
}

/// Stable sort into replay order.
pub fn sort_for_replay(events: &mut [NormalizedEvent]) {
    events.sort_by(replay_order);
}
