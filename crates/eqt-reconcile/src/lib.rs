//! eqt-reconcile
//!
//! History reconciliation engine.
//!
//! Derives the current state of every piece of equipment from the full,
//! unordered check-out/check-in log:
//! - events are replayed in chronological order through a two-state machine
//!   (Available <-> Borrowed)
//! - a checkout of borrowed equipment is quarantined as `DuplicateCheckout`
//! - a checkin of available equipment is quarantined as `OrphanCheckin`
//! - placeholder identifiers are quarantined as `InvalidIdentifier` and never
//!   touch state
//!
//! Rejected events never mutate holder/location, so the last *valid*
//! transition stays the ground truth.
//!
//! Deterministic, pure logic. No IO. Each call recomputes everything from
//! the records it is given.

mod engine;
mod invariant;
mod ordering;
mod types;

pub use engine::{reconcile, reconcile_with, ReconcilePolicy};
pub use invariant::{check_two_state_invariant, InvariantViolation};
pub use ordering::{event_sequence, replay_order, sort_for_replay};
pub use types::*;
