//! eqt-normalize
//!
//! Event Normalizer: turns free-text history rows (as typed into a public
//! form) into [`NormalizedEvent`] values the reconciliation engine can replay.
//!
//! - action text (multi-language) -> binary [`Action`] via a named [`ActionPolicy`]
//! - equipment identifiers -> canonical [`EquipmentKey`]
//! - heterogeneous timestamps -> UTC instant (epoch sentinel when unparseable)
//!
//! Deterministic, pure logic. No IO.

pub mod action;
pub mod event;
pub mod key;
pub mod timestamp;

pub use action::{resolve_action, Action, ActionMatch, ActionPolicy, ActionTerms};
pub use event::{normalize_record, NormalizedEvent, RawEventRecord};
pub use key::{is_valid_identifier, normalize_key, EquipmentKey, IdentifierPolicy, DEFAULT_PLACEHOLDERS};
pub use timestamp::{epoch_sentinel, is_epoch_sentinel, parse_timestamp};
