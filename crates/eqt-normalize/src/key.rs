//! Canonical equipment identifiers.
//!
//! The "no seri" column is free text. Matching is always done on the
//! normalized form; the original text is kept on the event for display only.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

/// Identifier values that mean "nothing was entered".
///
/// Compared against the *normalized* key, so `" N/A "` is caught as `"n/a"`.
pub const DEFAULT_PLACEHOLDERS: &[&str] = &["-", "na", "n/a", "null", "undefined"];

/// Normalized equipment identifier.
///
/// Only constructible through [`EquipmentKey::normalize`], so a raw identifier
/// can never be compared against a normalized one by accident.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EquipmentKey(String);

impl EquipmentKey {
    pub fn normalize(raw: &str) -> Self {
        Self(normalize_key(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EquipmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Run {
    Space,
    Dash,
}

/// Trim, lower-case, collapse whitespace runs to one space and runs of
/// `-`/`_` to a single `-`.
pub fn normalize_key(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut out = String::with_capacity(trimmed.len());
    let mut run: Option<Run> = None;

    for c in trimmed.chars() {
        if c.is_whitespace() {
            if run != Some(Run::Space) {
                out.push(' ');
            }
            run = Some(Run::Space);
        } else if c == '-' || c == '_' {
            if run != Some(Run::Dash) {
                out.push('-');
            }
            run = Some(Run::Dash);
        } else {
            out.extend(c.to_lowercase());
            run = None;
        }
    }

    out
}

/// `false` for empty keys and the default placeholder set.
pub fn is_valid_identifier(key: &EquipmentKey) -> bool {
    !key.is_empty() && !DEFAULT_PLACEHOLDERS.contains(&key.as_str())
}

/// Placeholder set used to reject identifiers. Entries are stored normalized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentifierPolicy {
    placeholders: BTreeSet<String>,
}

impl Default for IdentifierPolicy {
    fn default() -> Self {
        Self::with_placeholders(DEFAULT_PLACEHOLDERS.iter().copied())
    }
}

impl IdentifierPolicy {
    pub fn with_placeholders<I, S>(placeholders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            placeholders: placeholders
                .into_iter()
                .map(|p| normalize_key(p.as_ref()))
                .collect(),
        }
    }

    pub fn is_valid(&self, key: &EquipmentKey) -> bool {
        !key.is_empty() && !self.placeholders.contains(key.as_str())
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.placeholders.iter().map(String::as_str)
    }
}
