//! Action resolution: free-text action label -> [`Action`].
//!
//! The form's action column is typed by hand in Indonesian or English
//! ("Peminjaman", "pinjam alat", "checkout", "Pengembalian", "return", ...).
//! Checkout rules are evaluated first; text matching neither rule set falls
//! back to [`ActionPolicy::fallback`], which is `Checkin` for the legacy
//! policy. That fallback hides malformed rows as completed returns, so
//! [`ActionPolicy::classify`] reports whether a rule actually matched.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Checkout,
    Checkin,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Checkout => "checkout",
            Action::Checkin => "checkin",
        }
    }
}

/// Outcome of classifying action text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionMatch {
    /// A checkout or checkin rule matched.
    Recognized(Action),
    /// No rule matched; the policy fallback was applied.
    Fallback(Action),
}

impl ActionMatch {
    pub fn action(self) -> Action {
        match self {
            ActionMatch::Recognized(a) | ActionMatch::Fallback(a) => a,
        }
    }

    pub fn is_recognized(self) -> bool {
        matches!(self, ActionMatch::Recognized(_))
    }
}

/// One rule set. Terms are lower-case and matched against trimmed,
/// lower-cased action text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionTerms {
    /// Text starts with any of these.
    pub prefixes: Vec<String>,
    /// Text contains any of these.
    pub contains: Vec<String>,
    /// Text equals any of these.
    pub exact: Vec<String>,
}

impl ActionTerms {
    pub fn new<S: AsRef<str>>(prefixes: &[S], contains: &[S], exact: &[S]) -> Self {
        let lower = |terms: &[S]| -> Vec<String> {
            terms
                .iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect()
        };
        Self {
            prefixes: lower(prefixes),
            contains: lower(contains),
            exact: lower(exact),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty() && self.contains.is_empty() && self.exact.is_empty()
    }

    fn matches(&self, cleaned: &str) -> bool {
        self.prefixes.iter().any(|p| cleaned.starts_with(p.as_str()))
            || self.contains.iter().any(|c| cleaned.contains(c.as_str()))
            || self.exact.iter().any(|e| cleaned == e)
    }
}

/// Named, swappable action-resolution policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionPolicy {
    pub checkout: ActionTerms,
    pub checkin: ActionTerms,
    pub fallback: Action,
}

impl Default for ActionPolicy {
    fn default() -> Self {
        Self::legacy()
    }
}

impl ActionPolicy {
    /// The synonym sets the history form has always been read with.
    /// Unrecognized text resolves to `Checkin`.
    pub fn legacy() -> Self {
        Self {
            checkout: ActionTerms::new(
                &["peminjam"],
                &["pinjam", "checkout", "keluar"],
                &["borrow"],
            ),
            checkin: ActionTerms::new(&["pengembali"], &["kembali", "checkin"], &["return"]),
            fallback: Action::Checkin,
        }
    }

    pub fn classify(&self, raw: &str) -> ActionMatch {
        let cleaned = raw.trim().to_lowercase();
        if self.checkout.matches(&cleaned) {
            return ActionMatch::Recognized(Action::Checkout);
        }
        if self.checkin.matches(&cleaned) {
            return ActionMatch::Recognized(Action::Checkin);
        }
        ActionMatch::Fallback(self.fallback)
    }

    pub fn resolve(&self, raw: &str) -> Action {
        self.classify(raw).action()
    }
}

/// Resolve with [`ActionPolicy::legacy`].
pub fn resolve_action(raw: &str) -> Action {
    ActionPolicy::legacy().resolve(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indonesian_checkout_labels() {
        for raw in ["Peminjaman", "pinjam alat", "  KELUAR ", "Dipinjam"] {
            assert_eq!(resolve_action(raw), Action::Checkout, "{raw}");
        }
    }

    #[test]
    fn english_checkout_labels() {
        assert_eq!(resolve_action("Checkout"), Action::Checkout);
        assert_eq!(resolve_action("borrow"), Action::Checkout);
    }

    #[test]
    fn borrow_only_matches_exactly() {
        // "borrowed" is neither an exact "borrow" nor any other term.
        let m = ActionPolicy::legacy().classify("borrowed");
        assert_eq!(m, ActionMatch::Fallback(Action::Checkin));
    }

    #[test]
    fn checkin_labels() {
        for raw in ["Pengembalian", "dikembalikan", "CHECKIN", "return"] {
            let m = ActionPolicy::legacy().classify(raw);
            assert_eq!(m, ActionMatch::Recognized(Action::Checkin), "{raw}");
        }
    }

    #[test]
    fn checkout_rules_win_over_checkin_rules() {
        // contains both "pinjam" and "kembali"
        assert_eq!(resolve_action("pinjam kembali"), Action::Checkout);
    }

    #[test]
    fn unrecognized_text_falls_back_to_checkin() {
        let policy = ActionPolicy::legacy();
        for raw in ["", "   ", "???", "service"] {
            let m = policy.classify(raw);
            assert!(!m.is_recognized(), "{raw}");
            assert_eq!(m.action(), Action::Checkin);
        }
    }

    #[test]
    fn fallback_is_swappable() {
        let policy = ActionPolicy {
            fallback: Action::Checkout,
            ..ActionPolicy::legacy()
        };
        assert_eq!(policy.resolve("???"), Action::Checkout);
        assert_eq!(policy.resolve("return"), Action::Checkin);
    }

    #[test]
    fn terms_are_lowercased_on_construction() {
        let terms = ActionTerms::new(&["  OUT "], &[], &[""]);
        assert_eq!(terms.prefixes, vec!["out".to_string()]);
        assert!(terms.exact.is_empty());
    }
}
