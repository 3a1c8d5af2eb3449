//! Per-dimension filter predicates.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::key::Key;

/// The active predicate of one dimension.
///
/// Exactly one filter is active per dimension at a time; setting a new one
/// replaces the prior one. [`Filter::All`] is the identity filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// Accepts every key.
    #[default]
    All,
    /// Accepts keys in the closed range `[lo, hi]`.
    ///
    /// A range with `lo > hi` matches nothing. That is a valid filter (no
    /// records selected on this dimension), distinct from [`Filter::All`].
    Range {
        /// Inclusive lower bound.
        lo: Key,
        /// Inclusive upper bound.
        hi: Key,
    },
    /// Accepts exactly the listed key values.
    Among(BTreeSet<Key>),
}

impl Filter {
    /// Returns true if `key` passes this filter.
    #[must_use]
    pub fn accepts(&self, key: &Key) -> bool {
        match self {
            Self::All => true,
            Self::Range { lo, hi } => lo <= key && key <= hi,
            Self::Among(values) => values.contains(key),
        }
    }

    /// Returns true if this is the identity filter.
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_accepts_everything() {
        let filter = Filter::All;

        assert!(filter.accepts(&Key::Int(0)));
        assert!(filter.accepts(&Key::from("anything")));
    }

    #[test]
    fn test_range_is_inclusive_on_both_ends() {
        let filter = Filter::Range {
            lo: Key::Int(2),
            hi: Key::Int(5),
        };

        assert!(!filter.accepts(&Key::Int(1)));
        assert!(filter.accepts(&Key::Int(2)));
        assert!(filter.accepts(&Key::Int(5)));
        assert!(!filter.accepts(&Key::Int(6)));
    }

    #[test]
    fn test_inverted_range_matches_nothing() {
        let filter = Filter::Range {
            lo: Key::Int(10),
            hi: Key::Int(5),
        };

        for value in [4, 5, 7, 10, 11] {
            assert!(!filter.accepts(&Key::Int(value)));
        }
        assert!(!filter.is_all());
    }

    #[test]
    fn test_among_accepts_listed_values_only() {
        let filter = Filter::Among([Key::from("steps"), Key::from("sleep")].into());

        assert!(filter.accepts(&Key::from("steps")));
        assert!(filter.accepts(&Key::from("sleep")));
        assert!(!filter.accepts(&Key::from("food")));
    }
}
