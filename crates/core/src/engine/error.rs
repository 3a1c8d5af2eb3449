//! Engine error types.

use thiserror::Error;

use crate::dimension::KeyKind;

/// Errors raised when a filter is rejected.
///
/// A rejected filter leaves the dimension's prior filter untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// Filter operand kind does not match the dimension's key kind.
    #[error("filter on dimension '{dimension}' expects {expected:?} keys, got {got:?}")]
    KindMismatch {
        /// Dimension the filter was aimed at.
        dimension: String,
        /// Key kind the dimension projects to.
        expected: KeyKind,
        /// Key kind of the offending operand.
        got: KeyKind,
    },

    /// Range bounds are of two different key kinds.
    #[error("range bounds disagree on key kind: {lo:?} vs {hi:?}")]
    MixedRangeBounds {
        /// Kind of the lower bound.
        lo: KeyKind,
        /// Kind of the upper bound.
        hi: KeyKind,
    },
}
