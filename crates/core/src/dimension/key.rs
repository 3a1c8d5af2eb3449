//! Dimension key values.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A sortable key derived from a record by a dimension's projection.
///
/// Keys carry every shape a projection produces in practice: calendar dates,
/// integer buckets (month index, weekday, histogram bin), monetary amounts,
/// and categorical labels. The derived `Ord` is total: variants compare in
/// declaration order, payloads in their natural order within a variant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    /// The single key of a whole-set group.
    Unit,
    /// Integer bucket (month number, weekday index, histogram bin).
    Int(i64),
    /// Calendar date.
    Date(NaiveDate),
    /// Monetary amount.
    Amount(Decimal),
    /// Categorical label.
    Text(String),
}

impl Key {
    /// The kind of this key, used to validate filter operands.
    #[must_use]
    pub const fn kind(&self) -> KeyKind {
        match self {
            Self::Unit => KeyKind::Unit,
            Self::Int(_) => KeyKind::Int,
            Self::Date(_) => KeyKind::Date,
            Self::Amount(_) => KeyKind::Amount,
            Self::Text(_) => KeyKind::Text,
        }
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<NaiveDate> for Key {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<Decimal> for Key {
    fn from(value: Decimal) -> Self {
        Self::Amount(value)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Discriminant of a [`Key`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    /// Whole-set key.
    Unit,
    /// Integer bucket.
    Int,
    /// Calendar date.
    Date,
    /// Monetary amount.
    Amount,
    /// Categorical label.
    Text,
}
