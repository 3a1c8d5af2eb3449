//! The incentive record schema.
//!
//! One record per user, day, and incentive programme: how much the user
//! earned against what was claimable. Parsed and validated at the ingestion
//! boundary; by the time a record exists it is well-formed.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Participant gender as recorded in the source data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Female participant.
    Female,
    /// Male participant.
    Male,
}

impl Gender {
    /// The label used in source data and chart output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Female => "female",
            Self::Male => "male",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a gender label is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown gender: {0}")]
pub struct UnknownGender(pub String);

impl FromStr for Gender {
    type Err = UnknownGender;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("female") {
            Ok(Self::Female)
        } else if s.eq_ignore_ascii_case("male") {
            Ok(Self::Male)
        } else {
            Err(UnknownGender(s.to_string()))
        }
    }
}

/// The incentive programme a record's earnings belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncentiveKind {
    /// Step tracking.
    Steps,
    /// Sleep tracking.
    Sleep,
    /// Food tracking.
    Food,
}

impl IncentiveKind {
    /// All programmes, in stacking order.
    pub const ALL: [Self; 3] = [Self::Steps, Self::Sleep, Self::Food];

    /// The label used in source data and chart output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Steps => "steps",
            Self::Sleep => "sleep",
            Self::Food => "food",
        }
    }

    /// Human-readable programme name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Steps => "Step Tracking",
            Self::Sleep => "Sleep Tracking",
            Self::Food => "Food Tracking",
        }
    }
}

impl fmt::Display for IncentiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when an incentive label is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown incentive: {0}")]
pub struct UnknownIncentive(pub String);

impl FromStr for IncentiveKind {
    type Err = UnknownIncentive;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("steps") {
            Ok(Self::Steps)
        } else if s.eq_ignore_ascii_case("sleep") {
            Ok(Self::Sleep)
        } else if s.eq_ignore_ascii_case("food") {
            Ok(Self::Food)
        } else {
            Err(UnknownIncentive(s.to_string()))
        }
    }
}

/// Calendar quarter, bucketed from a record's month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quarter {
    /// January through March.
    Q1,
    /// April through June.
    Q2,
    /// July through September.
    Q3,
    /// October through December.
    Q4,
}

impl Quarter {
    /// All quarters in calendar order.
    pub const ALL: [Self; 4] = [Self::Q1, Self::Q2, Self::Q3, Self::Q4];

    /// Quarter containing the given 1-based month.
    #[must_use]
    pub const fn from_month(month: u32) -> Self {
        match month {
            1..=3 => Self::Q1,
            4..=6 => Self::Q2,
            7..=9 => Self::Q3,
            _ => Self::Q4,
        }
    }

    /// The chart label, `"Q1"` through `"Q4"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Q1 => "Q1",
            Self::Q2 => "Q2",
            Self::Q3 => "Q3",
            Self::Q4 => "Q4",
        }
    }

    /// Parses a chart label back into a quarter.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.as_str() == label)
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validated incentive record: what a user earned on a day under one
/// programme, against what was claimable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncentiveRecord {
    /// Day the earnings were tracked.
    pub date: NaiveDate,
    /// Participant identifier (may be empty for anonymized wide exports).
    pub uid: String,
    /// Participant gender.
    pub gender: Gender,
    /// Participant age in years.
    pub age: u8,
    /// Programme the earnings belong to.
    pub incentive: IncentiveKind,
    /// Amount earned.
    pub amount: Decimal,
    /// Amount that was claimable.
    pub amount_possible: Decimal,
}
