//! Ingestion error types.

use thiserror::Error;

/// Errors raised while loading an incentive export.
///
/// Loading is all-or-nothing: the first malformed row aborts the load, and
/// the caller may retry with corrected input. Row numbers are 1-based and
/// count data rows, not the header.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Underlying I/O failure.
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// CSV transport failure (unbalanced quotes, wrong field count).
    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),

    /// The input has no header row.
    #[error("missing header row")]
    MissingHeader,

    /// The header matches neither the narrow nor the wide layout.
    #[error("unrecognized header [{0}]: expected the narrow or wide incentive layout")]
    UnrecognizedHeader(String),

    /// A row is shorter than its layout requires.
    #[error("row {row}: missing field '{field}'")]
    MissingField {
        /// 1-based data row.
        row: usize,
        /// Name of the absent field.
        field: &'static str,
    },

    /// A date field does not parse as `YYYY-MM-DD`.
    #[error("row {row}: invalid date '{value}' (expected YYYY-MM-DD)")]
    InvalidDate {
        /// 1-based data row.
        row: usize,
        /// Offending field value.
        value: String,
    },

    /// A numeric field does not parse.
    #[error("row {row}: invalid number '{value}' for field '{field}'")]
    InvalidNumber {
        /// 1-based data row.
        row: usize,
        /// Name of the field.
        field: &'static str,
        /// Offending field value.
        value: String,
    },

    /// A numeric field parsed but is negative.
    #[error("row {row}: negative amount '{value}' for field '{field}'")]
    NegativeAmount {
        /// 1-based data row.
        row: usize,
        /// Name of the field.
        field: &'static str,
        /// Offending field value.
        value: String,
    },

    /// An age field does not parse as a small non-negative integer.
    #[error("row {row}: invalid age '{value}'")]
    InvalidAge {
        /// 1-based data row.
        row: usize,
        /// Offending field value.
        value: String,
    },

    /// A gender label is not recognized.
    #[error("row {row}: unknown gender '{value}'")]
    UnknownGender {
        /// 1-based data row.
        row: usize,
        /// Offending field value.
        value: String,
    },

    /// An incentive label is not recognized.
    #[error("row {row}: unknown incentive '{value}'")]
    UnknownIncentive {
        /// 1-based data row.
        row: usize,
        /// Offending field value.
        value: String,
    },
}
