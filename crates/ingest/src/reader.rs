//! CSV reading for incentive exports.
//!
//! Two layouts exist in the wild. The narrow layout carries one record per
//! row; the wide layout carries one row per user and day with a column per
//! programme, and expands to three records. The header row decides which
//! layout applies; anything else is rejected before any row is parsed.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;

use faceta_core::incentives::{Gender, IncentiveKind, IncentiveRecord};

use crate::error::LoadError;

const NARROW_HEADER: [&str; 7] = [
    "date",
    "uid",
    "gender",
    "age",
    "incentive",
    "amount",
    "amount_possible",
];

const WIDE_HEADER_WITH_UID: [&str; 8] = [
    "date",
    "uid",
    "gender",
    "age",
    "steps_amount",
    "sleep_amount",
    "food_amount",
    "amount_possible",
];

const WIDE_HEADER: [&str; 7] = [
    "date",
    "gender",
    "age",
    "steps_amount",
    "sleep_amount",
    "food_amount",
    "amount_possible",
];

/// The column layout of an incentive export, detected from its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvLayout {
    /// One record per row: `date,uid,gender,age,incentive,amount,amount_possible`.
    Narrow,
    /// One row per user and day with a column per programme; expands to
    /// three records. Anonymized exports omit the `uid` column.
    Wide {
        /// Whether the header carries a `uid` column.
        has_uid: bool,
    },
}

impl CsvLayout {
    /// Detects the layout from a header row.
    fn detect(headers: &StringRecord) -> Result<Self, LoadError> {
        if headers.is_empty() {
            return Err(LoadError::MissingHeader);
        }
        let names: Vec<String> = headers
            .iter()
            .map(|h| h.trim().to_ascii_lowercase())
            .collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();

        if names == NARROW_HEADER {
            Ok(Self::Narrow)
        } else if names == WIDE_HEADER_WITH_UID {
            Ok(Self::Wide { has_uid: true })
        } else if names == WIDE_HEADER {
            Ok(Self::Wide { has_uid: false })
        } else {
            Err(LoadError::UnrecognizedHeader(names.join(", ")))
        }
    }

    /// Parses one data row into `records`.
    fn parse_into(
        self,
        row: &StringRecord,
        row_number: usize,
        records: &mut Vec<IncentiveRecord>,
    ) -> Result<(), LoadError> {
        match self {
            Self::Narrow => {
                let date = parse_date(field(row, 0, "date", row_number)?, row_number)?;
                let uid = field(row, 1, "uid", row_number)?.to_string();
                let gender = parse_gender(field(row, 2, "gender", row_number)?, row_number)?;
                let age = parse_age(field(row, 3, "age", row_number)?, row_number)?;
                let incentive =
                    parse_incentive(field(row, 4, "incentive", row_number)?, row_number)?;
                let amount = parse_amount(field(row, 5, "amount", row_number)?, "amount", row_number)?;
                let amount_possible = parse_amount(
                    field(row, 6, "amount_possible", row_number)?,
                    "amount_possible",
                    row_number,
                )?;

                records.push(IncentiveRecord {
                    date,
                    uid,
                    gender,
                    age,
                    incentive,
                    amount,
                    amount_possible,
                });
            }
            Self::Wide { has_uid } => {
                let offset = usize::from(has_uid);
                let date = parse_date(field(row, 0, "date", row_number)?, row_number)?;
                let uid = if has_uid {
                    field(row, 1, "uid", row_number)?.to_string()
                } else {
                    String::new()
                };
                let gender = parse_gender(field(row, 1 + offset, "gender", row_number)?, row_number)?;
                let age = parse_age(field(row, 2 + offset, "age", row_number)?, row_number)?;
                let amount_possible = parse_amount(
                    field(row, 6 + offset, "amount_possible", row_number)?,
                    "amount_possible",
                    row_number,
                )?;

                let columns = [
                    (IncentiveKind::Steps, 3 + offset, "steps_amount"),
                    (IncentiveKind::Sleep, 4 + offset, "sleep_amount"),
                    (IncentiveKind::Food, 5 + offset, "food_amount"),
                ];
                for (incentive, index, name) in columns {
                    let amount = parse_amount(field(row, index, name, row_number)?, name, row_number)?;
                    records.push(IncentiveRecord {
                        date,
                        uid: uid.clone(),
                        gender,
                        age,
                        incentive,
                        amount,
                        amount_possible,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Reads and validates an incentive export from any reader.
///
/// The whole input is materialized: the first malformed row aborts the load
/// with a [`LoadError`] naming the row, and nothing is returned.
///
/// # Errors
///
/// See [`LoadError`] for the taxonomy.
pub fn read_records<T: Read>(input: T) -> Result<Vec<IncentiveRecord>, LoadError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(input);

    let layout = CsvLayout::detect(reader.headers()?)?;

    let mut records = Vec::new();
    let mut rows = 0_usize;
    for row in reader.records() {
        let row = row?;
        rows += 1;
        layout.parse_into(&row, rows, &mut records)?;
    }

    tracing::info!(rows, loaded = records.len(), ?layout, "loaded incentive records");
    Ok(records)
}

/// Reads and validates an incentive export from a file on disk.
///
/// # Errors
///
/// See [`LoadError`] for the taxonomy.
pub fn read_records_from_path(path: impl AsRef<Path>) -> Result<Vec<IncentiveRecord>, LoadError> {
    let file = File::open(path.as_ref())?;
    read_records(BufReader::new(file))
}

fn field<'a>(
    row: &'a StringRecord,
    index: usize,
    name: &'static str,
    row_number: usize,
) -> Result<&'a str, LoadError> {
    row.get(index).ok_or(LoadError::MissingField {
        row: row_number,
        field: name,
    })
}

fn parse_date(value: &str, row: usize) -> Result<NaiveDate, LoadError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| LoadError::InvalidDate {
        row,
        value: value.to_string(),
    })
}

fn parse_amount(value: &str, name: &'static str, row: usize) -> Result<Decimal, LoadError> {
    let amount: Decimal = value.parse().map_err(|_| LoadError::InvalidNumber {
        row,
        field: name,
        value: value.to_string(),
    })?;
    if amount < Decimal::ZERO {
        return Err(LoadError::NegativeAmount {
            row,
            field: name,
            value: value.to_string(),
        });
    }
    Ok(amount)
}

fn parse_age(value: &str, row: usize) -> Result<u8, LoadError> {
    value.parse().map_err(|_| LoadError::InvalidAge {
        row,
        value: value.to_string(),
    })
}

fn parse_gender(value: &str, row: usize) -> Result<Gender, LoadError> {
    value.parse().map_err(|_| LoadError::UnknownGender {
        row,
        value: value.to_string(),
    })
}

fn parse_incentive(value: &str, row: usize) -> Result<IncentiveKind, LoadError> {
    value.parse().map_err(|_| LoadError::UnknownIncentive {
        row,
        value: value.to_string(),
    })
}
