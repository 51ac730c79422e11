use std::fmt;
use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

/// The format dates are written out in.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// The format bank exports use for dates unless a mapping says otherwise.
pub const DEFAULT_INPUT_DATE_FORMAT: &str = "%Y/%m/%d";

/// Years a spreadsheet can store as a date.
pub const SUPPORTED_YEARS: RangeInclusive<i32> = 1900..=9999;

/// A statement date, either properly read or kept as best-effort text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementDate {
    /// The date matched the expected input format.
    Parsed(NaiveDate),
    /// The date did not match; this is the original text with `/` swapped for `-`.
    Unparsed(String),
}

impl StatementDate {
    /// Whether the date had to fall back to plain text substitution.
    pub fn is_degraded(&self) -> bool {
        matches!(self, StatementDate::Unparsed(_))
    }

    /// The calendar date, if one could be read.
    pub fn as_date(&self) -> Option<&NaiveDate> {
        match self {
            StatementDate::Parsed(date) => Some(date),
            StatementDate::Unparsed(_) => None,
        }
    }
}

impl fmt::Display for StatementDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementDate::Parsed(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            StatementDate::Unparsed(text) => f.write_str(text),
        }
    }
}

impl Serialize for StatementDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Read a date in the given chrono format and normalize it to ISO form.
///
/// Dates that do not match are not rejected: the slashes are replaced by
/// dashes and the text is kept as is, so `21/08/2025` read with the
/// default format comes out as `21-08-2025`.
///
/// Years a spreadsheet cannot hold (see [`SUPPORTED_YEARS`]) are treated
/// as unreadable too; they are almost always typos.
pub fn normalize_date(raw: &str, input_fmt: &str) -> StatementDate {
    let trimmed = raw.trim();
    match NaiveDate::parse_from_str(trimmed, input_fmt) {
        Ok(date) if SUPPORTED_YEARS.contains(&date.year()) => StatementDate::Parsed(date),
        _ => StatementDate::Unparsed(trimmed.replace('/', "-")),
    }
}
