mod amount;
mod categorize;
mod dates;
mod emit;
mod file_io;
mod opcode;
mod process;
mod rules;

use std::collections::HashMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

pub use amount::{parse_amount, parse_optional_amount};
pub use categorize::{Categorization, CategorizationRule, RuleSet, FALLBACK_LABEL};
pub use dates::{normalize_date, StatementDate, DATE_FORMAT, DEFAULT_INPUT_DATE_FORMAT};
pub use emit::{rows_to_csv, rows_to_xlsx, OutputFormat, COLUMNS, SHEET_NAME};
pub use file_io::{ensure_storage_path, store_raw_statements};
pub use opcode::extract_operation_code;
pub use process::{process_csv_files, write_statements_to_file, StatementProcessor};
pub use rules::{normalize_path, MappingRulesCsv, RuleFileData};

/// A best-effort value along with whether it had to fall back to a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parsed<T> {
    pub value: T,
    pub degraded: bool,
}

impl<T> Parsed<T> {
    /// A value read exactly as given.
    pub fn exact(value: T) -> Self {
        Parsed {
            value,
            degraded: false,
        }
    }

    /// A stand-in value used because the input could not be read.
    pub fn degraded(value: T) -> Self {
        Parsed {
            value,
            degraded: true,
        }
    }
}

/// Direction of money for a statement line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MovementType {
    #[serde(rename = "Débito")]
    Debit,
    #[serde(rename = "Crédito")]
    Credit,
}

impl MovementType {
    /// Infer the direction from the sign of the amount.
    pub fn from_amount(amount: Decimal) -> Self {
        if amount.is_sign_negative() && !amount.is_zero() {
            MovementType::Debit
        } else {
            MovementType::Credit
        }
    }
}

impl fmt::Display for MovementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovementType::Debit => f.write_str("Débito"),
            MovementType::Credit => f.write_str("Crédito"),
        }
    }
}

/// Which fields of a row were filled in with a best-effort value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Degradations {
    pub date: bool,
    pub amount: bool,
    pub balance: bool,
}

impl Degradations {
    pub fn any(&self) -> bool {
        self.date || self.amount || self.balance
    }
}

/// A bank statement line after parsing and categorization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRow {
    #[serde(rename = "Fecha")]
    pub date: StatementDate,
    #[serde(rename = "Descripción")]
    pub description: String,
    #[serde(rename = "Código operación")]
    pub operation_code: String,
    #[serde(rename = "Importe")]
    pub amount: Decimal,
    #[serde(rename = "Saldo")]
    pub balance: Decimal,
    #[serde(rename = "Tipo movimiento")]
    pub movement: MovementType,
    #[serde(rename = "Fuente")]
    pub source: String,
    #[serde(rename = "Imputación")]
    pub category: String,
    #[serde(rename = "Cuenta")]
    pub account: Option<String>,
    #[serde(skip_serializing)]
    pub degraded: Degradations,
}

impl NormalizedRow {
    /// Build a row from raw cells already keyed by the canonical column
    /// names (`Date`, `Description`, `Code`, `Amount`, `Balance`, `Debit`,
    /// `Credit`).
    ///
    /// This never fails: unreadable cells are replaced by best-effort values
    /// and recorded in `degraded`.
    pub fn from_raw_data(
        mapping: &HashMap<String, String>,
        negate: bool,
        date_fmt: &str,
        source: &str,
        rules: &RuleSet,
    ) -> Self {
        let description = mapping
            .get("Description")
            .map(|x| x.trim().to_owned())
            .unwrap_or_default();

        let date = normalize_date(
            mapping.get("Date").map(String::as_str).unwrap_or_default(),
            date_fmt,
        );

        // Separate debit and credit columns give the direction directly,
        // otherwise it comes from the sign of a single amount column.
        let (amount, movement) =
            if mapping.contains_key("Debit") || mapping.contains_key("Credit") {
                let debit = parse_cell(mapping.get("Debit"));
                let credit = parse_cell(mapping.get("Credit"));
                let both_blank = is_blank(mapping.get("Debit")) && is_blank(mapping.get("Credit"));
                let movement = if debit.value.is_zero() {
                    MovementType::Credit
                } else {
                    MovementType::Debit
                };
                let amount = Parsed {
                    value: credit.value.abs() - debit.value.abs(),
                    degraded: debit.degraded || credit.degraded || both_blank,
                };
                (amount, movement)
            } else {
                let mut amount = parse_optional_amount(mapping.get("Amount").map(String::as_str));
                if negate {
                    amount.value = -amount.value;
                }
                let movement = MovementType::from_amount(amount.value);
                (amount, movement)
            };

        let balance = parse_cell(mapping.get("Balance"));

        let operation_code = mapping
            .get("Code")
            .map(|x| x.trim())
            .filter(|x| !x.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| extract_operation_code(&description));

        let Categorization { label, account } = rules.classify(&description);

        NormalizedRow {
            degraded: Degradations {
                date: date.is_degraded(),
                amount: amount.degraded,
                balance: balance.degraded,
            },
            date,
            description,
            operation_code,
            amount: amount.value,
            balance: balance.value,
            movement,
            source: source.to_owned(),
            category: label,
            account,
        }
    }
}

/// Whether an optional cell is missing or holds only whitespace.
fn is_blank(cell: Option<&String>) -> bool {
    cell.map_or(true, |x| x.trim().is_empty())
}

/// Read an optional money cell where a blank cell simply means zero.
fn parse_cell(cell: Option<&String>) -> Parsed<Decimal> {
    match cell {
        Some(x) if !x.trim().is_empty() => parse_amount(x),
        _ => Parsed::exact(Decimal::ZERO),
    }
}

/// Build a string map from pairs; handy for describing rows in tests.
#[cfg(test)]
pub(crate) fn as_hashmap<K: AsRef<str>, V: AsRef<str>>(pairs: Vec<(K, V)>) -> HashMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.as_ref().to_owned(), v.as_ref().to_owned()))
        .collect()
}
