use std::collections::HashMap;

use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::dates::DEFAULT_INPUT_DATE_FORMAT;

/// Rules for how to identify CSV columns to a statement source, and how
/// to map those column names to the canonical column names.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MappingRulesCsv {
    /// The label to give this source; it ends up in the Fuente column.
    pub label: String,
    /// The columns to expect from this source.
    identify: Vec<String>,
    /// How to map the given column names to canonical column names.
    translate: Option<RemapValuesCsv>,
    /// The format string for dates for this rule set.
    #[serde(default = "default_fmt_string")]
    pub date_fmt: String,
    /// Whether or not we need to negate the value of a transaction.
    #[serde(rename = "debit_is_positive", default)]
    pub negate: bool,
}

/// The default format string to use if not specified.
fn default_fmt_string() -> String {
    DEFAULT_INPUT_DATE_FORMAT.to_owned()
}

/// Strip the byte order mark and padding some banks put around headers.
fn clean_header(header: &str) -> &str {
    header.trim_start_matches('\u{feff}').trim()
}

impl MappingRulesCsv {
    /// Construct a new object - only needed for testing.
    #[cfg(test)]
    pub fn new(
        label: String,
        identify: Vec<String>,
        translate: HashMap<String, String>,
        date_fmt: Option<String>,
        negate: bool,
    ) -> MappingRulesCsv {
        let get = |key: &str| translate.get(key).map(|x| x.to_owned());
        MappingRulesCsv {
            label,
            identify,
            translate: (!translate.is_empty()).then(|| RemapValuesCsv {
                date: get("date"),
                description: get("description"),
                code: get("code"),
                amount: get("amount"),
                balance: get("balance"),
                debit: get("debit"),
                credit: get("credit"),
            }),
            date_fmt: date_fmt.unwrap_or(default_fmt_string()),
            negate,
        }
    }

    /// Check if the given header matches these rules.
    pub fn header_matches(&self, headers: &[String]) -> bool {
        self.identify.len() == headers.len()
            && self
                .identify
                .iter()
                .zip(headers)
                .all(|(expected, found)| clean_header(expected) == clean_header(found))
    }

    /// Ensure all mapping keys appear in the identify vector.
    pub fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(anyhow!("Every CSV mapping must give a label."));
        }
        if let Some(trans) = &self.translate {
            for (_, value) in trans.pairs() {
                if let Some(val) = value {
                    if !self.identify.contains(val) {
                        return Err(anyhow!(
                            "The source {} lists {:#?} for translation but it is not listed in identify",
                            &self.label,
                            val,
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    /// Remap the columns in a row to their canonical names.
    pub fn remap(&self, mapping: HashMap<String, String>) -> HashMap<String, String> {
        // Headers are compared without padding, so the keys are cleaned too.
        let mut mapping: HashMap<String, String> = mapping
            .into_iter()
            .map(|(k, v)| (clean_header(&k).to_owned(), v))
            .collect();

        // If this source does not define remappings we can just exit early.
        let Some(maps) = &self.translate else {
            return mapping;
        };

        // Remap each column name if the remapping is defined.
        for (key, value) in maps.pairs() {
            if let Some(k) = value {
                if let Some(val) = mapping.remove(clean_header(k)) {
                    mapping.insert(key.to_owned(), val);
                }
            }
        }

        mapping
    }
}

/// Specification of how to remap CSV columns from the input to the canonical names.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "PascalCase")]
struct RemapValuesCsv {
    /// The Date column.
    date: Option<String>,
    /// The Description column.
    description: Option<String>,
    /// The column holding the bank's own operation code.
    code: Option<String>,
    /// The Amount column, signed.
    amount: Option<String>,
    /// The Balance column.
    balance: Option<String>,
    /// The column holding outgoing amounts when debits and credits are split.
    debit: Option<String>,
    /// The column holding incoming amounts when debits and credits are split.
    credit: Option<String>,
}

impl RemapValuesCsv {
    /// Pair up each field with the canonical key it maps to.
    fn pairs(&self) -> [(&'static str, &Option<String>); 7] {
        [
            ("Date", &self.date),
            ("Description", &self.description),
            ("Code", &self.code),
            ("Amount", &self.amount),
            ("Balance", &self.balance),
            ("Debit", &self.debit),
            ("Credit", &self.credit),
        ]
    }
}
