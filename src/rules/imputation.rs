use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::rules::eqregex::{deserialize_regex, EqRegex};

/// A single categorization rule: descriptions matching the pattern get
/// the label and, when given, the accounting code.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Hash)]
#[serde(deny_unknown_fields, rename_all = "PascalCase")]
pub struct CategorizationRule {
    /// The pattern tested against the transaction description, ignoring case.
    #[serde(deserialize_with = "deserialize_regex")]
    pattern: EqRegex,
    /// The imputación given to matching transactions.
    label: String,
    /// The PUC account code given to matching transactions.
    account: Option<String>,
}

impl CategorizationRule {
    /// Build a rule from its parts, compiling the pattern case-insensitively.
    pub fn new(
        pattern: &str,
        label: impl Into<String>,
        account: Option<&str>,
    ) -> Result<Self> {
        let pattern = EqRegex::case_insensitive(pattern)
            .map_err(|e| anyhow!("The pattern {pattern:#?} is not a valid regex: {e}"))?;
        let rule = CategorizationRule {
            pattern,
            label: label.into(),
            account: account.map(str::to_owned),
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Determine if the given description matches this rule.
    pub fn matches(&self, description: &str) -> bool {
        self.pattern.is_match(description)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    /// Ensure the given rule is semantically correct.
    pub fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(anyhow!(
                "The rule with pattern {:#?} must give a label.",
                self.pattern.as_str()
            ));
        }
        if self.account.as_ref().is_some_and(|a| a.trim().is_empty()) {
            return Err(anyhow!(
                "The rule {:#?} gives an empty account code.",
                self.label
            ));
        }
        Ok(())
    }
}
