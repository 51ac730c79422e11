mod eqregex;
mod imputation;
mod mapping;
mod paths;

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::categorize::{colombian_rules, RuleSet, FALLBACK_LABEL};
use crate::rules::paths::AuxillaryPaths;

pub use crate::rules::imputation::CategorizationRule;
pub use crate::rules::mapping::MappingRulesCsv;
pub use crate::rules::paths::normalize_path;

/// The aggregation of all rules found in the rules file.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleFileData {
    /// Label for transactions that no rule recognizes.
    fallback: Option<String>,
    /// Ordered categorization rules; the built-in ones are used when absent.
    rules: Option<Vec<CategorizationRule>>,
    /// Rules for how to identify and translate files for different statement sources.
    mappings: MappingTypes,
    /// Locations of paths used by the program.
    paths: AuxillaryPaths,
}

impl RuleFileData {
    // Create a new RuleFileData from raw string data.
    pub fn new(raw_data: &str) -> Result<Self> {
        let rules: RuleFileData = toml::from_str(raw_data)?;
        rules.validate()?;
        Ok(rules)
    }

    /// The directory where outputs and archived inputs are stored.
    pub fn storage(&self) -> &Path {
        &self.paths.storage
    }

    /// Build the categorization rules to hand to the pipeline.
    pub fn rule_set(&self) -> Result<RuleSet> {
        let fallback = self.fallback.as_deref().unwrap_or(FALLBACK_LABEL);
        let rules = self.rules.clone().unwrap_or_else(colombian_rules);
        RuleSet::with_fallback(rules, fallback)
    }

    /// Determine which statement source the given headers correlate to.
    pub fn get_csv_mapping_rules(&self, headers: &csv::StringRecord) -> Option<&MappingRulesCsv> {
        // Convert the headers object into a vector of strings so it can be compared.
        let hdrs: Vec<String> = headers.iter().map(|x| x.to_owned()).collect();

        // Identify the mapping rules that match the headers found.
        self.mappings
            .csv
            .iter()
            .find(|candidates| candidates.header_matches(&hdrs))
    }

    /// Ensure the read-in rules make logical sense.
    fn validate(&self) -> Result<()> {
        self.paths.validate()?;

        if self.fallback.as_ref().is_some_and(|f| f.trim().is_empty()) {
            return Err(anyhow!("The fallback label must not be empty."));
        }

        if let Some(rules) = &self.rules {
            for rule in rules {
                rule.validate()?;
            }
        }

        // Verify that each source label is unique.
        let mut labels: HashMap<&str, usize> = HashMap::new();
        for mapping in self.mappings.csv.iter() {
            mapping.validate()?;
            *labels.entry(mapping.label.as_str()).or_default() += 1;
        }
        if let Some((label, _)) = labels.iter().find(|(_, count)| **count > 1) {
            return Err(anyhow!(
                "The source label {label:#?} is given to more than one CSV mapping."
            ));
        }

        Ok(())
    }
}

/// Holds rules for different types of input formats.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct MappingTypes {
    /// Rules for the CSV format.
    csv: Vec<MappingRulesCsv>,
}
