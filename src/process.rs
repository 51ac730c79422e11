use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Result};
use tracing::{info, warn};

use crate::categorize::RuleSet;
use crate::emit::OutputFormat;
use crate::file_io::ensure_storage_path;
use crate::rules::{MappingRulesCsv, RuleFileData};
use crate::NormalizedRow;

/// Normalization and categorization of the rows of one statement source.
pub struct StatementProcessor<'a> {
    /// The normalized rows, in the order they were read.
    rows: Vec<NormalizedRow>,
    /// The mapping rules for this source.
    mapping: &'a MappingRulesCsv,
    /// The rules for categorizing rows.
    rules: &'a RuleSet,
}

impl<'a> StatementProcessor<'a> {
    /// Create a new instance.
    pub fn new(mapping: &'a MappingRulesCsv, rules: &'a RuleSet) -> StatementProcessor<'a> {
        StatementProcessor {
            rows: vec![],
            mapping,
            rules,
        }
    }

    /// Process a single raw row and store the result.
    ///
    /// Cells that cannot be read are logged and replaced by best-effort
    /// values; a bad row never stops the rest of the statement.
    pub fn process(&mut self, data: HashMap<String, String>) {
        let row = NormalizedRow::from_raw_data(
            &self.mapping.remap(data),
            self.mapping.negate,
            &self.mapping.date_fmt,
            &self.mapping.label,
            self.rules,
        );

        if row.degraded.any() {
            warn!(
                source = %row.source,
                description = %row.description,
                date = row.degraded.date,
                amount = row.degraded.amount,
                balance = row.degraded.balance,
                "Row kept with best-effort values"
            );
        }

        self.rows.push(row);
    }

    /// The source label these rows belong to.
    pub fn label(&self) -> &str {
        &self.mapping.label
    }

    pub fn rows(&self) -> &[NormalizedRow] {
        &self.rows
    }

    /// Render the rows into a document of the given format.
    pub fn render(&self, format: OutputFormat) -> Result<Vec<u8>> {
        format.render(&self.rows)
    }
}

/// Given a list of CSV statements, normalize and categorize each row and
/// return the results grouped by statement source.
pub fn process_csv_files<'a>(
    paths: &[impl AsRef<Path>],
    rules: &'a RuleFileData,
    rule_set: &'a RuleSet,
) -> Result<HashMap<String, StatementProcessor<'a>>> {
    let mut processors: HashMap<String, StatementProcessor<'a>> = HashMap::new();

    // Iterate over each CSV file.
    for path in paths {
        // Create the reader for this CSV file. Ragged rows are accepted,
        // missing cells simply degrade.
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path.as_ref())?;

        // Banks do not always export UTF-8, so headers and cells are read
        // leniently rather than failing on the first odd byte.
        let headers: Vec<String> = reader
            .byte_headers()?
            .iter()
            .map(|h| String::from_utf8_lossy(h).into_owned())
            .collect();

        // For this CSV, obtain the mapping rules for the source it represents.
        let mapping = rules
            .get_csv_mapping_rules(&csv::StringRecord::from(headers.clone()))
            .ok_or_else(|| {
                anyhow!(
                    "No rules are defined for the statement source corresponding to file {:#?}",
                    path.as_ref()
                )
            })?;

        // Obtain the processor for this source, creating it if needed.
        let processor = processors
            .entry(mapping.label.to_owned())
            .or_insert_with(|| StatementProcessor::new(mapping, rule_set));

        // For each row in this CSV, process and store the row.
        let before = processor.rows().len();
        for record in reader.byte_records() {
            let record = record?;
            let data = headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.to_owned(), String::from_utf8_lossy(v).into_owned()))
                .collect();
            processor.process(data);
        }

        info!(
            file = %path.as_ref().display(),
            source = %mapping.label,
            rows = processor.rows().len() - before,
            "Read statement"
        );
    }

    // Return the processors for the given CSV files.
    Ok(processors)
}

/// Write every source's rows to its own document in the storage location.
pub fn write_statements_to_file(
    now: impl AsRef<str>,
    storage: impl AsRef<Path>,
    all_statements: &HashMap<String, StatementProcessor>,
    format: OutputFormat,
) -> Result<()> {
    let base = ensure_storage_path(storage, now, true)?;
    for (label, statements) in all_statements.iter() {
        let location = base.join(format!("{label}.{}", format.extension()));
        fs::write(&location, statements.render(format)?)?;
        info!(
            file = %location.display(),
            rows = statements.rows().len(),
            "Wrote statement"
        );
    }
    Ok(())
}
