use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use config_finder::ConfigDirs;
use indoc::indoc;
use tracing_subscriber::EnvFilter;

use extracto::{
    normalize_path, process_csv_files, store_raw_statements, write_statements_to_file,
    OutputFormat, RuleFileData, DATE_FORMAT,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Normalize and categorize bank statements into spreadsheets")]
    Run {
        files: Vec<String>,
        /// Write CSV instead of xlsx.
        #[arg(long)]
        csv: bool,
    },
    #[command(about = "Show the imputación a description would receive")]
    Classify { description: String },
    #[command(about = "Show the location of the rules.toml file")]
    ShowConfig {},
    #[command(about = "Create the rules.toml file")]
    CreateConfig {},
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::CreateConfig {} => {
            let rule_file = get_rule_file()?;
            if rule_file.is_file() {
                return Err(anyhow!("The rule file {:#?} already exists.", rule_file));
            }
            let parent = rule_file
                .parent()
                .ok_or(anyhow!("Cannot identify parent of {:#?}", rule_file))?;
            if !parent.is_dir() {
                fs::create_dir_all(parent)?;
            }
            fs::write(
                &rule_file,
                indoc! {
                    r#"
                # Label for movements no rule recognizes.
                fallback = "Por clasificar"

                # Categorization rules, tried in order; the first match wins.
                # Leave them out to use the built-in Colombian rules.
                # [[rules]]
                # Pattern = "N[OÓ]MINA"
                # Label = "Nómina"
                # Account = "510506"

                [[mappings.csv]]
                label = "bancolombia"
                identify = ["FECHA", "DESCRIPCIÓN", "SUCURSAL", "DCTO.", "VALOR", "SALDO"]
                translate = {Date = "FECHA", Description = "DESCRIPCIÓN", Code = "DCTO.", Amount = "VALOR", Balance = "SALDO"}
                date_fmt = "%Y/%m/%d"

                [paths]
                storage = "/path/to/storage/directory"
                "#
                },
            )?;
            println!("Created {:#?}.\n", rule_file);
            println!("Edit this file to meet your needs.");
        }
        Commands::ShowConfig {} => {
            println!("{}", get_rule_file()?.display());
        }
        Commands::Classify { description } => {
            let rules = load_rules()?;
            let categorization = rules.rule_set()?.classify(&description);
            match categorization.account {
                Some(account) => println!("{} ({account})", categorization.label),
                None => println!("{}", categorization.label),
            }
        }
        Commands::Run { files, csv } => {
            let rules = load_rules()?;
            let rule_set = rules.rule_set()?;
            let format = if csv {
                OutputFormat::Csv
            } else {
                OutputFormat::Xlsx
            };

            // Normalize and categorize the statements.
            let results = process_csv_files(&files, &rules, &rule_set)?;

            // Write the documents for each source.
            let now = chrono::offset::Local::now()
                .naive_local()
                .date()
                .format(DATE_FORMAT)
                .to_string();
            write_statements_to_file(&now, rules.storage(), &results, format)?;

            // Save the raw statements in the storage location.
            store_raw_statements(rules.storage(), &files, &now)?;
        }
    }

    Ok(())
}

/// Read and validate the rules.toml file.
fn load_rules() -> Result<RuleFileData> {
    let rule_file = get_rule_file()?;
    if !rule_file.is_file() {
        return Err(anyhow!(
            "The file {:#?} does not exist - create it with 'extracto create-config'.",
            rule_file
        ));
    }
    let rule_data = fs::read_to_string(&rule_file)?;
    RuleFileData::new(&rule_data)
}

/// Return the path to the rules.toml file.
fn get_rule_file() -> Result<PathBuf> {
    let mut conf_dirs = ConfigDirs::empty();
    let mut conf_files = conf_dirs
        .add_platform_config_dir()
        .search("extracto", "rules", "toml");
    normalize_path(
        conf_files
            .next()
            .ok_or(anyhow!("Cannot identify the path to the rules.toml file"))?
            .path(),
    )
}
