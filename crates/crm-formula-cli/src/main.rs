//! CRM formula CLI - evaluate, validate and batch-test formulas

mod batch;
mod samples;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crm_formula::{
    display_value, evaluate_formula, extract_field_references, validate_formula, Record,
    ReturnType,
};
use samples::Samples;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "crm-formula")]
#[command(author, version, about = "Evaluate and test CRM computed-field formulas")]
struct Cli {
    /// Log evaluation details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a formula against a record and print the result as JSON
    #[command(alias = "eval")]
    Evaluate {
        /// Formula expression
        expression: String,

        /// Record as a JSON object
        #[arg(short, long, conflicts_with = "context_file")]
        context: Option<String>,

        /// File containing the record as a JSON object
        #[arg(long)]
        context_file: Option<PathBuf>,

        /// currency, number, boolean, text or date (unknown names mean number)
        #[arg(short, long, default_value = "number", value_parser = parse_return_type)]
        return_type: ReturnType,

        /// Digits shown in the display string
        #[arg(short, long)]
        decimal_places: Option<u32>,
    },

    /// Check that a formula parses
    Validate {
        /// Formula expression
        expression: String,
    },

    /// List the fields a formula references
    Fields {
        /// Formula expression
        expression: String,
    },

    /// Evaluate stored formula definitions against sample records
    Test {
        /// JSON array of formula definitions
        #[arg(short, long)]
        definitions: PathBuf,

        /// Sample records: JSON object keyed by entity, or CSV (default: built-in samples)
        #[arg(short, long)]
        samples: Option<PathBuf>,
    },
}

fn parse_return_type(name: &str) -> Result<ReturnType, String> {
    Ok(ReturnType::lenient(name))
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Evaluate {
            expression,
            context,
            context_file,
            return_type,
            decimal_places,
        } => evaluate(
            &expression,
            context.as_deref(),
            context_file.as_deref(),
            return_type,
            decimal_places,
        ),
        Commands::Validate { expression } => validate(&expression),
        Commands::Fields { expression } => {
            let mut fields = extract_field_references(&expression);
            fields.sort();
            for field in fields {
                println!("{}", field);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Test {
            definitions,
            samples,
        } => test_definitions(&definitions, samples.as_deref()),
    }
}

fn evaluate(
    expression: &str,
    context: Option<&str>,
    context_file: Option<&Path>,
    return_type: ReturnType,
    decimal_places: Option<u32>,
) -> Result<ExitCode> {
    let record = load_record(context, context_file)?;
    let result = evaluate_formula(expression, &record, return_type);

    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("Failed to serialize result")?
    );
    println!("{}", display_value(&result, decimal_places));

    Ok(exit_code(result.is_ok()))
}

fn load_record(context: Option<&str>, context_file: Option<&Path>) -> Result<Record> {
    match (context, context_file) {
        (Some(json), _) => serde_json::from_str(json).context("Context must be a JSON object"),
        (None, Some(path)) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read '{}'", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("'{}' must contain a JSON object", path.display()))
        }
        (None, None) => Ok(Record::new()),
    }
}

fn validate(expression: &str) -> Result<ExitCode> {
    let result = validate_formula(expression);
    println!(
        "{}",
        serde_json::to_string_pretty(&result).context("Failed to serialize result")?
    );
    Ok(exit_code(result.valid))
}

fn test_definitions(definitions: &Path, samples: Option<&Path>) -> Result<ExitCode> {
    let definitions = batch::load_definitions(definitions)?;
    let samples = match samples {
        Some(path) => Samples::load(path)?,
        None => Samples::builtin(),
    };

    let report = batch::run(&definitions, &samples);
    println!("{}", report);
    Ok(exit_code(report.is_success()))
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
