//! Quantity schema CLI
//!
//! Main entry point for the `lschema` command.

use clap::{Parser, Subcommand};
use miette::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use libertem_schema::Simple4DSTEMParams;
use libertem_schema::schema;
use libertem_schema::units::{UnitRegistry, UnitRegistryBuilder, convert_value};

#[derive(Parser)]
#[command(name = "lschema")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Validate and canonicalize dimension-checked parameter documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Extra unit definitions (TOML or JSON)
    #[arg(long, value_name = "FILE", global = true)]
    units: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a parameter document and print it in canonical units
    Validate {
        /// Input file (.json or .toml)
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Print the JSON schema of the parameter record
    Schema,

    /// Convert a value between two units
    Convert {
        value: f64,
        from: String,
        to: String,
    },

    /// Check a document against the JSON schema only
    Check {
        /// Input file (.json or .toml)
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    let registry = load_registry(cli.units.as_deref())?;

    match cli.command {
        Commands::Validate { input } => validate(registry, &input),
        Commands::Schema => print_json(&Simple4DSTEMParams::json_schema()),
        Commands::Convert { value, from, to } => {
            let converted = convert_value(registry, value, &from, &to)?;
            println!("{} {}", converted, to);
            Ok(())
        }
        Commands::Check { input } => check(&input),
    }
}

fn load_registry(units: Option<&Path>) -> Result<&'static UnitRegistry> {
    if let Some(path) = units {
        let registry = UnitRegistryBuilder::standard()
            .extend_from_file(path)?
            .build();
        tracing::info!("Loaded {} units from {:?}", registry.len(), path);
        UnitRegistry::install_global(registry)
            .map_err(|_| miette::miette!("Unit registry already initialized"))?;
    }
    Ok(UnitRegistry::global())
}

fn load_document(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| miette::miette!("Failed to read input file: {}", e))?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => {
            toml::from_str(&content).map_err(|e| miette::miette!("Failed to parse TOML: {}", e))
        }
        _ => serde_json::from_str(&content)
            .map_err(|e| miette::miette!("Failed to parse JSON: {}", e)),
    }
}

fn print_json(value: &Value) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| miette::miette!("Failed to serialize output: {}", e))?;
    println!("{}", json);
    Ok(())
}

fn validate(registry: &UnitRegistry, input: &Path) -> Result<()> {
    tracing::info!("Validating {:?}", input);
    let document = load_document(input)?;
    let params = Simple4DSTEMParams::from_document(registry, &document)?;
    print_json(&params.to_document()?)
}

fn check(input: &Path) -> Result<()> {
    let document = load_document(input)?;
    tracing::warn!(
        "Schema checks are structural only; run `validate` for dimension and unit checks"
    );

    let violations = schema::violations(&Simple4DSTEMParams::json_schema(), &document);
    if violations.is_empty() {
        println!("{}: conforms to schema", input.display());
        return Ok(());
    }
    for violation in &violations {
        eprintln!("{}", violation);
    }
    Err(miette::miette!(
        "{} schema violation(s) in {}",
        violations.len(),
        input.display()
    ))
}
