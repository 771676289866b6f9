mod schema_source;

use std::fs;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use quarto_source_map::MappedString;
use quarto_yaml_intelligence::{FileType, LintDiagnostic, YamlIntelligenceContext, get_lint};
use quarto_yaml_validation::ValidatorOptions;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Validate a YAML document against a schema
#[derive(Parser, Debug)]
#[command(name = "validate-yaml", version)]
#[command(about = "Validate YAML and JSON documents against schemas", long_about = None)]
struct Args {
    /// Path to the document to validate (`.json` files are parsed as JSON)
    #[arg(long, value_name = "FILE")]
    input: PathBuf,

    /// Path to a schema, or to a bundle with a `definitions` list
    #[arg(long, value_name = "FILE")]
    schema: PathBuf,

    /// Which schema of a bundle to validate against (default: the last one)
    #[arg(long, value_name = "ID")]
    schema_id: Option<String>,

    /// Print diagnostics as JSON on stdout
    #[arg(long, conflicts_with = "report")]
    json: bool,

    /// Render diagnostics as annotated source reports
    #[arg(long)]
    report: bool,

    /// Maximum "did you mean" suggestions per diagnostic
    #[arg(long, value_name = "N", default_value_t = 3)]
    max_suggestions: usize,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "validate_yaml=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(Args::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Returns whether the document is valid.
fn run(args: Args) -> Result<bool> {
    let schema = schema_source::load(&args.schema, args.schema_id.as_deref())?;

    let input = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read input file: {}", args.input.display()))?;
    let input_name = args.input.display().to_string();

    let mut ctx = YamlIntelligenceContext::new(input.as_str(), FileType::Yaml).with_path(input_name.as_str());
    ctx.schema_name = Some(schema.id.clone());
    let options = ValidatorOptions {
        max_suggestions: args.max_suggestions,
    };
    let diagnostics = get_lint(&ctx, &schema.model, &options)
        .with_context(|| format!("Failed to validate {}", input_name))?;
    info!(input = %input_name, schema = %schema.id, problems = diagnostics.len(), "validated");

    if args.json {
        let errors: Vec<_> = diagnostics.iter().map(|d| &d.error).collect();
        println!("{}", serde_json::to_string_pretty(&errors)?);
    } else if diagnostics.is_empty() {
        println!("✓ {} is valid against '{}'", input_name, schema.id);
    } else {
        let document = MappedString::original(input.as_str(), Some(input_name.as_str()));
        print_diagnostics(&diagnostics, &document, args.report);
        eprintln!(
            "{} problem{} found in {}",
            diagnostics.len(),
            if diagnostics.len() == 1 { "" } else { "s" },
            input_name
        );
    }
    Ok(diagnostics.is_empty())
}

fn print_diagnostics(diagnostics: &[LintDiagnostic], document: &MappedString, report: bool) {
    let styled = std::io::stderr().is_terminal();
    for diagnostic in diagnostics {
        if report {
            eprintln!("{}", diagnostic.error.to_diagnostic().to_text(Some(document)));
        } else {
            eprintln!("{}", diagnostic.error.to_text(styled));
        }
    }
}
