mod config;
mod logging;
mod output;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use mockweave_core::SerializerOptions;
use mockweave_generate::{
    BuiltinPlugins, GenerationEngine, GenerationError, Progress, ProgressThrottle,
    throttled_progress,
};
use mockweave_schema::{document_json_schema_value, validate_document};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use config::load_config;
use logging::init_logging;
use output::write_bytes_atomic;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write output: {0}")]
    Write(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("logging setup failed: {0}")]
    Logging(String),
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("document is invalid: {0} error(s)")]
    InvalidDocument(usize),
}

#[derive(Parser, Debug)]
#[command(name = "mockweave", version, about = "Schema-driven synthetic data generator")]
struct Cli {
    /// Config file (defaults to ./mockweave.toml when present).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate data from a schema document.
    Generate(GenerateArgs),
    /// Validate a schema document without generating.
    Validate(ValidateArgs),
    /// Print the JSON Schema describing schema documents.
    Schema(SchemaArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Schema document (JSON).
    #[arg(value_name = "SCHEMA")]
    schema: PathBuf,
    /// Output file; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,
    /// Pretty-print JSON output.
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Schema document (JSON).
    #[arg(value_name = "SCHEMA")]
    schema: PathBuf,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Output file; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.logging)?;

    match cli.command {
        Command::Generate(args) => run_generate(args, &config).await,
        Command::Validate(args) => run_validate(args),
        Command::Schema(args) => run_schema(args),
    }
}

async fn run_generate(args: GenerateArgs, config: &config::CliConfig) -> Result<(), CliError> {
    let document = read_document(&args.schema)?;
    let engine = GenerationEngine::new(config.generate_options(args.seed));
    let serializer =
        (args.pretty || config.generate.pretty).then_some(SerializerOptions::Json { pretty: true });

    info!(schema = %args.schema.display(), "generating");
    let progress = throttled_progress(
        ProgressThrottle::new(PROGRESS_INTERVAL),
        |progress: Progress| {
            info!(current = progress.current, total = progress.total, "generation progress");
        },
    );
    let rendered = engine
        .render(
            &document,
            Vec::new(),
            &BuiltinPlugins,
            Some(progress),
            serializer,
        )
        .await?;

    emit(args.out.as_deref(), &rendered.text)?;
    info!(
        run_id = %rendered.report.run_id,
        seed = rendered.report.seed,
        duration_ms = rendered.report.duration_ms,
        warnings = rendered.report.warnings.len(),
        "output written"
    );
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), CliError> {
    let document = read_document(&args.schema)?;
    let mut stdout = io::stdout().lock();

    match validate_document(&document) {
        Ok(validated) => {
            for issue in &validated.warnings {
                writeln!(stdout, "{issue}")?;
            }
            writeln!(stdout, "{}: valid", args.schema.display())?;
            Ok(())
        }
        Err(report) => {
            for issue in report.issues() {
                writeln!(stdout, "{issue}")?;
            }
            Err(CliError::InvalidDocument(report.errors.len()))
        }
    }
}

fn run_schema(args: SchemaArgs) -> Result<(), CliError> {
    let schema = document_json_schema_value();
    let text = serde_json::to_string_pretty(&schema)?;
    emit(args.out.as_deref(), &text)
}

fn read_document(path: &Path) -> Result<Value, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

fn emit(out: Option<&Path>, text: &str) -> Result<(), CliError> {
    match out {
        Some(path) => write_bytes_atomic(path, text.as_bytes())?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            if !text.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            stdout.flush()?;
        }
    }
    Ok(())
}
