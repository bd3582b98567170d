//! `normdb`: load a schema file, normalize it and print the result.

mod report;

use clap::{Parser, ValueEnum};
use normdb_core::{catalog::DuplicatePolicy, config::NormalizeConfig, normal_form::NormalForm};
use normdb_schema::SchemaError;
use report::Report;
use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};
use thiserror::Error as ThisError;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "normdb=info";

///
/// CliError
///

#[derive(Debug, ThisError)]
enum CliError {
    #[error("failed to read config '{}': {source}", .path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config '{}': {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Normalize(#[from] normdb_core::Error),

    #[error("failed to render report: {0}")]
    Render(#[source] serde_json::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

///
/// FormArg
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum FormArg {
    #[value(name = "2nf")]
    Second,
    #[value(name = "3nf")]
    Third,
    #[value(name = "bcnf")]
    Bcnf,
}

impl From<FormArg> for NormalForm {
    fn from(form: FormArg) -> Self {
        match form {
            FormArg::Second => Self::Second,
            FormArg::Third => Self::Third,
            FormArg::Bcnf => Self::Bcnf,
        }
    }
}

///
/// OutputFormat
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "normdb",
    version,
    about = "Normalize a relational schema to 2NF, 3NF or BCNF"
)]
struct Cli {
    /// Schema file: `.json` documents or the line-oriented text format.
    #[arg(value_name = "SCHEMA")]
    schema: PathBuf,

    /// Target normal form (defaults to the config file, then 2nf).
    #[arg(long, value_enum, env = "NORMDB_FORM")]
    form: Option<FormArg>,

    /// Maximum concurrent normalization workers.
    #[arg(long, value_name = "N", env = "NORMDB_MAX_WORKERS")]
    workers: Option<usize>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Fail when an attribute name is declared twice.
    #[arg(long)]
    reject_duplicates: bool,

    /// JSON file holding a serialized `NormalizeConfig`; flags win over it.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Cli {
    // Config file first, explicit flags on top.
    fn resolve_config(&self) -> Result<NormalizeConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => NormalizeConfig::default(),
        };

        if let Some(form) = self.form {
            config.target = form.into();
        }
        if let Some(workers) = self.workers {
            config.max_workers = workers;
        }
        if self.reject_duplicates {
            config.duplicate_attributes = DuplicatePolicy::Reject;
        }

        Ok(config)
    }
}

fn read_config(path: &Path) -> Result<NormalizeConfig, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::ConfigIo {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&text).map_err(|source| CliError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })
}

fn run(cli: &Cli) -> Result<String, CliError> {
    let config = cli.resolve_config()?;
    let mut db = normdb_schema::open(&cli.schema)?.load(config)?;

    info!(
        database = %db.name(),
        target = %config.target,
        workers = config.effective_workers(),
        "normalizing schema"
    );
    db.normalize_configured()?;

    let report = Report::from_database(&db);
    match cli.format {
        OutputFormat::Text => Ok(report.to_string()),
        OutputFormat::Json => serde_json::to_string_pretty(&report).map_err(CliError::Render),
    }
}

fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "normalization failed");
            eprintln!("normdb: {err}");
            ExitCode::FAILURE
        }
    }
}
