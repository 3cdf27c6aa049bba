// Ethos CLI - score bank transactions for societal impact, apply credits

mod credit;
mod exit_codes;
mod score;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_codes::{exit_code_for, EXIT_ERROR, EXIT_INVALID_CONFIG, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "ethos")]
#[command(about = "Turn classified bank transactions into societal debt and credit figures")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug). ETHOS_LOG overrides.
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score transactions against classifier answers and aggregate the result
    #[command(after_help = "\
Transactions are read as CSV (id,date,merchant_name,amount) unless the file \
ends in .json. Data-quality findings are logged as warnings and never fail the run.

Examples:
  ethos score january.csv --classifications january.classified.json
  ethos score january.csv -c january.classified.json --json | jq .aggregate
  ethos score january.csv -c january.classified.json --config household.impact.toml -o report.json")]
    Score {
        /// Transaction feed (CSV or JSON)
        transactions: PathBuf,

        /// Classifier answers (JSON array)
        #[arg(long, short = 'c')]
        classifications: PathBuf,

        /// Engine config (.impact.toml)
        #[arg(long, env = "ETHOS_CONFIG")]
        config: Option<PathBuf>,

        /// Output the full report as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Write the full report as JSON to a file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Apply and inspect credits against a scored report
    Credit {
        #[command(subcommand)]
        command: credit::CreditCommands,
    },

    /// Engine config utilities
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Validate an .impact.toml config without scoring anything
    #[command(after_help = "\
Examples:
  ethos config validate household.impact.toml")]
    Validate {
        /// Path to the config file
        config: PathBuf,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  ethos-impact ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  ethos-impact ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("ETHOS_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    // A second init (tests, embedding) is harmless; keep the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Score {
            transactions,
            classifications,
            config,
            json,
            output,
        } => score::cmd_score(transactions, classifications, config, json, output),
        Commands::Credit { command } => credit::cmd_credit(command),
        Commands::Config { command } => match command {
            ConfigCommands::Validate { config } => cmd_config_validate(config),
        },
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Wrap an engine error with its registered exit code.
    pub fn engine(err: ethos_impact::ImpactError) -> Self {
        let hint = match &err {
            ethos_impact::ImpactError::InvalidCredit { .. } => {
                Some("credits must be a positive amount, e.g. --amount 25".to_string())
            }
            ethos_impact::ImpactError::MissingColumn { .. } => {
                Some("expected CSV columns: id,date,merchant_name,amount".to_string())
            }
            _ => None,
        };
        Self { code: exit_code_for(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// config validate
// ============================================================================

fn cmd_config_validate(path: PathBuf) -> Result<(), CliError> {
    let text = std::fs::read_to_string(&path)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
    let config = ethos_impact::ImpactConfig::from_toml(&text).map_err(|e| CliError {
        code: EXIT_INVALID_CONFIG,
        message: e.to_string(),
        hint: None,
    })?;
    eprintln!(
        "config '{}' is valid: {} catalog practice(s), duplicate labels = {}",
        config.name,
        config.practices.len(),
        config.scoring.duplicate_labels,
    );
    Ok(())
}
