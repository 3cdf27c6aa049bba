// ethos credit - apply credits against a scored report, list the ledger

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Subcommand;
use fs2::FileExt;
use serde::Deserialize;

use ethos_impact::credit::{parse_jsonl, to_jsonl_line, validate_credit};
use ethos_impact::model::{AggregateResult, CreditApplication, CreditLedgerEntry};
use ethos_impact::CreditLedger;

use crate::exit_codes::EXIT_PARSE;
use crate::settings::Settings;
use crate::CliError;

#[derive(Subcommand)]
pub enum CreditCommands {
    /// Apply a credit against the societal debt of a scored report
    #[command(after_help = "\
The report is the JSON written by `ethos score --output` (or `--json`).
Credits accumulate per scope: each one is taken off whatever the earlier
credits in that scope left outstanding. The report itself is never changed.

Examples:
  ethos credit apply --report report.json --amount 25
  ethos credit apply -r report.json --amount 40 --scope alice --json")]
    Apply {
        /// Scored report (full report or bare aggregate JSON)
        #[arg(long, short = 'r')]
        report: PathBuf,

        /// Credit amount, must be positive
        #[arg(long, allow_negative_numbers = true)]
        amount: f64,

        /// Ledger scope (user or account)
        #[arg(long, env = "ETHOS_SCOPE")]
        scope: Option<String>,

        /// Ledger file (JSON lines)
        #[arg(long, env = "ETHOS_LEDGER")]
        ledger: Option<PathBuf>,

        /// Output the application as JSON
        #[arg(long)]
        json: bool,
    },

    /// List credits recorded for a scope
    #[command(after_help = "\
Examples:
  ethos credit history
  ethos credit history --scope alice --json")]
    History {
        /// Ledger scope (user or account)
        #[arg(long, env = "ETHOS_SCOPE")]
        scope: Option<String>,

        /// Ledger file (JSON lines)
        #[arg(long, env = "ETHOS_LEDGER")]
        ledger: Option<PathBuf>,

        /// Output entries as a JSON array
        #[arg(long)]
        json: bool,
    },
}

pub fn cmd_credit(command: CreditCommands) -> Result<(), CliError> {
    let settings = Settings::load();
    match command {
        CreditCommands::Apply { report, amount, scope, ledger, json } => {
            let scope = resolve_scope(scope, &settings)?;
            let ledger = ledger.unwrap_or_else(|| settings.ledger_path());
            cmd_apply(&report, amount, &scope, &ledger, json)
        }
        CreditCommands::History { scope, ledger, json } => {
            let scope = resolve_scope(scope, &settings)?;
            let ledger = ledger.unwrap_or_else(|| settings.ledger_path());
            cmd_history(&scope, &ledger, json)
        }
    }
}

fn resolve_scope(flag: Option<String>, settings: &Settings) -> Result<String, CliError> {
    let scope = flag.unwrap_or_else(|| settings.scope().to_string());
    if scope.trim().is_empty() {
        return Err(CliError::args("scope must not be empty"));
    }
    Ok(scope)
}

// ============================================================================
// apply
// ============================================================================

/// A report file is either a full `ImpactReport` or just its aggregate.
#[derive(Deserialize)]
#[serde(untagged)]
enum ReportFile {
    Full { aggregate: AggregateResult },
    Bare(AggregateResult),
}

impl ReportFile {
    fn into_aggregate(self) -> AggregateResult {
        match self {
            ReportFile::Full { aggregate } | ReportFile::Bare(aggregate) => aggregate,
        }
    }
}

fn cmd_apply(report: &Path, amount: f64, scope: &str, ledger_path: &Path, json: bool) -> Result<(), CliError> {
    let text = fs::read_to_string(report)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", report.display())))?;
    let aggregate = serde_json::from_str::<ReportFile>(&text)
        .map_err(|e| CliError {
            code: EXIT_PARSE,
            message: format!("{} is not a scored report: {e}", report.display()),
            hint: Some("produce one with `ethos score ... --output report.json`".to_string()),
        })?
        .into_aggregate();

    let application = apply_to_ledger_file(ledger_path, scope, &aggregate, amount)?;
    log::info!(
        "credit #{} for scope '{}' appended to {}",
        application.ledger_entry.seq,
        scope,
        ledger_path.display(),
    );

    if json {
        let text = serde_json::to_string_pretty(&application)
            .map_err(|e| CliError::internal(format!("cannot serialize credit: {e}")))?;
        println!("{text}");
    } else {
        eprintln!(
            "credited {:.2} to '{}': societal debt {:.2} -> {:.2}",
            amount,
            scope,
            application.new_total_societal_debt + amount,
            application.new_total_societal_debt,
        );
    }
    Ok(())
}

/// Replay the ledger file, apply one credit and append its entry, all under
/// an exclusive lock so concurrent `ethos credit apply` runs never compute
/// from the same history.
fn apply_to_ledger_file(
    path: &Path,
    scope: &str,
    aggregate: &AggregateResult,
    amount: f64,
) -> Result<CreditApplication, CliError> {
    // Reject before the ledger file is created or locked.
    validate_credit(amount).map_err(CliError::engine)?;

    let mut locked = LockedLedger::open(path)?;
    let ledger = locked.load()?;
    let application = ledger.apply(scope, aggregate, amount).map_err(CliError::engine)?;
    locked.append(&application.ledger_entry)?;
    Ok(application)
}

/// Read-only view of the ledger file for `history`. A missing file is empty.
fn load_ledger(path: &Path) -> Result<CreditLedger, CliError> {
    if !path.exists() {
        return Ok(CreditLedger::new());
    }
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
    parse_ledger(path, &text)
}

fn parse_ledger(path: &Path, text: &str) -> Result<CreditLedger, CliError> {
    let entries = parse_jsonl(text).map_err(|e| {
        CliError::engine(e).with_hint(format!("ledger file: {}", path.display()))
    })?;
    Ok(CreditLedger::from_entries(entries))
}

const LOCK_RETRIES: usize = 50;
const LOCK_RETRY_SLEEP: Duration = Duration::from_millis(100);

/// Ledger file held under an exclusive advisory lock until dropped.
struct LockedLedger {
    path: PathBuf,
    file: File,
}

impl LockedLedger {
    fn open(path: &Path) -> Result<Self, CliError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| CliError::io(format!("cannot create {}: {e}", parent.display())))?;
        }
        let file = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| CliError::io(format!("cannot open {}: {e}", path.display())))?;

        for _ in 0..LOCK_RETRIES {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => {
                    return Ok(Self {
                        path: path.to_path_buf(),
                        file,
                    })
                }
                Err(_) => std::thread::sleep(LOCK_RETRY_SLEEP),
            }
        }
        Err(CliError::io(format!("could not acquire exclusive lock on {}", path.display()))
            .with_hint("another `ethos credit apply` is still writing this ledger"))
    }

    fn load(&mut self) -> Result<CreditLedger, CliError> {
        let mut text = String::new();
        self.file
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.file.read_to_string(&mut text))
            .map_err(|e| CliError::io(format!("cannot read {}: {e}", self.path.display())))?;
        parse_ledger(&self.path, &text)
    }

    fn append(&mut self, entry: &CreditLedgerEntry) -> Result<(), CliError> {
        let line = to_jsonl_line(entry).map_err(CliError::engine)?;
        self.file
            .write_all(line.as_bytes())
            .and_then(|_| self.file.flush())
            .map_err(|e| CliError::io(format!("cannot write {}: {e}", self.path.display())))
    }
}

impl Drop for LockedLedger {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

// ============================================================================
// history
// ============================================================================

fn cmd_history(scope: &str, ledger_path: &Path, json: bool) -> Result<(), CliError> {
    let entries = load_ledger(ledger_path)?.entries_for(scope);

    if json {
        let text = serde_json::to_string_pretty(&entries)
            .map_err(|e| CliError::internal(format!("cannot serialize ledger: {e}")))?;
        println!("{text}");
        return Ok(());
    }

    if entries.is_empty() {
        eprintln!("no credits recorded for scope '{scope}'");
        return Ok(());
    }
    println!("{:>4}  {:<25}  {:>12}  {:>14}", "seq", "timestamp", "applied", "resulting debt");
    for e in &entries {
        println!(
            "{:>4}  {:<25}  {:>12.2}  {:>14.2}",
            e.seq,
            e.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            e.applied_amount,
            e.resulting_debt,
        );
    }
    Ok(())
}
