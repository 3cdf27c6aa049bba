// ethos score - load a feed and classifier answers, run the engine

use std::fs;
use std::path::{Path, PathBuf};

use ethos_impact::engine::run_static;
use ethos_impact::feed::{load_transactions_csv, load_transactions_json};
use ethos_impact::model::ImpactReport;
use ethos_impact::{ImpactConfig, StaticGateway};

use crate::exit_codes::EXIT_INVALID_CONFIG;
use crate::CliError;

pub fn cmd_score(
    transactions: PathBuf,
    classifications: PathBuf,
    config: Option<PathBuf>,
    json: bool,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let (config, config_dir) = match &config {
        Some(path) => (load_config(path)?, path.parent().map(Path::to_path_buf)),
        None => (ImpactConfig::default(), None),
    };

    let feed = read_text(&transactions)?;
    let txns = if is_json(&transactions) {
        load_transactions_json(&feed)
    } else {
        load_transactions_csv(&feed)
    }
    .map_err(|e| CliError::engine(e).with_hint(format!("while reading {}", transactions.display())))?;

    let answers = read_text(&classifications)?;
    let gateway = StaticGateway::from_json(&answers).map_err(|e| {
        CliError::engine(e).with_hint("expected a JSON array of classification responses")
    })?;

    log::info!(
        "scoring {} transaction(s) with {} classification(s), config '{}'",
        txns.len(),
        gateway.len(),
        config.name,
    );
    let report = run_static(&config, &txns, &gateway).map_err(CliError::engine)?;

    // --output wins over [output] json in the config, which is relative to the config file.
    let output = output.or_else(|| {
        config.output.json.as_ref().map(|p| match &config_dir {
            Some(dir) => dir.join(p),
            None => PathBuf::from(p),
        })
    });
    if let Some(path) = &output {
        write_report(path, &report)?;
        log::info!("report written to {}", path.display());
    }

    if json {
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::internal(format!("cannot serialize report: {e}")))?;
        println!("{text}");
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<ImpactConfig, CliError> {
    let text = read_text(path)?;
    ImpactConfig::from_toml(&text).map_err(|e| CliError {
        code: EXIT_INVALID_CONFIG,
        message: format!("{}: {e}", path.display()),
        hint: Some(format!("run `ethos config validate {}`", path.display())),
    })
}

fn read_text(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

fn write_report(path: &Path, report: &ImpactReport) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| CliError::io(format!("cannot create {}: {e}", parent.display())))?;
    }
    let text = serde_json::to_string_pretty(report)
        .map_err(|e| CliError::internal(format!("cannot serialize report: {e}")))?;
    fs::write(path, text).map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))
}

fn print_summary(report: &ImpactReport) {
    let agg = &report.aggregate;
    eprintln!(
        "{} transaction(s), {:.2} spent, societal debt {:.2} ({:.2}%)",
        agg.transaction_count, agg.total_spent, agg.total_societal_debt, agg.debt_percentage,
    );
    eprintln!(
        "gross harm {:.2}, positive impact available for credit {:.2}",
        agg.gross_harm, agg.available_credit,
    );
    for group in &agg.per_category {
        eprintln!("  {:<24} {:>10.2}", group.category, group.total_impact);
        for p in &group.practices {
            eprintln!("    {:<22} {:>10.2}", p.practice, p.amount);
        }
    }
    let findings = report.quality.warnings.len();
    if findings > 0 {
        eprintln!("{findings} data-quality finding(s); rerun with --json for details");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_extension_is_case_insensitive() {
        assert!(is_json(Path::new("feed.JSON")));
        assert!(is_json(Path::new("dir/feed.json")));
        assert!(!is_json(Path::new("feed.csv")));
        assert!(!is_json(Path::new("feed")));
    }
}
