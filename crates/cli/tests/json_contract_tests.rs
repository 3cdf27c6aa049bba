// Integration tests enforcing the --json stdout contract.
//
// stdout from --json commands must be exactly one JSON value. Logs and
// human summaries go to stderr.
//
// Run with: cargo test -p ethos-cli --test json_contract_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../impact/tests/fixtures")
}

fn fixture(name: &str) -> String {
    fixtures_dir().join(name).to_string_lossy().into_owned()
}

/// `ethos` with settings and environment isolated from the user's machine.
fn ethos(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ethos"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env("ETHOS_SETTINGS", home.join("settings.toml"));
    for var in ["ETHOS_LOG", "ETHOS_SCOPE", "ETHOS_LEDGER", "ETHOS_CONFIG"] {
        cmd.env_remove(var);
    }
    cmd
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "exit code: {:?}\nstderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Assert stdout is a single, parseable JSON value.
fn assert_single_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let trimmed = stdout.trim();
    assert!(!trimmed.is_empty(), "stdout should not be empty");
    serde_json::from_str(trimmed)
        .unwrap_or_else(|e| panic!("stdout must be valid JSON.\nParse error: {e}\nstdout:\n{trimmed}"))
}

fn score_household(home: &Path, extra: &[&str]) -> Output {
    let mut cmd = ethos(home);
    cmd.args([
        "score",
        &fixture("transactions.csv"),
        "--classifications",
        &fixture("classifications.json"),
        "--config",
        &fixture("household.impact.toml"),
    ]);
    cmd.args(extra);
    cmd.output().expect("ethos score")
}

// ===========================================================================
// ethos score --json
// ===========================================================================

#[test]
fn score_json_is_a_single_report() {
    let home = tempfile::tempdir().unwrap();
    let output = score_household(home.path(), &["--json"]);
    assert_success(&output);

    let report = assert_single_json(&output);
    let obj = report.as_object().expect("report should be an object");
    for key in ["meta", "aggregate", "quality", "derived", "transactions"] {
        assert!(obj.contains_key(key), "report must have '{key}'");
    }

    let agg = &report["aggregate"];
    assert_eq!(agg["total_societal_debt"].as_f64(), Some(114.0));
    assert_eq!(agg["total_spent"].as_f64(), Some(295.0));
    assert_eq!(agg["transaction_count"].as_u64(), Some(5));
    assert_eq!(agg["per_category"][0]["category"], "Animal Welfare");
    assert_eq!(report["meta"]["config_name"], "Household");
    assert_eq!(report["transactions"].as_array().map(Vec::len), Some(5));
}

#[test]
fn score_without_json_keeps_stdout_empty() {
    let home = tempfile::tempdir().unwrap();
    let output = score_household(home.path(), &[]);
    assert_success(&output);

    assert!(output.stdout.is_empty(), "summary belongs on stderr");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("societal debt 114.00"), "stderr: {stderr}");
}

#[test]
fn score_warnings_do_not_pollute_json() {
    let home = tempfile::tempdir().unwrap();
    let output = score_household(home.path(), &["--json", "-v"]);
    assert_success(&output);
    assert_single_json(&output);

    // The fixture has an unclassified transaction and an unknown answer id.
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("txn_999"), "stderr: {stderr}");
}

#[test]
fn score_output_file_matches_stdout() {
    let home = tempfile::tempdir().unwrap();
    let out = home.path().join("reports/jan.json");
    let output = score_household(home.path(), &["--json", "--output", out.to_str().unwrap()]);
    assert_success(&output);

    let stdout_report = assert_single_json(&output);
    let file_report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(file_report["aggregate"], stdout_report["aggregate"]);
}

// ===========================================================================
// ethos credit apply / history --json
// ===========================================================================

#[test]
fn credit_apply_and_history() {
    let home = tempfile::tempdir().unwrap();
    let report = home.path().join("report.json");
    let ledger = home.path().join("ledger/credits.jsonl");
    assert_success(&score_household(home.path(), &["--output", report.to_str().unwrap()]));

    let apply = |amount: &str| {
        ethos(home.path())
            .args(["credit", "apply", "--report", report.to_str().unwrap()])
            .args(["--amount", amount, "--scope", "household", "--json"])
            .args(["--ledger", ledger.to_str().unwrap()])
            .output()
            .expect("ethos credit apply")
    };

    let first = apply("150");
    assert_success(&first);
    let first = assert_single_json(&first);
    assert_eq!(first["new_total_societal_debt"].as_f64(), Some(-36.0));
    assert_eq!(first["ledger_entry"]["seq"].as_u64(), Some(1));
    assert_eq!(first["ledger_entry"]["scope"], "household");

    // The second credit starts from what the first left outstanding.
    let second = apply("10");
    assert_success(&second);
    let second = assert_single_json(&second);
    assert_eq!(second["new_total_societal_debt"].as_f64(), Some(-46.0));
    assert_eq!(second["ledger_entry"]["seq"].as_u64(), Some(2));

    let history = ethos(home.path())
        .args(["credit", "history", "--scope", "household", "--json"])
        .args(["--ledger", ledger.to_str().unwrap()])
        .output()
        .expect("ethos credit history");
    assert_success(&history);
    let entries = assert_single_json(&history);
    let entries = entries.as_array().expect("history should be an array");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1]["resulting_debt"].as_f64(), Some(-46.0));

    // The scored report is never rewritten by credits.
    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(on_disk["aggregate"]["total_societal_debt"].as_f64(), Some(114.0));
}

#[test]
fn history_for_other_scope_is_empty() {
    let home = tempfile::tempdir().unwrap();
    let ledger = home.path().join("credits.jsonl");
    let output = ethos(home.path())
        .args(["credit", "history", "--scope", "nobody", "--json"])
        .args(["--ledger", ledger.to_str().unwrap()])
        .output()
        .expect("ethos credit history");
    assert_success(&output);
    assert_eq!(assert_single_json(&output), serde_json::json!([]));
}

#[test]
fn settings_file_supplies_scope_and_ledger() {
    let home = tempfile::tempdir().unwrap();
    let report = home.path().join("report.json");
    let ledger = home.path().join("from-settings.jsonl");
    std::fs::write(
        home.path().join("settings.toml"),
        format!("scope = \"alice\"\nledger = {:?}\n", ledger.to_str().unwrap()),
    )
    .unwrap();
    assert_success(&score_household(home.path(), &["--output", report.to_str().unwrap()]));

    let output = ethos(home.path())
        .args(["credit", "apply", "--report", report.to_str().unwrap(), "--amount", "4", "--json"])
        .output()
        .expect("ethos credit apply");
    assert_success(&output);
    assert_eq!(assert_single_json(&output)["ledger_entry"]["scope"], "alice");
    assert!(ledger.exists(), "ledger from settings.toml should be written");
}
