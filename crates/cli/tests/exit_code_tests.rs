// Exit codes are part of the shell contract; see src/exit_codes.rs.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../impact/tests/fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

fn ethos(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ethos"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env("ETHOS_SETTINGS", home.join("settings.toml"));
    for var in ["ETHOS_LOG", "ETHOS_SCOPE", "ETHOS_LEDGER", "ETHOS_CONFIG"] {
        cmd.env_remove(var);
    }
    cmd
}

fn code(output: &Output) -> i32 {
    output.status.code().expect("process should exit normally")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Score the fixtures into `<home>/report.json`.
fn write_report(home: &Path) -> PathBuf {
    let report = home.join("report.json");
    let output = ethos(home)
        .args(["score", &fixture("transactions.csv")])
        .args(["--classifications", &fixture("classifications.json")])
        .args(["--output", report.to_str().unwrap()])
        .output()
        .expect("ethos score");
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    report
}

fn credit_apply(home: &Path, report: &Path, ledger: &Path, amount: &str) -> Output {
    ethos(home)
        .args(["credit", "apply", "--report", report.to_str().unwrap()])
        .args(["--amount", amount, "--ledger", ledger.to_str().unwrap()])
        .output()
        .expect("ethos credit apply")
}

// ===========================================================================
// Credit (11, 12)
// ===========================================================================

#[test]
fn negative_credit_exits_11_and_leaves_no_ledger() {
    let home = tempfile::tempdir().unwrap();
    let report = write_report(home.path());
    let ledger = home.path().join("credits.jsonl");

    let output = credit_apply(home.path(), &report, &ledger, "-5");
    assert_eq!(code(&output), 11, "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("error: credit amount must be a positive number"));
    assert!(stderr(&output).contains("hint:"));
    assert!(!ledger.exists());
}

#[test]
fn zero_and_nan_credit_exit_11() {
    let home = tempfile::tempdir().unwrap();
    let report = write_report(home.path());
    let ledger = home.path().join("credits.jsonl");

    for amount in ["0", "NaN"] {
        let output = credit_apply(home.path(), &report, &ledger, amount);
        assert_eq!(code(&output), 11, "amount {amount}: {}", stderr(&output));
    }
    assert!(!ledger.exists());
}

#[test]
fn corrupt_ledger_exits_12() {
    let home = tempfile::tempdir().unwrap();
    let report = write_report(home.path());
    let ledger = home.path().join("credits.jsonl");
    std::fs::write(&ledger, "not json\n").unwrap();

    let output = credit_apply(home.path(), &report, &ledger, "5");
    assert_eq!(code(&output), 12, "stderr: {}", stderr(&output));
    assert_eq!(std::fs::read_to_string(&ledger).unwrap(), "not json\n");
}

#[test]
fn non_report_json_exits_4() {
    let home = tempfile::tempdir().unwrap();
    let bogus = home.path().join("bogus.json");
    std::fs::write(&bogus, r#"{"hello": "world"}"#).unwrap();

    let output = credit_apply(home.path(), &bogus, &home.path().join("l.jsonl"), "5");
    assert_eq!(code(&output), 4, "stderr: {}", stderr(&output));
}

// ===========================================================================
// Config (10)
// ===========================================================================

#[test]
fn invalid_config_exits_10() {
    let home = tempfile::tempdir().unwrap();
    let config = home.path().join("bad.impact.toml");
    std::fs::write(&config, "name = \"\"\n").unwrap();

    let validate = ethos(home.path())
        .args(["config", "validate", config.to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(code(&validate), 10, "stderr: {}", stderr(&validate));

    let score = ethos(home.path())
        .args(["score", &fixture("transactions.csv")])
        .args(["--classifications", &fixture("classifications.json")])
        .args(["--config", config.to_str().unwrap()])
        .output()
        .unwrap();
    assert_eq!(code(&score), 10, "stderr: {}", stderr(&score));
}

#[test]
fn valid_config_validates() {
    let home = tempfile::tempdir().unwrap();
    let output = ethos(home.path())
        .args(["config", "validate", &fixture("household.impact.toml")])
        .output()
        .unwrap();
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("'Household' is valid"));
}

// ===========================================================================
// Input (2, 3, 4)
// ===========================================================================

#[test]
fn missing_classifications_flag_exits_2() {
    let home = tempfile::tempdir().unwrap();
    let output = ethos(home.path())
        .args(["score", &fixture("transactions.csv")])
        .output()
        .unwrap();
    assert_eq!(code(&output), 2);
}

#[test]
fn missing_feed_exits_3() {
    let home = tempfile::tempdir().unwrap();
    let output = ethos(home.path())
        .args(["score", "does-not-exist.csv"])
        .args(["--classifications", &fixture("classifications.json")])
        .output()
        .unwrap();
    assert_eq!(code(&output), 3, "stderr: {}", stderr(&output));
}

#[test]
fn malformed_feed_exits_4() {
    let home = tempfile::tempdir().unwrap();
    let feed = home.path().join("feed.csv");
    std::fs::write(&feed, "id,date,merchant_name,amount\nt1,January 4th,Shop,10\n").unwrap();

    let output = ethos(home.path())
        .args(["score", feed.to_str().unwrap()])
        .args(["--classifications", &fixture("classifications.json")])
        .output()
        .unwrap();
    assert_eq!(code(&output), 4, "stderr: {}", stderr(&output));
}
