//! The `riskgate` binary keeps stdout machine-readable.

use std::path::Path;
use std::process::{Command, Output};

fn run_cli(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_riskgate"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .env_remove("RISKGATE_CONFIG")
        .args(args)
        .output()
        .unwrap_or_else(|err| panic!("failed running `riskgate {}`: {err}", args.join(" ")))
}

fn write_findings(dir: &Path) {
    std::fs::write(
        dir.join("findings.json"),
        r#"{
            "overallRisk": "high",
            "risks": [{"level": "medium", "area": "checkout"}],
            "testScenarios": [{"title": "pay", "priority": "critical"}]
        }"#,
    )
    .unwrap();
}

#[test]
fn test_score_stdout_is_pure_json() {
    let dir = tempfile::tempdir().unwrap();
    write_findings(dir.path());

    let output = run_cli(&["score", "findings.json"], dir.path());
    assert!(
        output.status.success(),
        "score failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}):\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    });
    // 20 (high overall) + 10 (medium risk) + 5 (uncovered critical scenario)
    assert_eq!(json["riskScore"], 35);
    assert_eq!(json["recommendation"], "attention");
    assert!(String::from_utf8_lossy(&output.stderr).contains("governance.decided"));
}

#[test]
fn test_verbose_json_logs_stay_on_stderr() {
    let dir = tempfile::tempdir().unwrap();
    write_findings(dir.path());

    let output = run_cli(&["--verbose", "--json", "score", "findings.json"], dir.path());
    assert!(output.status.success());

    serde_json::from_slice::<serde_json::Value>(&output.stdout).unwrap();
    for line in String::from_utf8_lossy(&output.stderr).lines() {
        serde_json::from_str::<serde_json::Value>(line)
            .unwrap_or_else(|e| panic!("log line is not JSON ({e}): {line}"));
    }
}

#[test]
fn test_config_stdout_uses_documented_keys() {
    let dir = tempfile::tempdir().unwrap();

    let output = run_cli(&["config"], dir.path());
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["autonomous"]["create_pr"], true);
    assert_eq!(json["autonomous"]["base_branch_strategy"], "default");
    assert_eq!(json["monitor"]["max_checks"], 20);
}
