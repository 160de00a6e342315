//! CLI options interaction tests
//!
//! These run the built binary from an empty working directory with every
//! supported environment variable removed, so no local .env leaks in.

use assert_cmd::prelude::*;
use devbench::config::EnvManager;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

/// Helper function to create an isolated test command
fn create_test_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("devbench").unwrap();
    cmd.current_dir(dir.path());
    for (name, _, _) in EnvManager::get_supported_env_vars() {
        cmd.env_remove(name);
    }
    cmd
}

fn write_results(dir: &TempDir, json: &str) -> String {
    let path = dir.path().join("saved.json");
    fs::write(&path, json).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn test_help_and_version() {
    let dir = TempDir::new().unwrap();

    create_test_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("devbench"))
        .stdout(predicate::str::contains("--from-results"));

    create_test_cmd(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_topics() {
    let dir = TempDir::new().unwrap();

    create_test_cmd(&dir)
        .args(["--help-topic", "kinds", "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BENCHMARKS:"));

    create_test_cmd(&dir)
        .args(["--help-topic", "env"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BENCH_DEVICES"));
}

#[test]
fn test_missing_device_source_fails() {
    let dir = TempDir::new().unwrap();

    create_test_cmd(&dir)
        .arg("--no-color")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Must specify device addresses"));
}

#[test]
fn test_env_file_supplies_device_source() {
    let dir = TempDir::new().unwrap();
    write_results(&dir, r#"{"n4": {"n5": 8.0}, "n5": {"n4": 24.0}}"#);
    fs::write(dir.path().join(".env"), "BENCH_FROM_RESULTS=saved.json\nENABLE_COLOR=false\n").unwrap();

    create_test_cmd(&dir).assert().success();

    assert!(dir.path().join("plot.svg").exists());
}

#[test]
fn test_conflicting_color_flags() {
    let dir = TempDir::new().unwrap();

    create_test_cmd(&dir)
        .args(["--color", "--no-color", "100", "107"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--color"));
}

#[test]
fn test_invalid_option_values() {
    let dir = TempDir::new().unwrap();

    create_test_cmd(&dir)
        .args(["--kind", "latency", "100", "107"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("latency"));

    create_test_cmd(&dir)
        .args(["--timeout", "0", "100", "107"])
        .assert()
        .failure();

    create_test_cmd(&dir)
        .args(["--stats", "mean,median", "100", "107"])
        .assert()
        .failure();
}

#[test]
fn test_replay_writes_chart_and_results() {
    let dir = TempDir::new().unwrap();
    let saved = write_results(&dir, r#"{"n4": {"n5": 8.0, "mi": 12.5}, "n5": {"n4": 24.0, "mi": 3.0}}"#);
    let chart = dir.path().join("plots").join("throughput.svg");
    let export = dir.path().join("export").join("results.json");

    create_test_cmd(&dir)
        .args(["--no-color", "--from-results", &saved])
        .arg("-o")
        .arg(&chart)
        .arg("--results-json")
        .arg(&export)
        .assert()
        .success()
        .stdout(predicate::str::contains("Chart written to"))
        .stdout(predicate::str::contains("n4"));

    let svg = fs::read_to_string(&chart).unwrap();
    assert!(svg.contains("<svg"));

    let exported: serde_json::Value = serde_json::from_str(&fs::read_to_string(&export).unwrap()).unwrap();
    assert_eq!(exported["n5"]["n4"], serde_json::json!(24.0));
}

#[test]
fn test_replay_of_malformed_tree_fails() {
    let dir = TempDir::new().unwrap();
    let saved = write_results(&dir, r#"{"n4": {"n5": 8.0, "mi": {"mean": 1.0}}}"#);

    create_test_cmd(&dir)
        .args(["--no-color", "--from-results", &saved])
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("SCHEMA"));

    assert!(!dir.path().join("plot.svg").exists());
}

#[test]
fn test_replay_of_missing_file_fails() {
    let dir = TempDir::new().unwrap();

    create_test_cmd(&dir)
        .args(["--no-color", "--from-results", "missing.json"])
        .assert()
        .failure()
        .code(5);
}
