//! End-to-end tests for the `qs` binary

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

fn seed(temp: &TempDir) -> std::path::PathBuf {
    let path = temp.path().join("output.json");
    let records = json!([
        {"name": "Ana", "phone": "555-1234", "countryCode": "1", "filename": "a.pdf", "status": "SENT"},
        {"name": "Beto", "phone": "555-9999", "countryCode": "1", "filename": "b.pdf", "status": "FAILED", "error_msg": "boom"},
        {"name": "Caro", "phone": "", "countryCode": "1", "filename": "c.pdf", "status": "ERROR_PHONE_MISSING"}
    ]);
    fs::write(&path, serde_json::to_string_pretty(&records).unwrap()).unwrap();
    path
}

fn qs() -> Command {
    Command::cargo_bin("qs").expect("qs binary should build")
}

#[test]
fn test_stats_reports_counts() {
    let temp = TempDir::new().unwrap();
    let store = seed(&temp);

    qs().arg("--store")
        .arg(&store)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Records: 3"))
        .stdout(predicate::str::contains("FAILED"));
}

#[test]
fn test_list_filters_by_status() {
    let temp = TempDir::new().unwrap();
    let store = seed(&temp);

    qs().arg("--store")
        .arg(&store)
        .args(["list", "--status", "SENT"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ana-555-1234"))
        .stdout(predicate::str::contains("Beto").not());
}

#[test]
fn test_reset_failed_records() {
    let temp = TempDir::new().unwrap();
    let store = seed(&temp);

    qs().arg("--store")
        .arg(&store)
        .arg("reset")
        .assert()
        .success()
        .stdout(predicate::str::contains("Reset 1 record(s)"));

    let records: serde_json::Value = serde_json::from_str(&fs::read_to_string(&store).unwrap()).unwrap();
    assert_eq!(records[0]["status"], "SENT");
    assert_eq!(records[1]["status"], "PENDING");
    assert_eq!(records[1]["error_msg"], "boom");
    assert_eq!(records[2]["status"], "ERROR_PHONE_MISSING");
}

#[test]
fn test_missing_store_fails() {
    let temp = TempDir::new().unwrap();

    qs().arg("--store")
        .arg(temp.path().join("nope.json"))
        .arg("stats")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Store file not found"));
}

#[test]
fn test_config_paths_section_selects_store() {
    let temp = TempDir::new().unwrap();
    let store = seed(&temp);
    let config = temp.path().join("notifysender.yml");
    fs::write(&config, format!("paths:\n  store-path: {}\n", store.display())).unwrap();

    qs().current_dir(temp.path())
        .arg("--config")
        .arg(&config)
        .arg("reset")
        .assert()
        .success()
        .stdout(predicate::str::contains("Reset 1 record(s)"));

    let records: serde_json::Value = serde_json::from_str(&fs::read_to_string(&store).unwrap()).unwrap();
    assert_eq!(records[1]["status"], "PENDING");
}
