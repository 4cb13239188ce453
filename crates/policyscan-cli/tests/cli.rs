//! Integration tests for the policyscan binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const ALLSTATE_TEXT: &str = "\
Allstate Vehicle and Property Insurance Company
allstate.com
Renters Policy Declarations
Policy Number: ALS9912345
Named Insured: Dana Whitfield
Property Address: 1200 Lakeshore Drive Unit 5, Chicago, IL 60610
Personal Property: $25,000
Family Liability: $300,000
Deductible: $500
Policy Period: 03/01/2024 to 03/01/2025
Total Premium: $219.00
";

/// Command isolated from the user's real config directory.
fn cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("policyscan").unwrap();
    cmd.env("XDG_CONFIG_HOME", home.path())
        .env("HOME", home.path())
        .current_dir(home.path());
    cmd
}

fn write_declarations(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, ALLSTATE_TEXT).unwrap();
    path
}

#[test]
fn companies_lists_known_insurers() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .arg("companies")
        .assert()
        .success()
        .stdout(predicate::str::contains("state_farm"))
        .stdout(predicate::str::contains("The Hanover"));
}

#[test]
fn companies_json_marks_strategy_tables() {
    let home = TempDir::new().unwrap();
    let output = cmd(&home).args(["companies", "--json"]).output().unwrap();
    assert!(output.status.success());

    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 18);
    assert!(entries.iter().any(|e| e["id"] == "allstate" && e["patterns"] == true));
}

#[test]
fn process_text_document_to_json() {
    let home = TempDir::new().unwrap();
    let input = write_declarations(home.path(), "renters.txt");

    let output = cmd(&home).arg("process").arg(&input).output().unwrap();
    assert!(output.status.success());

    let outcome: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(outcome["detection"]["company"], "allstate");
    assert_eq!(outcome["record"]["fields"]["policy_number"], "ALS9912345");
    assert_eq!(outcome["verdict"]["is_valid"], true);
}

#[test]
fn process_writes_csv_to_output_file() {
    let home = TempDir::new().unwrap();
    let input = write_declarations(home.path(), "renters.txt");
    let out = home.path().join("renters.csv");

    cmd(&home)
        .args(["process", "-f", "csv", "-o"])
        .arg(&out)
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Output written to"));

    let csv = fs::read_to_string(&out).unwrap();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("source,company,detection_confidence,policy_number"));
    assert!(lines.next().unwrap().contains("ALS9912345"));
}

#[test]
fn process_text_format_shows_labels() {
    let home = TempDir::new().unwrap();
    let input = write_declarations(home.path(), "renters.txt");

    cmd(&home)
        .args(["process", "-f", "text"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Company: Allstate"))
        .stdout(predicate::str::contains("Policy Number:"))
        .stdout(predicate::str::contains("Dana Whitfield"));
}

#[test]
fn unknown_company_is_rejected() {
    let home = TempDir::new().unwrap();
    let input = write_declarations(home.path(), "renters.txt");

    cmd(&home)
        .args(["process", "--company", "acme_mutual"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown company"));
}

#[test]
fn unsupported_extension_is_rejected() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("policy.docx");
    fs::write(&input, "not really a document").unwrap();

    cmd(&home)
        .arg("process")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported file type"));
}

#[test]
fn missing_input_is_rejected() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["process", "nowhere.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn batch_writes_outputs_and_summary() {
    let home = TempDir::new().unwrap();
    let docs = home.path().join("docs");
    fs::create_dir(&docs).unwrap();
    write_declarations(&docs, "a.txt");
    write_declarations(&docs, "b.txt");
    fs::write(docs.join("notes.docx"), "ignored").unwrap();
    let out = home.path().join("out");

    cmd(&home)
        .arg("batch")
        .arg(format!("{}/*", docs.display()))
        .arg("--output-dir")
        .arg(&out)
        .arg("--summary")
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 files"));

    assert!(out.join("a.json").exists());
    assert!(out.join("b.json").exists());

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("filename,status,company"));
    assert!(lines[1].starts_with("a.txt,success,allstate,ALS9912345"));
}

fn mixed_batch(home: &TempDir) -> std::path::PathBuf {
    let docs = home.path().join("docs");
    fs::create_dir(&docs).unwrap();
    fs::write(docs.join("a_broken.pdf"), "not a pdf").unwrap();
    for name in ["b.txt", "c.txt", "d.txt", "e.txt"] {
        write_declarations(&docs, name);
    }
    docs
}

#[test]
fn batch_stops_at_first_failure() {
    let home = TempDir::new().unwrap();
    let docs = mixed_batch(&home);

    cmd(&home)
        .args(["-v", "batch", "-j", "1"])
        .arg(format!("{}/*", docs.display()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("a_broken.pdf"))
        .stderr(predicate::str::contains("Processing failed after 1 of 5 files"))
        .stderr(predicate::str::contains("b.txt").not())
        .stderr(predicate::str::contains("e.txt").not());
}

#[test]
fn batch_continue_on_error_reports_failures() {
    let home = TempDir::new().unwrap();
    let docs = mixed_batch(&home);
    let out = home.path().join("out");

    cmd(&home)
        .args(["batch", "-j", "2", "--continue-on-error", "--summary", "--output-dir"])
        .arg(&out)
        .arg(format!("{}/*", docs.display()))
        .assert()
        .success()
        .stdout(predicate::str::contains("4 successful, 1 failed"))
        .stdout(predicate::str::contains("Failed files:"));

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.lines().nth(1).unwrap().starts_with("a_broken.pdf,error"));
    assert!(out.join("e.json").exists());
}

#[test]
fn batch_without_matches_fails() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .arg("batch")
        .arg(format!("{}/*.pdf", home.path().display()))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}

#[test]
fn config_path_points_into_config_dir() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("policyscan"))
        .stdout(predicate::str::contains("not created"));
}

#[test]
fn config_get_reads_defaults() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["config", "get", "review.max_warnings"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("3"));
}

#[test]
fn config_set_then_get() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("custom.json");

    cmd(&home)
        .arg("-c")
        .arg(&config)
        .args(["config", "set", "review.max_warnings", "5"])
        .assert()
        .success();

    cmd(&home)
        .arg("-c")
        .arg(&config)
        .args(["config", "get", "review.max_warnings"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("5"));
}

#[test]
fn config_set_unknown_key_fails() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["config", "set", "review.nonsense", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}
