// SPDX-FileCopyrightText: 2025 Knitli Inc. <knitli@knit.li>
// SPDX-FileContributor: Adam Poulemanos for Knitli <adam@knit.li>
// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end tests against the `ioc-extractor` binary itself, driving
//! the full CLI surface (§6) rather than the library crates directly.

use std::fs;

use assert_cmd::Command;
use serde_json::json;

const RULE_YAML: &str = r"
name: createfilew
select:
  - field: api
    alias: api
from: api
where:
  regex: '(?i)^createfilew'
";

fn bin() -> Command {
    Command::cargo_bin("ioc-extractor").unwrap()
}

#[test]
fn dry_run_reports_loaded_rules_without_scanning() {
    let dir = tempfile::tempdir().unwrap();
    let rule_path = dir.path().join("rule.yml");
    fs::write(&rule_path, RULE_YAML).unwrap();
    let input_path = dir.path().join("input.json");
    fs::write(&input_path, "[]").unwrap();

    let output = bin().arg(&input_path).arg("--patterns").arg(&rule_path).arg("--dry-run").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("1 rule(s) loaded"));
}

#[test]
fn writes_matches_to_an_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let rule_path = dir.path().join("rule.yml");
    fs::write(&rule_path, RULE_YAML).unwrap();

    let input_path = dir.path().join("input.json");
    let entries = vec![json!({"api": "CreateFileW(x)"}), json!({"api": "ReadFile(x)"})];
    fs::write(&input_path, serde_json::to_string(&entries).unwrap()).unwrap();

    let out_path = dir.path().join("out.json");
    bin()
        .arg(&input_path)
        .arg("--patterns")
        .arg(&rule_path)
        .arg("--output")
        .arg(&out_path)
        .arg("--chunk-size")
        .arg("10")
        .assert()
        .success();

    let content = fs::read_to_string(&out_path).unwrap();
    let records: Vec<serde_json::Value> = serde_json::from_str(&content).unwrap();
    assert_eq!(records.len(), 1);
}

#[test]
fn benchmark_dry_run_tunes_and_exits_without_scanning() {
    let dir = tempfile::tempdir().unwrap();
    let rule_path = dir.path().join("rule.yml");
    fs::write(&rule_path, RULE_YAML).unwrap();
    let input_path = dir.path().join("input.json");
    let entries: Vec<_> = (0..50).map(|i| json!({"api": format!("Fn{i}(x)")})).collect();
    fs::write(&input_path, serde_json::to_string(&entries).unwrap()).unwrap();

    let output = bin()
        .arg(&input_path)
        .arg("--patterns")
        .arg(&rule_path)
        .arg("--benchmark")
        .arg("--benchmark-sample-size")
        .arg("50")
        .arg("--dry-run")
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("dry run, no input scanned"));
}

#[test]
fn prints_matches_to_stdout_when_no_output_path_given() {
    let dir = tempfile::tempdir().unwrap();
    let rule_path = dir.path().join("rule.yml");
    fs::write(&rule_path, RULE_YAML).unwrap();

    let input_path = dir.path().join("input.json");
    let entries = vec![json!({"api": "CreateFileW(x)"}), json!({"api": "ReadFile(x)"})];
    fs::write(&input_path, serde_json::to_string(&entries).unwrap()).unwrap();

    let output = bin()
        .arg(&input_path)
        .arg("--patterns")
        .arg(&rule_path)
        .arg("--chunk-size")
        .arg("10")
        .output()
        .unwrap();
    assert!(output.status.success());
    let records: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["api"], "CreateFileW");
}

#[test]
fn rejects_an_unknown_operator_at_load_time() {
    let dir = tempfile::tempdir().unwrap();
    let rule_path = dir.path().join("rule.yml");
    fs::write(
        &rule_path,
        "name: bad\nselect: []\nfrom: api\nwhere:\n  nonexistent_operator: 1\n",
    )
    .unwrap();
    let input_path = dir.path().join("input.json");
    fs::write(&input_path, "[]").unwrap();

    bin().arg(&input_path).arg("--patterns").arg(&rule_path).assert().failure();
}
