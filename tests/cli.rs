use std::fs;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};
use tempfile::tempdir;

const MESSY_CSV: &str = "\
normal,high_null,outliers,note
1,1,1000,zeta
2,2,10,  alpha
3,,10,beta
4,,10,gamma
5,,10,beta
6,,10,delta
7,,10,beta
8,,10,beta
9,9,10,beta
10,10,10,beta
";

fn cargo_bin() -> Command {
    Command::cargo_bin("csv-remedy").expect("binary exists")
}

#[test]
fn analyze_emits_profile_and_plan_envelope() {
    let temp = tempdir().expect("temp dir");
    let input = temp.path().join("messy.csv");
    fs::write(&input, MESSY_CSV).expect("write fixture");
    let output = temp.path().join("analysis.json");

    cargo_bin()
        .args([
            "analyze",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).expect("read analysis"))
            .expect("valid JSON");
    assert_eq!(parsed["profile"]["row_count"], 10);
    assert_eq!(parsed["profile"]["missing_counts"]["high_null"], 6);
    let steps = parsed["plan"]["plan"].as_array().expect("step array");
    assert!(steps
        .iter()
        .any(|s| s["action"] == "drop_columns" && s["columns"][0] == "high_null"));
    assert!(!parsed["plan"]["reasoning"].as_array().unwrap().is_empty());
}

#[test]
fn analyze_table_renders_profile_columns() {
    let temp = tempdir().expect("temp dir");
    let input = temp.path().join("messy.csv");
    fs::write(&input, MESSY_CSV).expect("write fixture");

    cargo_bin()
        .args(["analyze", "-i", input.to_str().unwrap(), "--table"])
        .assert()
        .success()
        .stdout(
            contains("column")
                .and(contains("high_null"))
                .and(contains("numeric"))
                .and(contains("duplicate row(s)")),
        );
}

#[test]
fn clean_derives_a_plan_and_writes_report() {
    let temp = tempdir().expect("temp dir");
    let input = temp.path().join("messy.csv");
    fs::write(&input, MESSY_CSV).expect("write fixture");
    let output = temp.path().join("cleaned.csv");
    let report = temp.path().join("report.json");

    cargo_bin()
        .args([
            "clean",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--report",
            report.to_str().unwrap(),
        ])
        .assert()
        .success();

    let cleaned = fs::read_to_string(&output).expect("read cleaned csv");
    let header = cleaned.lines().next().expect("header line");
    assert!(!header.contains("high_null"));
    assert!(!cleaned.contains("1000"));
    assert!(cleaned.contains("\"alpha\""));
    assert!(!cleaned.contains("  alpha"));

    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).expect("read report"))
            .expect("valid JSON");
    assert_eq!(parsed["report"]["removed_columns"][0], "high_null");
    assert!(parsed["report"]["outliers_removed"].as_u64().unwrap() > 0);
    assert_eq!(parsed["stats"]["original_rows"], 10);
    assert_eq!(
        parsed["stats"]["cleaned_columns"].as_u64().unwrap(),
        parsed["stats"]["original_columns"].as_u64().unwrap() - 1
    );
}

#[test]
fn clean_honours_a_caller_supplied_plan() {
    let temp = tempdir().expect("temp dir");
    let input = temp.path().join("messy.csv");
    fs::write(&input, MESSY_CSV).expect("write fixture");
    let plan = temp.path().join("plan.json");
    fs::write(
        &plan,
        r#"{
            "plan": [
                {"step": "standardize_text", "reason": "Whitespace normalization.",
                 "action": "clean_text", "columns": ["note"]}
            ],
            "reasoning": []
        }"#,
    )
    .expect("write plan");
    let output = temp.path().join("cleaned.csv");

    cargo_bin()
        .args([
            "clean",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--plan",
            plan.to_str().unwrap(),
        ])
        .assert()
        .success();

    let cleaned = fs::read_to_string(&output).expect("read cleaned csv");
    // Only the plan's single step ran: columns and rows survive untouched.
    assert!(cleaned.lines().next().unwrap().contains("high_null"));
    assert!(cleaned.contains("1000"));
    assert!(cleaned.contains("\"alpha\""));
    assert!(!cleaned.contains("  alpha"));
}

#[test]
fn clean_accepts_the_analyze_envelope_as_plan_input() {
    let temp = tempdir().expect("temp dir");
    let input = temp.path().join("messy.csv");
    fs::write(&input, MESSY_CSV).expect("write fixture");
    let analysis = temp.path().join("analysis.json");
    let output = temp.path().join("cleaned.csv");

    cargo_bin()
        .args([
            "analyze",
            "-i",
            input.to_str().unwrap(),
            "-o",
            analysis.to_str().unwrap(),
        ])
        .assert()
        .success();

    cargo_bin()
        .args([
            "clean",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--plan",
            analysis.to_str().unwrap(),
        ])
        .assert()
        .success();

    let cleaned = fs::read_to_string(&output).expect("read cleaned csv");
    assert!(!cleaned.lines().next().unwrap().contains("high_null"));
}

#[test]
fn missing_input_file_reports_read_context() {
    cargo_bin()
        .args(["analyze", "-i", "no-such-file.csv"])
        .assert()
        .failure()
        .stderr(contains("Reading dataset"));
}
