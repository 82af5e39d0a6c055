mod common;

use assert_cmd::Command;
use common::TestWorkspace;
use predicates::prelude::*;
use predicates::str::contains;

fn sheet_ingest() -> Command {
    let mut command = Command::cargo_bin("sheet-ingest").expect("binary exists");
    command.env_remove("RUST_LOG");
    command
}

#[test]
fn columns_lists_sheets_and_headers() {
    let workspace = TestWorkspace::new();
    let path = workspace.people_workbook();
    sheet_ingest()
        .args(["columns", "-f", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("People").and(contains("suggested target")).and(contains("Alice")));
}

#[test]
fn template_prints_a_mapping_skeleton() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("contacts.csv", "Full Name,E-mail\nAlice,a@example.com\n");
    let output = sheet_ingest()
        .args(["template", "-f", path.to_str().unwrap()])
        .output()
        .expect("run template");
    assert!(output.status.success());

    let document: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("template is JSON");
    let columns = document["columns"].as_array().expect("columns array");
    assert_eq!(columns.len(), 2);
    assert_eq!(columns[0]["columnName"], "Full Name");
    assert_eq!(columns[0]["dbColumnName"], "full_name");
    assert_eq!(columns[1]["dbColumnName"], "e_mail");
    assert_eq!(columns[1]["columnType"], "text");
}

#[test]
fn template_output_feeds_a_dry_run() {
    let workspace = TestWorkspace::new();
    let sheet = workspace.people_workbook();
    let mapping = workspace.path().join("people.yaml");
    sheet_ingest()
        .args([
            "template",
            "-f",
            sheet.to_str().unwrap(),
            "-o",
            mapping.to_str().unwrap(),
        ])
        .assert()
        .success();
    assert!(mapping.exists());

    sheet_ingest()
        .args([
            "load",
            "-y",
            "--dry-run",
            "-t",
            "people",
            "-f",
            sheet.to_str().unwrap(),
            "-j",
            mapping.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("INSERT INTO people (name, age) VALUES ('Alice', '30');"));
}

#[test]
fn dry_run_prints_one_insert_per_csv_row() {
    let workspace = TestWorkspace::new();
    let sheet = workspace.write("people.csv", "name,age\nAlice,30\n,\nBob,41\n");
    let mapping = workspace.people_mapping();
    let output = sheet_ingest()
        .args([
            "load",
            "-y",
            "--dry-run",
            "-t",
            "people",
            "-f",
            sheet.to_str().unwrap(),
            "--json-path",
            mapping.to_str().unwrap(),
        ])
        .output()
        .expect("run load");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "INSERT INTO people (person_name, person_age) VALUES ('Alice', 30);",
            "INSERT INTO people (person_name, person_age) VALUES ('Bob', 41);",
        ]
    );
}

#[test]
fn surrogate_flags_add_a_digit_column() {
    let workspace = TestWorkspace::new();
    let sheet = workspace.write("people.csv", "name,age\nAlice,30\n");
    let mapping = workspace.people_mapping();
    sheet_ingest()
        .args([
            "load",
            "-y",
            "--dry-run",
            "-t",
            "people",
            "-f",
            sheet.to_str().unwrap(),
            "-j",
            mapping.to_str().unwrap(),
            "-c",
            "row_id",
            "-l",
            "6",
        ])
        .assert()
        .success()
        .stdout(
            predicate::str::is_match(
                r"^INSERT INTO people \(person_name, person_age, row_id\) VALUES \('Alice', 30, '[0-9]{6}'\);\n$",
            )
            .unwrap(),
        );
}

#[test]
fn random_column_flags_must_be_paired() {
    let workspace = TestWorkspace::new();
    let sheet = workspace.people_workbook();
    sheet_ingest()
        .args([
            "load",
            "-y",
            "-t",
            "people",
            "-f",
            sheet.to_str().unwrap(),
            "-c",
            "row_id",
        ])
        .assert()
        .code(1)
        .stderr(contains("must be used together"));
}

#[test]
fn incomplete_mapping_fails_before_connecting() {
    let workspace = TestWorkspace::new();
    let sheet = workspace.people_workbook();
    let mapping = workspace.write(
        "partial.json",
        r#"[{"columnName": "name", "dbColumnName": "person_name", "columnType": "text"}]"#,
    );
    sheet_ingest()
        .args([
            "load",
            "-y",
            "-t",
            "people",
            "-f",
            sheet.to_str().unwrap(),
            "-j",
            mapping.to_str().unwrap(),
            "-e",
            workspace.path().join("missing.env").to_str().unwrap(),
        ])
        .assert()
        .code(1)
        .stderr(contains("error:").and(contains("unmapped column(s) age")));
}

#[test]
fn invalid_value_aborts_dry_run() {
    let workspace = TestWorkspace::new();
    let sheet = workspace.write("people.csv", "name,age\nAlice,30\nBob,abc\n");
    let mapping = workspace.people_mapping();
    sheet_ingest()
        .args([
            "load",
            "-y",
            "--dry-run",
            "-t",
            "people",
            "-f",
            sheet.to_str().unwrap(),
            "-j",
            mapping.to_str().unwrap(),
        ])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(contains("Row 3 column 'age'"));
}

#[test]
fn unsafe_table_name_is_rejected() {
    let workspace = TestWorkspace::new();
    let sheet = workspace.people_workbook();
    let mapping = workspace.people_mapping();
    sheet_ingest()
        .args([
            "load",
            "-y",
            "--dry-run",
            "-t",
            "people; DROP TABLE people",
            "-f",
            sheet.to_str().unwrap(),
            "-j",
            mapping.to_str().unwrap(),
        ])
        .assert()
        .code(1)
        .stderr(contains("error:"));
}

#[test]
fn assume_yes_requires_a_mapping_file() {
    let workspace = TestWorkspace::new();
    let sheet = workspace.people_workbook();
    sheet_ingest()
        .args(["load", "-y", "-t", "people", "-f", sheet.to_str().unwrap()])
        .assert()
        .code(1)
        .stderr(contains("--mapping"));
}
