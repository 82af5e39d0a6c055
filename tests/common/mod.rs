#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;
use tempfile::{TempDir, tempdir};

/// A cell written into a generated workbook.
pub enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Bool(bool),
    Empty,
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes an xlsx workbook with one worksheet per `(name, rows)` entry.
    pub fn write_workbook(&self, name: &str, sheets: &[(&str, Vec<Vec<Cell<'_>>>)]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut workbook = Workbook::new();
        for (sheet_name, rows) in sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(*sheet_name).expect("sheet name");
            for (row_idx, row) in rows.iter().enumerate() {
                for (col_idx, cell) in row.iter().enumerate() {
                    let (r, c) = (row_idx as u32, col_idx as u16);
                    match cell {
                        Cell::Text(text) => {
                            worksheet.write_string(r, c, *text).expect("write text");
                        }
                        Cell::Number(number) => {
                            worksheet.write_number(r, c, *number).expect("write number");
                        }
                        Cell::Bool(flag) => {
                            worksheet.write_boolean(r, c, *flag).expect("write boolean");
                        }
                        Cell::Empty => {}
                    }
                }
            }
        }
        workbook.save(&path).expect("save workbook");
        path
    }

    /// The `name, age` workbook with a single `Alice, 30` row.
    pub fn people_workbook(&self) -> PathBuf {
        self.write_workbook(
            "people.xlsx",
            &[(
                "People",
                vec![
                    vec![Cell::Text("name"), Cell::Text("age")],
                    vec![Cell::Text("Alice"), Cell::Number(30.0)],
                ],
            )],
        )
    }

    /// A JSON mapping for the people sheet.
    pub fn people_mapping(&self) -> PathBuf {
        self.write(
            "people.json",
            r#"[
  {"columnName": "name", "dbColumnName": "person_name", "columnType": "text"},
  {"columnName": "age", "dbColumnName": "person_age", "columnType": "int"}
]"#,
        )
    }
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
