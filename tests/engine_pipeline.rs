mod common;

use common::{Cell, TestWorkspace, strings};
use sheet_ingest::{
    cancel::CancelFlag,
    data::Value,
    destination::{self, Destination},
    engine::InsertPlan,
    error::{IngestError, IngestResult, ValueError},
    mapping::MappingFile,
    sheet::{ReadOptions, Sheet, Workbook},
    statement::InsertStatement,
};

/// Stages rows per call and keeps them only when every statement succeeds.
#[derive(Default)]
struct StagingDestination {
    columns: Vec<String>,
    fail_at: Option<usize>,
    committed: Vec<Vec<Value>>,
    calls: usize,
}

impl StagingDestination {
    fn with_columns(columns: &[&str]) -> Self {
        StagingDestination {
            columns: strings(columns),
            ..Default::default()
        }
    }
}

impl Destination for StagingDestination {
    fn columns_exist(&mut self, table: &str, columns: &[&str]) -> IngestResult<bool> {
        assert_eq!(table, "people");
        Ok(columns
            .iter()
            .all(|column| self.columns.iter().any(|known| known == column)))
    }

    fn execute_all(&mut self, statements: &[InsertStatement]) -> IngestResult<u64> {
        self.calls += 1;
        let mut staged = Vec::new();
        for (idx, statement) in statements.iter().enumerate() {
            if self.fail_at == Some(idx + 1) {
                return Err(IngestError::Execution {
                    index: idx + 1,
                    message: "duplicate key value".to_string(),
                });
            }
            staged.push(statement.params().to_vec());
        }
        let inserted = staged.len() as u64;
        self.committed.extend(staged);
        Ok(inserted)
    }
}

fn load_people(workspace: &TestWorkspace) -> Sheet {
    let path = workspace.people_workbook();
    Workbook::open(&path, ReadOptions::default())
        .expect("open workbook")
        .read_active()
        .expect("read sheet")
}

#[test]
fn workbook_and_mapping_file_insert_one_row() {
    let workspace = TestWorkspace::new();
    let sheet = load_people(&workspace);
    let mapping = MappingFile::load(&workspace.people_mapping())
        .expect("load mapping")
        .resolve(sheet.headers())
        .expect("resolve mapping");
    let plan = InsertPlan::new("people", mapping, None).expect("plan");

    let mut destination = StagingDestination::with_columns(&["person_name", "person_age"]);
    let statements = plan
        .generate(&sheet, &mut destination, &CancelFlag::new())
        .expect("generate");
    assert_eq!(statements.len(), 1);
    assert_eq!(
        statements[0].sql(),
        "INSERT INTO people (person_name, person_age) VALUES ($1, $2)"
    );

    let inserted = destination::execute(&mut destination, &statements).expect("execute");
    assert_eq!(inserted, 1);
    assert_eq!(
        destination.committed,
        vec![vec![Value::Text("Alice".to_string()), Value::Int(30)]]
    );
}

#[test]
fn yaml_surrogate_key_adds_six_digits_per_row() {
    let workspace = TestWorkspace::new();
    let sheet = load_people(&workspace);
    let mapping_path = workspace.write(
        "people.yaml",
        "columns:\n  - columnName: name\n    dbColumnName: person_name\n    columnType: text\n  - columnName: age\n    dbColumnName: person_age\n    columnType: smallint\nsurrogateKey:\n  columnName: row_id\n  length: 6\n  includeZero: false\n",
    );
    let file = MappingFile::load(&mapping_path).expect("load mapping");
    let mapping = file.resolve(sheet.headers()).expect("resolve");
    let plan = InsertPlan::new("people", mapping, file.surrogate_key.clone()).expect("plan");

    let mut destination =
        StagingDestination::with_columns(&["person_name", "person_age", "row_id"]);
    let statements = plan
        .generate(&sheet, &mut destination, &CancelFlag::new())
        .expect("generate");
    assert_eq!(statements[0].params().len(), 3);
    assert_eq!(statements[0].param("person_age"), Some(&Value::SmallInt(30)));
    match statements[0].param("row_id") {
        Some(Value::Text(digits)) => {
            assert_eq!(digits.len(), 6);
            assert!(digits.chars().all(|c| ('1'..='9').contains(&c)));
        }
        other => panic!("Expected generated digits, got {other:?}"),
    }
}

#[test]
fn failing_statement_commits_nothing() {
    let rows: Vec<Vec<String>> = (1..=5)
        .map(|n| vec![format!("person {n}"), n.to_string()])
        .collect();
    let sheet = Sheet::new("People", strings(&["name", "age"]), rows).expect("sheet");
    let mapping = MappingFile::parse(
        r#"[{"columnName": "name", "dbColumnName": "person_name", "columnType": "text"},
            {"columnName": "age", "dbColumnName": "person_age", "columnType": "int"}]"#,
        sheet_ingest::mapping::MappingFormat::Json,
    )
    .expect("parse")
    .resolve(sheet.headers())
    .expect("resolve");
    let plan = InsertPlan::new("people", mapping, None).expect("plan");

    let mut destination = StagingDestination::with_columns(&["person_name", "person_age"]);
    destination.fail_at = Some(3);
    let statements = plan
        .generate(&sheet, &mut destination, &CancelFlag::new())
        .expect("generate");
    assert_eq!(statements.len(), 5);

    let err = destination::execute(&mut destination, &statements).unwrap_err();
    assert!(matches!(err, IngestError::Execution { index: 3, .. }));
    assert!(destination.committed.is_empty());
}

#[test]
fn empty_batch_never_reaches_the_destination() {
    let mut destination = StagingDestination::default();
    let err = destination::execute(&mut destination, &[]).unwrap_err();
    assert!(matches!(err, IngestError::NoStatements));
    assert_eq!(destination.calls, 0);
}

#[test]
fn invalid_cell_names_row_and_column() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_workbook(
        "ages.xlsx",
        &[(
            "People",
            vec![
                vec![Cell::Text("name"), Cell::Text("age")],
                vec![Cell::Text("Alice"), Cell::Number(30.0)],
                vec![Cell::Text("Bob"), Cell::Number(40000.0)],
            ],
        )],
    );
    let sheet = Workbook::open(&path, ReadOptions::default())
        .expect("open")
        .read_active()
        .expect("read");
    let mapping = MappingFile::parse(
        "- columnName: name\n  dbColumnName: person_name\n  columnType: text\n- columnName: age\n  dbColumnName: person_age\n  columnType: smallint\n",
        sheet_ingest::mapping::MappingFormat::Yaml,
    )
    .expect("parse")
    .resolve(sheet.headers())
    .expect("resolve");
    let plan = InsertPlan::new("people", mapping, None).expect("plan");

    let mut destination = StagingDestination::with_columns(&["person_name", "person_age"]);
    let err = plan
        .generate(&sheet, &mut destination, &CancelFlag::new())
        .unwrap_err();
    assert_eq!(err.to_string().split(':').next(), Some("Row 3 column 'age'"));
    assert!(err.value_error().is_some_and(ValueError::is_range_error));
    assert_eq!(destination.calls, 0);
}

#[test]
fn mapping_for_another_sheet_is_rejected() {
    let workspace = TestWorkspace::new();
    let sheet = load_people(&workspace);
    let file = MappingFile::parse(
        r#"[{"columnName": "name", "dbColumnName": "person_name", "columnType": "text"},
            {"columnName": "city", "dbColumnName": "city", "columnType": "text"}]"#,
        sheet_ingest::mapping::MappingFormat::Json,
    )
    .expect("parse");
    let err = file.resolve(sheet.headers()).unwrap_err();
    assert!(err.to_string().contains("'city' not found"));
}
