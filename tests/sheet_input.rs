mod common;

use common::{Cell, TestWorkspace, strings};
use sheet_ingest::{
    error::IngestError,
    sheet::{ReadOptions, Workbook},
};

#[test]
fn xlsx_header_row_and_numbers_read_as_text() {
    let workspace = TestWorkspace::new();
    let path = workspace.people_workbook();

    let mut workbook = Workbook::open(&path, ReadOptions::default()).expect("open workbook");
    assert_eq!(workbook.sheet_names(), &strings(&["People"]));

    let sheet = workbook.read_active().expect("read sheet");
    assert_eq!(sheet.headers(), &strings(&["name", "age"]));
    assert_eq!(sheet.rows(), &[strings(&["Alice", "30"])]);
}

#[test]
fn named_sheet_is_selected_among_several() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_workbook(
        "multi.xlsx",
        &[
            (
                "Summary",
                vec![vec![Cell::Text("total")], vec![Cell::Number(2.0)]],
            ),
            (
                "Orders",
                vec![
                    vec![Cell::Text("order_id"), Cell::Text("paid"), Cell::Text("amount")],
                    vec![Cell::Number(1.0), Cell::Bool(true), Cell::Number(12.5)],
                    vec![Cell::Number(2.0), Cell::Bool(false), Cell::Empty],
                ],
            ),
        ],
    );

    let mut workbook =
        Workbook::open_sheet(&path, ReadOptions::default(), Some("Orders")).expect("open");
    assert_eq!(workbook.sheet_names(), &strings(&["Summary", "Orders"]));
    assert_eq!(workbook.active_sheet_name(), "Orders");

    let sheet = workbook.read_active().expect("read sheet");
    assert_eq!(sheet.headers(), &strings(&["order_id", "paid", "amount"]));
    assert_eq!(sheet.rows()[0], strings(&["1", "true", "12.5"]));
    assert_eq!(sheet.rows()[1], strings(&["2", "false", ""]));
}

#[test]
fn unknown_sheet_is_a_configuration_error() {
    let workspace = TestWorkspace::new();
    let path = workspace.people_workbook();
    let err = Workbook::open_sheet(&path, ReadOptions::default(), Some("Missing"))
        .err()
        .expect("missing sheet should fail");
    assert!(matches!(err, IngestError::Configuration(_)));
    assert!(err.to_string().contains("Missing"));
}

#[test]
fn delimited_files_become_a_single_sheet() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("people.tsv", "name\tage\nAlice\t30\nBob\n");

    let mut workbook = Workbook::open(&path, ReadOptions::default()).expect("open tsv");
    assert_eq!(workbook.sheet_names(), &strings(&["people"]));
    let sheet = workbook.read_active().expect("read tsv");
    assert_eq!(sheet.rows(), &[strings(&["Alice", "30"]), strings(&["Bob", ""])]);
}

#[test]
fn delimiter_and_encoding_overrides_apply() {
    let workspace = TestWorkspace::new();
    let path = workspace.path().join("cities.csv");
    // "Zürich" in windows-1252
    std::fs::write(&path, b"city;country\nZ\xfcrich;CH\n").expect("write csv");

    let options = ReadOptions::resolve(Some(b';'), Some("windows-1252")).expect("options");
    let mut workbook = Workbook::open(&path, options).expect("open csv");
    let sheet = workbook.read_active().expect("read csv");
    assert_eq!(sheet.rows(), &[strings(&["Zürich", "CH"])]);
}

#[test]
fn duplicate_headers_are_rejected() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("dupes.csv", "name,name\nAlice,Bob\n");
    let err = Workbook::open(&path, ReadOptions::default())
        .err()
        .expect("duplicate headers should fail");
    assert!(err.to_string().contains("more than one column named 'name'"));
}

#[test]
fn missing_workbook_reports_the_path() {
    let workspace = TestWorkspace::new();
    let path = workspace.path().join("absent.xlsx");
    let err = Workbook::open(&path, ReadOptions::default())
        .err()
        .expect("missing file should fail");
    assert!(matches!(err, IngestError::Sheet { .. }));
}

#[test]
fn header_below_row_one_is_rejected() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_workbook(
        "offset.xlsx",
        &[(
            "People",
            vec![
                vec![],
                vec![Cell::Text("name"), Cell::Text("age")],
                vec![Cell::Text("Alice"), Cell::Number(30.0)],
            ],
        )],
    );
    let err = Workbook::open(&path, ReadOptions::default())
        .expect("open workbook")
        .read_active()
        .err()
        .expect("header in row 2 should fail");
    assert!(matches!(err, IngestError::Configuration(_)));
    assert!(err.to_string().contains("no header in row 1"));
}

#[test]
fn blank_leading_column_keeps_sheet_positions() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_workbook(
        "shifted.xlsx",
        &[(
            "People",
            vec![
                vec![Cell::Empty, Cell::Text("name"), Cell::Text("age")],
                vec![Cell::Empty, Cell::Text("Alice"), Cell::Number(30.0)],
            ],
        )],
    );
    let err = Workbook::open(&path, ReadOptions::default())
        .expect("open workbook")
        .read_active()
        .err()
        .expect("blank column A header should fail");
    assert!(err.to_string().contains("header in column 1 is empty"));
}
