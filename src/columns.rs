//! Sheet and header listing.
//!
//! Prints every sheet in the workbook, then the header columns of the chosen
//! sheet with the identifier a template would map them to and a sample value.

use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::ColumnsArgs,
    mapping::suggest_identifier,
    sheet::{ReadOptions, Sheet, Workbook},
    table::TextTable,
};

pub fn execute(args: &ColumnsArgs) -> Result<()> {
    let options = ReadOptions::resolve(args.delimiter, args.input_encoding.as_deref())?;
    let mut workbook = Workbook::open_sheet(&args.file_path, options, args.sheet_name.as_deref())
        .with_context(|| format!("Opening {:?}", args.file_path))?;

    let mut sheets = TextTable::new(["#", "sheet", "active"]);
    for (idx, name) in workbook.sheet_names().iter().enumerate() {
        let active = if name == workbook.active_sheet_name() { "*" } else { "" };
        sheets.push_row([(idx + 1).to_string(), name.clone(), active.to_string()]);
    }
    sheets.print();
    println!();

    let sheet = workbook.read_active()?;
    header_table(&sheet).print();
    info!(
        "Listed {} column(s) of sheet '{}' in {:?}",
        sheet.headers().len(),
        sheet.name(),
        workbook.path()
    );
    Ok(())
}

/// One line per header: position, header text, suggested target, first value.
pub fn header_table(sheet: &Sheet) -> TextTable {
    let mut table = TextTable::new(["#", "column", "suggested target", "sample"]);
    for (idx, header) in sheet.headers().iter().enumerate() {
        let sample = sheet
            .rows()
            .iter()
            .map(|row| row[idx].as_str())
            .find(|cell| !cell.trim().is_empty())
            .unwrap_or_default();
        table.push_row([
            (idx + 1).to_string(),
            header.clone(),
            suggest_identifier(header),
            sample.to_string(),
        ]);
    }
    table
}
