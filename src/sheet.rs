//! Spreadsheet input: open a workbook, pick the active sheet, and read it as
//! a header row plus rows of cell text.
//!
//! Workbook formats (xlsx, xlsm, xlsb, xls, ods) are read with `calamine`.
//! Delimited text (csv, tsv, txt, or `-` for stdin) is read with the `csv`
//! crate and shows up as a single sheet named after the file.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use calamine::{Data, Reader, Sheets, open_workbook_auto};
use chrono::NaiveTime;
use encoding_rs::{Encoding, UTF_8};
use log::{debug, info, warn};

use crate::{
    data::{DATE_FORMAT, DATETIME_FORMAT},
    error::{IngestError, IngestResult},
    io_utils,
};

#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

impl ReadOptions {
    pub fn resolve(delimiter: Option<u8>, encoding: Option<&str>) -> IngestResult<Self> {
        let encoding = io_utils::resolve_encoding(encoding)
            .map_err(|err| IngestError::config(err.to_string()))?;
        Ok(ReadOptions {
            delimiter,
            encoding,
        })
    }
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            delimiter: None,
            encoding: UTF_8,
        }
    }
}

/// The active sheet as text. Row 1 of the spreadsheet is `headers`; `rows`
/// holds rows 2..N, each padded to the header width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(
        name: impl Into<String>,
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> IngestResult<Self> {
        let name = name.into();
        validate_headers(&name, &headers)?;
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                if row.len() > width && row[width..].iter().any(|c| !c.is_empty()) {
                    warn!("Sheet '{name}' has data beyond its last header column; ignoring it");
                }
                row.resize(width, String::new());
                row
            })
            .collect();
        Ok(Sheet {
            name,
            headers,
            rows,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Rows with their 1-based spreadsheet row number (data starts at 2).
    pub fn numbered_rows(&self) -> impl Iterator<Item = (usize, &[String])> {
        self.rows
            .iter()
            .enumerate()
            .map(|(idx, row)| (idx + 2, row.as_slice()))
    }
}

fn validate_headers(sheet: &str, headers: &[String]) -> IngestResult<()> {
    if headers.is_empty() {
        return Err(IngestError::config(format!(
            "Sheet '{sheet}' has no header row"
        )));
    }
    for (idx, header) in headers.iter().enumerate() {
        if header.trim().is_empty() {
            return Err(IngestError::config(format!(
                "Sheet '{sheet}' header in column {} is empty",
                idx + 1
            )));
        }
        if headers[..idx].contains(header) {
            return Err(IngestError::config(format!(
                "Sheet '{sheet}' has more than one column named '{header}'"
            )));
        }
    }
    Ok(())
}

enum Source {
    Workbook(Sheets<BufReader<File>>),
    Delimited(Sheet),
}

/// An opened input file with one selected (active) sheet.
pub struct Workbook {
    path: PathBuf,
    source: Source,
    sheet_names: Vec<String>,
    active: usize,
}

impl Workbook {
    pub fn open(path: &Path, options: ReadOptions) -> IngestResult<Self> {
        let sheet_error = |message: String| IngestError::Sheet {
            path: path.display().to_string(),
            message,
        };
        let (source, sheet_names) = if io_utils::is_delimited_path(path) {
            let delimiter = io_utils::resolve_input_delimiter(path, options.delimiter);
            let (headers, rows) = io_utils::read_delimited(path, delimiter, options.encoding)
                .map_err(|err| sheet_error(format!("{err:#}")))?;
            let name = if io_utils::is_dash(path) {
                "stdin".to_string()
            } else {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .unwrap_or("sheet")
                    .to_string()
            };
            let sheet = Sheet::new(name.clone(), headers, rows)?;
            (Source::Delimited(sheet), vec![name])
        } else {
            let sheets = open_workbook_auto(path).map_err(|err| sheet_error(err.to_string()))?;
            let names = sheets.sheet_names();
            if names.is_empty() {
                return Err(sheet_error("workbook has no sheets".to_string()));
            }
            (Source::Workbook(sheets), names)
        };
        info!(
            "Opened {:?} with {} sheet(s): {}",
            path,
            sheet_names.len(),
            sheet_names.join(", ")
        );
        Ok(Workbook {
            path: path.to_path_buf(),
            source,
            sheet_names,
            active: 0,
        })
    }

    /// Opens `path` and activates `sheet` when one is named.
    pub fn open_sheet(path: &Path, options: ReadOptions, sheet: Option<&str>) -> IngestResult<Self> {
        let mut workbook = Self::open(path, options)?;
        if let Some(name) = sheet {
            workbook.select_sheet(name)?;
        }
        Ok(workbook)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    pub fn active_sheet_name(&self) -> &str {
        &self.sheet_names[self.active]
    }

    pub fn select_sheet(&mut self, name: &str) -> IngestResult<()> {
        let idx = self
            .sheet_names
            .iter()
            .position(|candidate| candidate == name)
            .ok_or_else(|| IngestError::config(format!("Sheet '{name}' not found")))?;
        self.active = idx;
        debug!("Active sheet is now '{name}'");
        Ok(())
    }

    pub fn read_active(&mut self) -> IngestResult<Sheet> {
        let name = self.sheet_names[self.active].clone();
        match &mut self.source {
            Source::Delimited(sheet) => Ok(sheet.clone()),
            Source::Workbook(sheets) => {
                let range = sheets
                    .worksheet_range(&name)
                    .map_err(|err| IngestError::Sheet {
                        path: self.path.display().to_string(),
                        message: format!("reading sheet '{name}': {err}"),
                    })?;
                // calamine ranges begin at the first used cell, not at A1.
                let (first_row, first_col) = range.start().unwrap_or((0, 0));
                if first_row > 0 {
                    return Err(IngestError::config(format!(
                        "Sheet '{name}' has no header in row 1 (first used row is {})",
                        first_row + 1
                    )));
                }
                let mut rows = range.rows().map(|row| {
                    let mut cells = vec![String::new(); first_col as usize];
                    cells.extend(row.iter().map(cell_text));
                    cells
                });
                let headers = rows.next().unwrap_or_default();
                let sheet = Sheet::new(name, headers, rows.collect())?;
                debug!(
                    "Read {} data row(s) from sheet '{}'",
                    sheet.rows().len(),
                    sheet.name()
                );
                Ok(sheet)
            }
        }
    }
}

/// Renders a cell as the text an operator would see, whatever its stored type.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) if value.time() == NaiveTime::MIN => {
                value.format(DATE_FORMAT).to_string()
            }
            Some(value) => value.format(DATETIME_FORMAT).to_string(),
            None => dt.as_f64().to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        other => other.to_string(),
    }
}
