//! Delimited-text input (csv, tsv, txt, or `-` for stdin). Workbooks are
//! read by [`crate::sheet`].

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

const CSV_DELIMITER: u8 = b',';
const TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn is_delimited_path(path: &Path) -> bool {
    if is_dash(path) {
        return true;
    }
    matches!(
        path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase).as_deref(),
        Some("csv" | "tsv" | "txt")
    )
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => TSV_DELIMITER,
        _ => CSV_DELIMITER,
    })
}

/// Reads a whole delimited file (or stdin for `-`) as header plus text rows.
/// Rows may be shorter or longer than the header.
pub fn read_delimited(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let input: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(input);
    let headers = reader
        .byte_headers()
        .map_err(anyhow::Error::from)
        .and_then(|record| decode_record(record, encoding))
        .with_context(|| format!("Reading header row of {path:?}"))?;
    let mut rows = Vec::new();
    for (idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {} in {path:?}", idx + 2))?;
        let row = decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {} in {path:?}", idx + 2))?;
        rows.push(row);
    }
    Ok((headers, rows))
}

fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}
