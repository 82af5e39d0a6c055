use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::mapping::MappingFormat;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Load spreadsheet rows into a PostgreSQL table",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Map, validate and insert a sheet's rows into a database table
    Load(LoadArgs),
    /// List the sheets of a workbook and the header columns of one sheet
    Columns(ColumnsArgs),
    /// Write a column mapping skeleton for a sheet
    Template(TemplateArgs),
}

#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Spreadsheet to load (xlsx, xlsm, xlsb, xls, ods, csv, tsv or `-` for stdin)
    #[arg(short = 'f', long = "file-path")]
    pub file_path: Option<PathBuf>,
    /// Sheet to load (defaults to the only sheet, or asks when there are several)
    #[arg(short = 's', long = "sheet-name")]
    pub sheet_name: Option<String>,
    /// Destination table
    #[arg(short = 't', long = "table-name")]
    pub table_name: Option<String>,
    /// Column mapping file (JSON, or YAML by extension)
    #[arg(short = 'j', long = "mapping", visible_alias = "json-path")]
    pub mapping: Option<PathBuf>,
    /// Environment file holding the connection settings
    #[arg(short = 'e', long = "env-path")]
    pub env_path: Option<PathBuf>,
    /// Never prompt; anything not supplied is an error
    #[arg(short = 'y', long = "assume-yes")]
    pub assume_yes: bool,
    /// Name of a generated random digit column
    #[arg(short = 'c', long = "rand-col-name")]
    pub rand_col_name: Option<String>,
    /// Number of digits in the generated random column
    #[arg(short = 'l', long = "rand-col-length")]
    pub rand_col_length: Option<usize>,
    /// Draw random digits from 1-9 instead of 0-9
    #[arg(long = "rand-exclude-zero")]
    pub rand_exclude_zero: bool,
    /// Round real/double values with too many fractional digits instead of rejecting them
    #[arg(long = "auto-correct")]
    pub auto_correct: bool,
    /// Print the statements instead of connecting and executing them
    #[arg(long = "dry-run")]
    pub dry_run: bool,
    /// Delimiter for csv/tsv input (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of csv/tsv input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    /// Spreadsheet to inspect
    #[arg(short = 'f', long = "file-path")]
    pub file_path: PathBuf,
    /// Sheet whose header columns are listed (defaults to the first sheet)
    #[arg(short = 's', long = "sheet-name")]
    pub sheet_name: Option<String>,
    /// Delimiter for csv/tsv input
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of csv/tsv input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct TemplateArgs {
    /// Spreadsheet whose header row seeds the template
    #[arg(short = 'f', long = "file-path")]
    pub file_path: PathBuf,
    /// Sheet to read headers from (defaults to the first sheet)
    #[arg(short = 's', long = "sheet-name")]
    pub sheet_name: Option<String>,
    /// Where to write the template (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Template format; inferred from the output extension when omitted
    #[arg(long = "format", value_enum)]
    pub format: Option<TemplateFormat>,
    /// Include a random digit column with this name
    #[arg(short = 'c', long = "rand-col-name")]
    pub rand_col_name: Option<String>,
    /// Number of digits in the random column
    #[arg(short = 'l', long = "rand-col-length")]
    pub rand_col_length: Option<usize>,
    /// Delimiter for csv/tsv input
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of csv/tsv input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum TemplateFormat {
    Json,
    Yaml,
}

impl From<TemplateFormat> for MappingFormat {
    fn from(value: TemplateFormat) -> Self {
        match value {
            TemplateFormat::Json => MappingFormat::Json,
            TemplateFormat::Yaml => MappingFormat::Yaml,
        }
    }
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
