//! Error taxonomy for a load run.
//!
//! [`ValueError`] describes why a single cell failed its column rule and is
//! produced by the value parsers in [`crate::data`]. [`IngestError`] is the
//! run-level error every phase returns; command handlers wrap it in
//! `anyhow` context before it reaches `main`.

use thiserror::Error;

/// Why a raw cell value was rejected by its column rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("'{value}' is not a valid number")]
    NotNumeric { value: String },

    #[error("'{value}' is not a valid integer")]
    NotInteger { value: String },

    #[error("'{value}' is outside the {kind} range [{min}, {max}]")]
    OutOfRange {
        value: String,
        kind: &'static str,
        min: i64,
        max: i64,
    },

    #[error("'{value}' is outside the {kind} range")]
    Overflow { value: String, kind: &'static str },

    #[error("'{value}' has more than {limit} fractional digit(s)")]
    TooPrecise { value: String, limit: u32 },

    #[error("'{value}' is not a valid {expected} (expected {format})")]
    Parse {
        value: String,
        expected: &'static str,
        format: &'static str,
    },

    #[error("'{value}' is not a valid boolean")]
    NotBoolean { value: String },

    #[error("'{value}' is not one of the allowed values [{allowed}]")]
    NotAllowed { value: String, allowed: String },
}

impl ValueError {
    pub fn is_range_error(&self) -> bool {
        matches!(
            self,
            ValueError::OutOfRange { .. } | ValueError::Overflow { .. }
        )
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(self, ValueError::Parse { .. })
    }
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Row {row} column '{column}': {source}")]
    Validation {
        column: String,
        row: usize,
        #[source]
        source: ValueError,
    },

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Incomplete column mapping: {}", describe_mapping_gap(.missing, .unexpected))]
    IncompleteMapping {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("No statements to execute")]
    NoStatements,

    #[error("Failed to connect to database: {0}")]
    Connection(String),

    #[error("Statement {index} failed, transaction rolled back: {message}")]
    Execution { index: usize, message: String },

    #[error("Run cancelled before {phase}")]
    Cancelled { phase: &'static str },

    #[error("Failed to read spreadsheet {path}: {message}")]
    Sheet { path: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl IngestError {
    pub fn config(message: impl Into<String>) -> Self {
        IngestError::Configuration(message.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, IngestError::Cancelled { .. })
    }

    /// The value-level cause when this is a validation failure.
    pub fn value_error(&self) -> Option<&ValueError> {
        match self {
            IngestError::Validation { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn describe_mapping_gap(missing: &[String], unexpected: &[String]) -> String {
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("unmapped column(s) {}", missing.join(", ")));
    }
    if !unexpected.is_empty() {
        parts.push(format!(
            "mapping names column(s) not in the sheet {}",
            unexpected.join(", ")
        ));
    }
    parts.join("; ")
}

pub type IngestResult<T> = Result<T, IngestError>;
