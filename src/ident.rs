//! SQL identifier checks.
//!
//! Table and column names are the only strings spliced into statement text.
//! They must pass [`is_valid_identifier`] first; values never go through here
//! and are always bound as parameters.

use crate::error::{IngestError, IngestResult};

/// PostgreSQL truncates identifiers longer than NAMEDATALEN - 1 bytes.
pub const MAX_TABLE_NAME_LEN: usize = 63;

/// First character a letter or underscore, the rest letters, digits,
/// underscores or dollar signs. Empty input is rejected.
pub fn is_valid_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

pub fn ensure_identifier(kind: &str, value: &str) -> IngestResult<()> {
    if is_valid_identifier(value) {
        Ok(())
    } else {
        Err(IngestError::config(format!(
            "{kind} '{value}' is not a valid identifier"
        )))
    }
}

pub fn ensure_table_name(value: &str) -> IngestResult<()> {
    ensure_identifier("Table name", value)?;
    if value.len() > MAX_TABLE_NAME_LEN {
        return Err(IngestError::config(format!(
            "Table name '{value}' is longer than {MAX_TABLE_NAME_LEN} characters"
        )));
    }
    Ok(())
}
