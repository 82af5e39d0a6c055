//! Column mapping: the builder that accumulates descriptors, the frozen
//! mapping the engine consumes, and the JSON/YAML descriptor file.
//!
//! A [`ColumnMapping`] can only be obtained from
//! [`ColumnMappingBuilder::build`], which refuses to freeze until every
//! spreadsheet header has exactly one descriptor.
//!
//! ## File format
//!
//! Either a bare list of column records:
//!
//! ```json
//! [{ "columnName": "Name", "dbColumnName": "person_name", "columnType": "text" }]
//! ```
//!
//! or an object that may also carry a surrogate key:
//!
//! ```yaml
//! columns:
//!   - columnName: Name
//!     dbColumnName: person_name
//!     columnType: text
//!     allowedValues: [Alice, Bob]
//! surrogateKey:
//!   columnName: row_id
//!   length: 6
//! ```

use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::Path,
    str::FromStr,
};

use heck::ToSnakeCase;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    error::{IngestError, IngestResult},
    ident,
    schema::{ColumnSpec, ColumnType},
    surrogate::SurrogateKey,
};

/// Accumulates column descriptors against a fixed header list.
#[derive(Debug, Clone)]
pub struct ColumnMappingBuilder {
    headers: Vec<String>,
    specs: BTreeMap<String, ColumnSpec>,
}

impl ColumnMappingBuilder {
    pub fn new(headers: &[String]) -> Self {
        ColumnMappingBuilder {
            headers: headers.to_vec(),
            specs: BTreeMap::new(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Headers that still have no descriptor, in sheet order.
    pub fn remaining(&self) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|h| !self.specs.contains_key(h.as_str()))
            .map(String::as_str)
            .collect()
    }

    pub fn is_target_taken(&self, target: &str) -> bool {
        self.specs.values().any(|spec| spec.target() == target)
    }

    pub fn insert(&mut self, spec: ColumnSpec) -> IngestResult<()> {
        if !self.headers.iter().any(|h| h == spec.source()) {
            return Err(IngestError::config(format!(
                "Column name '{}' not found in the active sheet",
                spec.source()
            )));
        }
        if self.specs.contains_key(spec.source()) {
            return Err(IngestError::config(format!(
                "Column '{}' is mapped more than once",
                spec.source()
            )));
        }
        if self.is_target_taken(spec.target()) {
            return Err(IngestError::config(format!(
                "Database column '{}' is the target of more than one spreadsheet column",
                spec.target()
            )));
        }
        debug!(
            "Mapped '{}' -> {} ({})",
            spec.source(),
            spec.target(),
            spec.column_type()
        );
        self.specs.insert(spec.source().to_string(), spec);
        Ok(())
    }

    pub fn build(mut self) -> IngestResult<ColumnMapping> {
        let missing: Vec<String> = self.remaining().into_iter().map(str::to_string).collect();
        if !missing.is_empty() {
            return Err(IngestError::IncompleteMapping {
                missing,
                unexpected: Vec::new(),
            });
        }
        let columns = self
            .headers
            .iter()
            .filter_map(|header| self.specs.remove(header))
            .collect();
        Ok(ColumnMapping { columns })
    }
}

/// A complete, validated mapping in sheet header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    columns: Vec<ColumnSpec>,
}

impl ColumnMapping {
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn get(&self, source: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|spec| spec.source() == source)
    }

    pub fn targets(&self) -> Vec<&str> {
        self.columns.iter().map(ColumnSpec::target).collect()
    }

    /// Fails unless this mapping's sources are exactly `headers`.
    pub fn ensure_covers(&self, headers: &[String]) -> IngestResult<()> {
        let sources: HashSet<&str> = self.columns.iter().map(ColumnSpec::source).collect();
        let header_set: HashSet<&str> = headers.iter().map(String::as_str).collect();
        let missing: Vec<String> = headers
            .iter()
            .filter(|h| !sources.contains(h.as_str()))
            .cloned()
            .collect();
        let unexpected: Vec<String> = self
            .columns
            .iter()
            .map(ColumnSpec::source)
            .filter(|s| !header_set.contains(s))
            .map(str::to_string)
            .collect();
        if missing.is_empty() && unexpected.is_empty() {
            Ok(())
        } else {
            Err(IngestError::IncompleteMapping {
                missing,
                unexpected,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRecord {
    pub column_name: String,
    pub db_column_name: String,
    pub column_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
}

impl ColumnRecord {
    fn to_spec(&self, position: usize) -> IngestResult<ColumnSpec> {
        if self.column_name.is_empty()
            || self.db_column_name.is_empty()
            || self.column_type.trim().is_empty()
        {
            return Err(IngestError::config(format!(
                "Mapping entry {position} must set columnName, dbColumnName and columnType"
            )));
        }
        let column_type = ColumnType::from_str(&self.column_type)?;
        let spec = ColumnSpec::new(&self.column_name, &self.db_column_name, column_type)?;
        Ok(spec.with_allowed_values(self.allowed_values.iter().cloned()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingFormat {
    Json,
    Yaml,
}

impl MappingFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                MappingFormat::Yaml
            }
            _ => MappingFormat::Json,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingFile {
    pub columns: Vec<ColumnRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surrogate_key: Option<SurrogateKey>,
}

impl MappingFile {
    pub fn load(path: &Path) -> IngestResult<Self> {
        let text = fs::read_to_string(path).map_err(|err| {
            IngestError::config(format!("Failed to open mapping file {path:?}: {err}"))
        })?;
        let mapping = Self::parse(&text, MappingFormat::from_path(path))?;
        info!(
            "Loaded {} column mapping(s) from {:?}",
            mapping.columns.len(),
            path
        );
        Ok(mapping)
    }

    pub fn parse(text: &str, format: MappingFormat) -> IngestResult<Self> {
        let document: serde_json::Value = match format {
            MappingFormat::Json => serde_json::from_str(text)
                .map_err(|err| IngestError::config(format!("Invalid JSON mapping: {err}")))?,
            MappingFormat::Yaml => serde_yaml::from_str(text)
                .map_err(|err| IngestError::config(format!("Invalid YAML mapping: {err}")))?,
        };
        let mapping = if document.is_array() {
            let columns: Vec<ColumnRecord> = serde_json::from_value(document)
                .map_err(|err| IngestError::config(format!("Invalid mapping structure: {err}")))?;
            MappingFile {
                columns,
                surrogate_key: None,
            }
        } else {
            serde_json::from_value(document)
                .map_err(|err| IngestError::config(format!("Invalid mapping structure: {err}")))?
        };
        if let Some(key) = &mapping.surrogate_key {
            key.ensure_valid()?;
        }
        Ok(mapping)
    }

    /// Validates every record against the sheet headers and freezes the result.
    pub fn resolve(&self, headers: &[String]) -> IngestResult<ColumnMapping> {
        let mut builder = ColumnMappingBuilder::new(headers);
        for (idx, record) in self.columns.iter().enumerate() {
            builder.insert(record.to_spec(idx + 1)?)?;
        }
        builder.build()
    }

    /// A starting point that maps every header to a `text` column.
    pub fn template(headers: &[String]) -> Self {
        let mut used = HashSet::new();
        let columns = headers
            .iter()
            .map(|header| {
                let base = suggest_identifier(header);
                let mut candidate = base.clone();
                let mut suffix = 2;
                while !used.insert(candidate.clone()) {
                    candidate = format!("{base}_{suffix}");
                    suffix += 1;
                }
                ColumnRecord {
                    column_name: header.clone(),
                    db_column_name: candidate,
                    column_type: ColumnType::Text.to_string(),
                    allowed_values: Vec::new(),
                }
            })
            .collect();
        MappingFile {
            columns,
            surrogate_key: None,
        }
    }

    pub fn to_string_pretty(&self, format: MappingFormat) -> IngestResult<String> {
        match format {
            MappingFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|err| IngestError::config(format!("Serializing mapping: {err}"))),
            MappingFormat::Yaml => serde_yaml::to_string(self)
                .map_err(|err| IngestError::config(format!("Serializing mapping: {err}"))),
        }
    }
}

/// Turns a free-form header into a lower snake case identifier.
pub fn suggest_identifier(header: &str) -> String {
    let snake: String = header
        .to_snake_case()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    let candidate = match snake.chars().next() {
        None => "column".to_string(),
        Some(first) if first.is_ascii_digit() => format!("_{snake}"),
        Some(_) => snake,
    };
    debug_assert!(ident::is_valid_identifier(&candidate));
    candidate
}
