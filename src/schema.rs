//! Declared column types and the per-column descriptor.
//!
//! [`ColumnType`] is the closed set of PostgreSQL types the loader knows how
//! to validate, plus [`ColumnType::Custom`] for enumerated or other
//! user-defined types that are passed through as text. [`ColumnSpec`] binds a
//! spreadsheet column to a destination column and a type, and converts raw
//! cell text into a bindable [`Value`].

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::{
    data::{
        self, DOUBLE_MAX_FRACTION_DIGITS, IntWidth, REAL_MAX_FRACTION_DIGITS, Value,
    },
    error::{IngestError, IngestResult, ValueError},
    ident,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnType {
    SmallInt,
    Int,
    BigInt,
    Numeric,
    Real,
    Double,
    Boolean,
    Date,
    DateTime,
    Char,
    VarChar,
    Text,
    /// An enumerator or other user-defined type, named by a valid identifier.
    Custom(String),
}

impl ColumnType {
    pub fn as_str(&self) -> &str {
        match self {
            ColumnType::SmallInt => "smallint",
            ColumnType::Int => "int",
            ColumnType::BigInt => "bigint",
            ColumnType::Numeric => "numeric",
            ColumnType::Real => "real",
            ColumnType::Double => "double",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::DateTime => "datetime",
            ColumnType::Char => "char",
            ColumnType::VarChar => "varchar",
            ColumnType::Text => "text",
            ColumnType::Custom(name) => name,
        }
    }

    pub fn variants() -> &'static [&'static str] {
        &[
            "smallint", "int", "bigint", "numeric", "real", "double", "boolean", "date",
            "datetime", "char", "varchar", "text",
        ]
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, ColumnType::Custom(_))
    }

    pub fn is_text_like(&self) -> bool {
        matches!(
            self,
            ColumnType::Char | ColumnType::VarChar | ColumnType::Text
        )
    }

    /// Type the bound parameter is cast to in statement text, if any.
    ///
    /// Custom types and `numeric` travel as text and are converted by the
    /// server, which keeps every digit of a numeric cell.
    pub fn placeholder_cast(&self) -> Option<&str> {
        match self {
            ColumnType::Custom(name) => Some(name),
            ColumnType::Numeric => Some("numeric"),
            _ => None,
        }
    }

    fn from_known(token: &str) -> Option<Self> {
        let ty = match token {
            "smallint" | "int2" => ColumnType::SmallInt,
            "int" | "integer" | "int4" => ColumnType::Int,
            "bigint" | "int8" => ColumnType::BigInt,
            "numeric" | "decimal" => ColumnType::Numeric,
            "real" | "float4" => ColumnType::Real,
            "double" | "double precision" | "float8" => ColumnType::Double,
            "boolean" | "bool" => ColumnType::Boolean,
            "date" => ColumnType::Date,
            "datetime" | "timestamp" => ColumnType::DateTime,
            "char" | "character" => ColumnType::Char,
            "varchar" | "character varying" => ColumnType::VarChar,
            "text" => ColumnType::Text,
            _ => return None,
        };
        Some(ty)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = IngestError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if let Some(known) = ColumnType::from_known(&trimmed.to_ascii_lowercase()) {
            return Ok(known);
        }
        if ident::is_valid_identifier(trimmed) {
            return Ok(ColumnType::Custom(trimmed.to_string()));
        }
        Err(IngestError::config(format!(
            "Unknown column type '{value}'. Supported types: {} (or a custom type name)",
            ColumnType::variants().join(", ")
        )))
    }
}

impl Serialize for ColumnType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        ColumnType::from_str(&token).map_err(|err| de::Error::custom(err.to_string()))
    }
}

/// Column Type Descriptor: where a spreadsheet column lands and how its cells
/// are validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    source: String,
    target: String,
    column_type: ColumnType,
    allowed_values: Option<BTreeSet<String>>,
}

impl ColumnSpec {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        column_type: ColumnType,
    ) -> IngestResult<Self> {
        let spec = ColumnSpec {
            source: source.into(),
            target: target.into(),
            column_type,
            allowed_values: None,
        };
        if spec.source.trim().is_empty() {
            return Err(IngestError::config("Spreadsheet column name cannot be empty"));
        }
        ident::ensure_identifier("Database column name", &spec.target)?;
        if let ColumnType::Custom(name) = &spec.column_type {
            ident::ensure_identifier("Custom type", name)?;
        }
        Ok(spec)
    }

    pub fn with_allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        self.allowed_values = if set.is_empty() { None } else { Some(set) };
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn column_type(&self) -> &ColumnType {
        &self.column_type
    }

    pub fn allowed_values(&self) -> Option<&BTreeSet<String>> {
        self.allowed_values.as_ref()
    }

    /// Converts one raw cell into the value bound for this column.
    ///
    /// An empty cell is NULL unless an allowed-value set excludes it. The
    /// allowed-value check runs before the type rule for every type.
    pub fn parse(&self, raw: &str, auto_correct: bool) -> Result<Value, ValueError> {
        if let Some(allowed) = &self.allowed_values
            && !allowed.contains(raw)
        {
            return Err(ValueError::NotAllowed {
                value: raw.to_string(),
                allowed: allowed.iter().cloned().collect::<Vec<_>>().join(", "),
            });
        }
        if raw.is_empty() {
            return Ok(Value::Null);
        }
        let value = match &self.column_type {
            ColumnType::Char | ColumnType::VarChar | ColumnType::Text | ColumnType::Custom(_) => {
                Value::Text(raw.to_string())
            }
            ColumnType::SmallInt => data::parse_integer(raw, IntWidth::Small)?,
            ColumnType::Int => data::parse_integer(raw, IntWidth::Regular)?,
            ColumnType::BigInt => data::parse_integer(raw, IntWidth::Big)?,
            ColumnType::Numeric => Value::Numeric(data::parse_numeric(raw)?),
            ColumnType::Real => {
                let parsed = data::parse_fractional(raw, REAL_MAX_FRACTION_DIGITS, auto_correct)?;
                Value::Real(data::narrow_to_real(parsed, raw)?)
            }
            ColumnType::Double => Value::Double(data::parse_fractional(
                raw,
                DOUBLE_MAX_FRACTION_DIGITS,
                auto_correct,
            )?),
            ColumnType::Boolean => Value::Boolean(data::parse_boolean(raw)?),
            ColumnType::Date => Value::Date(data::parse_date(raw)?),
            ColumnType::DateTime => Value::DateTime(data::parse_timestamp(raw)?.into_datetime()),
        };
        Ok(value)
    }
}
