//! Typed cell values and the parsers that produce them.
//!
//! Every parser takes raw cell text and returns either a typed [`Value`] or a
//! [`ValueError`] naming the offending text and the rule it broke. Parsers are
//! pure; the column descriptor in [`crate::schema`] decides which one applies.

use std::{error::Error, fmt, str::FromStr};

use bytes::BytesMut;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValueError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const REAL_MAX_FRACTION_DIGITS: u32 = 6;
pub const DOUBLE_MAX_FRACTION_DIGITS: u32 = 15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Text(String),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    /// Validated numeric text, cast to `numeric` by the server.
    Numeric(String),
    Real(f32),
    Double(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Text(s) => s.clone(),
            Value::SmallInt(i) => i.to_string(),
            Value::Int(i) => i.to_string(),
            Value::BigInt(i) => i.to_string(),
            Value::Numeric(s) => s.clone(),
            Value::Real(f) => f.to_string(),
            Value::Double(f) => f.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Date(d) => d.format(DATE_FORMAT).to_string(),
            Value::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
        }
    }

    /// Literal SQL spelling, used only when showing statements to the operator.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Boolean(true) => "TRUE".to_string(),
            Value::Boolean(false) => "FALSE".to_string(),
            Value::SmallInt(_)
            | Value::Int(_)
            | Value::BigInt(_)
            | Value::Numeric(_)
            | Value::Real(_)
            | Value::Double(_) => self.as_display(),
            Value::Text(_) | Value::Date(_) | Value::DateTime(_) => {
                quote_literal(&self.as_display())
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>>
    where
        Self: Sized,
    {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Text(v) => bind_text(v, ty, out),
            Value::SmallInt(v) => widen_integer(i64::from(*v), ty, out),
            Value::Int(v) => widen_integer(i64::from(*v), ty, out),
            Value::BigInt(v) => v.to_sql_checked(ty, out),
            Value::Numeric(v) => bind_text(v, ty, out),
            Value::Real(v) => {
                if *ty == Type::FLOAT8 {
                    f64::from(*v).to_sql(ty, out)
                } else {
                    v.to_sql_checked(ty, out)
                }
            }
            Value::Double(v) => v.to_sql_checked(ty, out),
            Value::Boolean(v) => v.to_sql_checked(ty, out),
            Value::Date(v) => {
                if *ty == Type::TIMESTAMP {
                    v.and_time(NaiveTime::MIN).to_sql(ty, out)
                } else {
                    v.to_sql_checked(ty, out)
                }
            }
            Value::DateTime(v) => v.to_sql_checked(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool
    where
        Self: Sized,
    {
        true
    }

    to_sql_checked!();
}

// Integers parsed for a narrower declared width still bind into wider columns.
fn widen_integer(
    value: i64,
    ty: &Type,
    out: &mut BytesMut,
) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
    if *ty == Type::INT2 {
        i16::try_from(value)?.to_sql(ty, out)
    } else if *ty == Type::INT4 {
        i32::try_from(value)?.to_sql(ty, out)
    } else {
        value.to_sql_checked(ty, out)
    }
}

// Surrogate key digits are generated as text but may land in a numeric column.
fn bind_text(value: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
    if *ty == Type::INT2 || *ty == Type::INT4 || *ty == Type::INT8 {
        widen_integer(value.parse::<i64>()?, ty, out)
    } else if *ty == Type::NUMERIC {
        Decimal::from_str(value)?.to_sql(ty, out)
    } else {
        value.to_sql_checked(ty, out)
    }
}

/// Date or date-time, distinguished by the presence of a space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timestamp {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Timestamp {
    pub fn into_datetime(self) -> NaiveDateTime {
        match self {
            Timestamp::Date(d) => d.and_time(NaiveTime::MIN),
            Timestamp::DateTime(dt) => dt,
        }
    }
}

/// Integer column widths and their inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    Small,
    Regular,
    Big,
}

impl IntWidth {
    pub fn bounds(self) -> (i64, i64) {
        match self {
            IntWidth::Small => (i64::from(i16::MIN), i64::from(i16::MAX)),
            IntWidth::Regular => (i64::from(i32::MIN), i64::from(i32::MAX)),
            IntWidth::Big => (i64::MIN, i64::MAX),
        }
    }

    pub fn kind(self) -> &'static str {
        match self {
            IntWidth::Small => "smallint",
            IntWidth::Regular => "int",
            IntWidth::Big => "bigint",
        }
    }
}

/// True when the text reads as a finite floating-point number.
pub fn is_numeric(value: &str) -> bool {
    value.parse::<f64>().is_ok_and(f64::is_finite)
}

pub fn parse_integer(value: &str, width: IntWidth) -> Result<Value, ValueError> {
    if !is_numeric(value) {
        return Err(ValueError::NotNumeric {
            value: value.to_string(),
        });
    }
    let (min, max) = width.bounds();
    let out_of_range = || ValueError::OutOfRange {
        value: value.to_string(),
        kind: width.kind(),
        min,
        max,
    };
    let parsed: i128 = match value.parse() {
        Ok(parsed) => parsed,
        Err(_) if is_integer_literal(value) => return Err(out_of_range()),
        Err(_) => {
            return Err(ValueError::NotInteger {
                value: value.to_string(),
            });
        }
    };
    if parsed < i128::from(min) || parsed > i128::from(max) {
        return Err(out_of_range());
    }
    // Bounds were checked above, so the narrowing casts cannot truncate.
    Ok(match width {
        IntWidth::Small => Value::SmallInt(parsed as i16),
        IntWidth::Regular => Value::Int(parsed as i32),
        IntWidth::Big => Value::BigInt(parsed as i64),
    })
}

fn is_integer_literal(value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Counts the fractional digits of the written value once any exponent is
/// applied, so `1.25e1` has one and `5e-3` has three.
pub fn fraction_digits(value: &str) -> u32 {
    let (mantissa, exponent) = match value.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => (mantissa, parse_exponent(exponent)),
        None => (value, 0),
    };
    let written = mantissa
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.len() as i128);
    u32::try_from((written - exponent).max(0)).unwrap_or(u32::MAX)
}

// Exponents too long for i128 saturate; only their sign matters then.
fn parse_exponent(exponent: &str) -> i128 {
    exponent.parse().unwrap_or(if exponent.starts_with('-') {
        i128::from(i64::MIN)
    } else {
        i128::from(i64::MAX)
    })
}

pub fn parse_fractional(value: &str, limit: u32, auto_correct: bool) -> Result<f64, ValueError> {
    if !is_numeric(value) {
        return Err(ValueError::NotNumeric {
            value: value.to_string(),
        });
    }
    let parsed: f64 = value.parse().map_err(|_| ValueError::NotNumeric {
        value: value.to_string(),
    })?;
    if fraction_digits(value) <= limit {
        return Ok(parsed);
    }
    if !auto_correct {
        return Err(ValueError::TooPrecise {
            value: value.to_string(),
            limit,
        });
    }
    Ok(round_float(parsed, limit))
}

// A float with a fractional part is below 2^52, so scaling by at most
// 10^15 stays finite. Whole values are returned untouched.
fn round_float(value: f64, scale: u32) -> f64 {
    if value.fract() == 0.0 {
        return value;
    }
    let factor = 10f64.powi(scale.min(DOUBLE_MAX_FRACTION_DIGITS) as i32);
    (value * factor).round() / factor
}

/// Narrows a checked double to `real`, rejecting values past the f32 range.
pub fn narrow_to_real(value: f64, raw: &str) -> Result<f32, ValueError> {
    let narrowed = value as f32;
    if narrowed.is_finite() {
        Ok(narrowed)
    } else {
        Err(ValueError::Overflow {
            value: raw.to_string(),
            kind: "real",
        })
    }
}

/// Validates numeric text and keeps it as written; PostgreSQL's `numeric`
/// holds every digit, so nothing is rounded here.
pub fn parse_numeric(value: &str) -> Result<String, ValueError> {
    if is_numeric(value) {
        Ok(value.to_string())
    } else {
        Err(ValueError::NotNumeric {
            value: value.to_string(),
        })
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, ValueError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| ValueError::Parse {
        value: value.to_string(),
        expected: "date",
        format: "YYYY-MM-DD",
    })
}

pub fn parse_datetime(value: &str) -> Result<NaiveDateTime, ValueError> {
    NaiveDateTime::parse_from_str(value, DATETIME_FORMAT).map_err(|_| ValueError::Parse {
        value: value.to_string(),
        expected: "datetime",
        format: "YYYY-MM-DD HH:MM:SS",
    })
}

pub fn parse_timestamp(value: &str) -> Result<Timestamp, ValueError> {
    if value.contains(' ') {
        parse_datetime(value).map(Timestamp::DateTime)
    } else {
        parse_date(value).map(Timestamp::Date)
    }
}

pub fn parse_boolean(value: &str) -> Result<bool, ValueError> {
    let lowered = value.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "true" | "t" | "yes" | "y" | "1" => Ok(true),
        "false" | "f" | "no" | "n" | "0" => Ok(false),
        _ => Err(ValueError::NotBoolean {
            value: value.to_string(),
        }),
    }
}
