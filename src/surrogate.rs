//! Random digit-string surrogate keys.

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    error::{IngestError, IngestResult},
    ident,
};

pub const MAX_SURROGATE_LENGTH: usize = 255;

/// Builds a string of `length` independently drawn decimal digits.
///
/// Not cryptographically secure and collisions are not checked. With
/// `include_zero` unset every digit is drawn from `1..=9`.
pub fn random_digits(length: usize, include_zero: bool) -> IngestResult<String> {
    if length < 1 {
        return Err(IngestError::config(
            "Random ID length must be greater than 0",
        ));
    }
    let low = if include_zero { 0u8 } else { 1u8 };
    let mut rng = rand::rng();
    Ok((0..length)
        .map(|_| char::from(b'0' + rng.random_range(low..=9)))
        .collect())
}

/// A generated key column appended to every inserted row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurrogateKey {
    #[serde(rename = "columnName")]
    column: String,
    length: usize,
    #[serde(default = "SurrogateKey::default_include_zero")]
    include_zero: bool,
}

impl SurrogateKey {
    pub fn new(column: impl Into<String>, length: usize) -> IngestResult<Self> {
        let key = SurrogateKey {
            column: column.into(),
            length,
            include_zero: true,
        };
        key.ensure_valid()?;
        Ok(key)
    }

    pub fn with_include_zero(mut self, include_zero: bool) -> Self {
        self.include_zero = include_zero;
        self
    }

    pub const fn default_include_zero() -> bool {
        true
    }

    pub fn ensure_valid(&self) -> IngestResult<()> {
        ident::ensure_identifier("Random ID column name", &self.column)?;
        if !(1..=MAX_SURROGATE_LENGTH).contains(&self.length) {
            return Err(IngestError::config(format!(
                "Random ID length must be between 1 and {MAX_SURROGATE_LENGTH}, got {}",
                self.length
            )));
        }
        Ok(())
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn include_zero(&self) -> bool {
        self.include_zero
    }

    pub fn generate(&self) -> IngestResult<String> {
        let value = random_digits(self.length, self.include_zero)?;
        debug!("Generated {} value {value}", self.column);
        Ok(value)
    }
}
