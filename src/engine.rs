//! Conversion and statement engine.
//!
//! An [`InsertPlan`] ties a frozen column mapping to a destination table and
//! an optional surrogate key. Generation runs in phases: mapping coverage,
//! target validation, row conversion, then statement rendering. The first
//! failure in any phase aborts the run before anything reaches the database.

use log::{debug, info};

use crate::{
    cancel::CancelFlag,
    data::Value,
    destination::Destination,
    error::{IngestError, IngestResult},
    ident,
    mapping::ColumnMapping,
    sheet::Sheet,
    statement::{BoundColumn, InsertStatement},
    surrogate::SurrogateKey,
};

/// One converted data row, still tied to its spreadsheet row number.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedRow {
    pub number: usize,
    pub columns: Vec<BoundColumn>,
}

#[derive(Debug, Clone)]
pub struct InsertPlan {
    table: String,
    mapping: ColumnMapping,
    surrogate: Option<SurrogateKey>,
    auto_correct: bool,
}

impl InsertPlan {
    pub fn new(
        table: &str,
        mapping: ColumnMapping,
        surrogate: Option<SurrogateKey>,
    ) -> IngestResult<Self> {
        ident::ensure_table_name(table)?;
        if let Some(key) = &surrogate {
            key.ensure_valid()?;
            if mapping.targets().contains(&key.column()) {
                return Err(IngestError::config(format!(
                    "Surrogate key column '{}' is already the target of a mapped column",
                    key.column()
                )));
            }
        }
        Ok(InsertPlan {
            table: table.to_string(),
            mapping,
            surrogate,
            auto_correct: false,
        })
    }

    /// Round over-precise real/double values instead of rejecting them.
    pub fn with_auto_correct(mut self, auto_correct: bool) -> Self {
        self.auto_correct = auto_correct;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Mapped targets in header order, then the surrogate key column.
    pub fn target_columns(&self) -> Vec<&str> {
        let mut targets = self.mapping.targets();
        if let Some(key) = &self.surrogate {
            targets.push(key.column());
        }
        targets
    }

    pub fn ensure_identifiers(&self) -> IngestResult<()> {
        ident::ensure_table_name(&self.table)?;
        for target in self.target_columns() {
            ident::ensure_identifier("column name", target)?;
        }
        Ok(())
    }

    /// Confirms the destination table exposes every target column.
    pub fn verify_targets<D>(&self, destination: &mut D) -> IngestResult<()>
    where
        D: Destination + ?Sized,
    {
        self.ensure_identifiers()
            .map_err(|err| IngestError::SchemaMismatch(err.to_string()))?;
        let targets = self.target_columns();
        if destination.columns_exist(&self.table, &targets)? {
            debug!(
                "Destination table {} has columns {}",
                self.table,
                targets.join(", ")
            );
            Ok(())
        } else {
            Err(IngestError::SchemaMismatch(format!(
                "table '{}' does not expose all of the columns: {}",
                self.table,
                targets.join(", ")
            )))
        }
    }

    /// Parses every data row. Fails on the first invalid cell.
    pub fn convert_rows(&self, sheet: &Sheet, cancel: &CancelFlag) -> IngestResult<Vec<ConvertedRow>> {
        self.mapping.ensure_covers(sheet.headers())?;
        let positions: Vec<usize> = self
            .mapping
            .columns()
            .iter()
            .map(|spec| {
                sheet
                    .headers()
                    .iter()
                    .position(|header| header == spec.source())
                    .ok_or_else(|| IngestError::IncompleteMapping {
                        missing: Vec::new(),
                        unexpected: vec![spec.source().to_string()],
                    })
            })
            .collect::<IngestResult<_>>()?;

        let mut converted = Vec::with_capacity(sheet.rows().len());
        let mut skipped = 0usize;
        for (number, row) in sheet.numbered_rows() {
            cancel.checkpoint("row conversion")?;
            if row.iter().all(|cell| cell.trim().is_empty()) {
                skipped += 1;
                continue;
            }
            converted.push(self.convert_row(number, row, &positions)?);
        }
        if skipped > 0 {
            debug!("Skipped {skipped} blank row(s)");
        }
        info!(
            "Converted {} row(s) from sheet '{}'",
            converted.len(),
            sheet.name()
        );
        Ok(converted)
    }

    fn convert_row(
        &self,
        number: usize,
        row: &[String],
        positions: &[usize],
    ) -> IngestResult<ConvertedRow> {
        let mut columns = Vec::with_capacity(positions.len() + 1);
        for (spec, &position) in self.mapping.columns().iter().zip(positions) {
            let raw = row.get(position).map(String::as_str).unwrap_or_default();
            let value = spec
                .parse(raw, self.auto_correct)
                .map_err(|source| IngestError::Validation {
                    column: spec.source().to_string(),
                    row: number,
                    source,
                })?;
            columns.push(BoundColumn {
                name: spec.target().to_string(),
                cast: spec.column_type().placeholder_cast().map(str::to_string),
                value,
            });
        }
        if let Some(key) = &self.surrogate {
            columns.push(BoundColumn {
                name: key.column().to_string(),
                cast: None,
                value: Value::Text(key.generate()?),
            });
        }
        Ok(ConvertedRow { number, columns })
    }

    pub fn render(&self, rows: Vec<ConvertedRow>) -> Vec<InsertStatement> {
        rows.into_iter()
            .map(|row| InsertStatement::new(&self.table, row.columns))
            .collect()
    }

    /// Converts and renders without touching a destination.
    pub fn prepare(&self, sheet: &Sheet, cancel: &CancelFlag) -> IngestResult<Vec<InsertStatement>> {
        self.ensure_identifiers()?;
        let rows = self.convert_rows(sheet, cancel)?;
        Ok(self.render(rows))
    }

    /// Validates targets against `destination`, then converts and renders.
    pub fn generate<D>(
        &self,
        sheet: &Sheet,
        destination: &mut D,
        cancel: &CancelFlag,
    ) -> IngestResult<Vec<InsertStatement>>
    where
        D: Destination + ?Sized,
    {
        cancel.checkpoint("mapping validation")?;
        self.mapping.ensure_covers(sheet.headers())?;
        cancel.checkpoint("target validation")?;
        self.verify_targets(destination)?;
        cancel.checkpoint("row conversion")?;
        let rows = self.convert_rows(sheet, cancel)?;
        let statements = self.render(rows);
        info!(
            "Generated {} INSERT statement(s) for table {}",
            statements.len(),
            self.table
        );
        Ok(statements)
    }
}
