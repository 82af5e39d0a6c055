//! Execution adapter: the destination table the statements run against.

use std::collections::HashMap;

use log::{debug, info};
use postgres::{Client, NoTls, Statement};

use crate::{
    config::ConnectionDetails,
    error::{IngestError, IngestResult},
    statement::InsertStatement,
};

pub trait Destination {
    /// Whether projecting `columns` from `table` succeeds. Both are validated
    /// identifiers by the time this is called.
    fn columns_exist(&mut self, table: &str, columns: &[&str]) -> IngestResult<bool>;

    /// Runs every statement inside one transaction and commits only if all
    /// succeed. Returns the number of rows inserted.
    fn execute_all(&mut self, statements: &[InsertStatement]) -> IngestResult<u64>;
}

/// Executes a generated batch. An empty batch is an error rather than a
/// silent no-op.
pub fn execute<D>(destination: &mut D, statements: &[InsertStatement]) -> IngestResult<u64>
where
    D: Destination + ?Sized,
{
    if statements.is_empty() {
        return Err(IngestError::NoStatements);
    }
    info!("Executing {} statement(s) in one transaction", statements.len());
    let inserted = destination.execute_all(statements)?;
    info!("Committed {inserted} row(s)");
    Ok(inserted)
}

pub struct PgDestination {
    client: Client,
}

impl PgDestination {
    pub fn connect(details: &ConnectionDetails) -> IngestResult<Self> {
        let client = details
            .to_pg_config()
            .connect(NoTls)
            .map_err(|err| IngestError::Connection(describe_pg_error(&err)))?;
        info!(
            "Connected to {}:{}/{} as {}",
            details.host, details.port, details.database, details.user
        );
        Ok(PgDestination { client })
    }
}

impl Destination for PgDestination {
    fn columns_exist(&mut self, table: &str, columns: &[&str]) -> IngestResult<bool> {
        let query = format!("SELECT {} FROM {table} LIMIT 0", columns.join(", "));
        debug!("Checking destination columns with: {query}");
        match self.client.query(query.as_str(), &[]) {
            Ok(_) => Ok(true),
            Err(err) if err.as_db_error().is_some() => {
                debug!("Projection failed: {}", describe_pg_error(&err));
                Ok(false)
            }
            Err(err) => Err(IngestError::Connection(describe_pg_error(&err))),
        }
    }

    fn execute_all(&mut self, statements: &[InsertStatement]) -> IngestResult<u64> {
        let mut transaction = self
            .client
            .transaction()
            .map_err(|err| IngestError::Connection(describe_pg_error(&err)))?;
        let mut prepared: HashMap<&str, Statement> = HashMap::new();
        let mut inserted = 0u64;
        for (idx, statement) in statements.iter().enumerate() {
            let execution_error = |err: postgres::Error| IngestError::Execution {
                index: idx + 1,
                message: describe_pg_error(&err),
            };
            let prepared_statement = match prepared.get(statement.sql()) {
                Some(existing) => existing.clone(),
                None => {
                    let fresh = transaction
                        .prepare(statement.sql())
                        .map_err(execution_error)?;
                    prepared.insert(statement.sql(), fresh.clone());
                    fresh
                }
            };
            // Dropping the transaction on an early return rolls it back.
            inserted += transaction
                .execute(&prepared_statement, &statement.param_refs())
                .map_err(execution_error)?;
        }
        transaction.commit().map_err(|err| IngestError::Execution {
            index: statements.len(),
            message: format!("commit failed: {}", describe_pg_error(&err)),
        })?;
        Ok(inserted)
    }
}

fn describe_pg_error(err: &postgres::Error) -> String {
    match err.as_db_error() {
        Some(db) => match db.detail() {
            Some(detail) => format!("{} ({detail})", db.message()),
            None => db.message().to_string(),
        },
        None => err.to_string(),
    }
}
