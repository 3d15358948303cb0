//! The seam between statement builders and the database that runs them.

pub mod redshift;

pub use redshift::RedshiftWarehouse;

use crate::models::StatementOutcome;
use async_trait::async_trait;
use common::Result;
use std::time::Instant;
use tracing::{debug, info};

/// Rows returned by a read-only statement, every value in its text form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// A warehouse connection. Statements are sent one at a time, in call order.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Runs a statement and returns the number of rows it affected.
    async fn execute(&self, sql: &str) -> Result<u64>;

    async fn query(&self, sql: &str) -> Result<QueryResult>;
}

/// Executes one statement, logging its target and timing.
pub async fn run_statement<W>(warehouse: &W, target: &str, sql: &str) -> Result<StatementOutcome>
where
    W: Warehouse + ?Sized,
{
    debug!(target_table = target, sql, "Executing statement");
    let start = Instant::now();
    let rows_affected = warehouse.execute(sql).await?;
    let elapsed_ms = start.elapsed().as_millis() as u64;
    info!(target_table = target, rows_affected, elapsed_ms, "Statement complete");

    Ok(StatementOutcome {
        target: target.to_string(),
        rows_affected,
        elapsed_ms,
    })
}
