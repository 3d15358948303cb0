//! Drops and recreates the staging and star-schema tables.

use crate::models::{PhaseReport, Table};
use crate::pipeline::Phase;
use crate::warehouse::{Warehouse, run_statement};
use common::{Error, Result};
use std::time::Instant;
use tracing::info;

/// Staging tables first, then dimensions, then the fact table.
pub const CREATE_ORDER: [Table; 7] = [
    Table::StagingEvents,
    Table::StagingSongs,
    Table::Users,
    Table::Artists,
    Table::Songs,
    Table::Times,
    Table::Songplay,
];

pub struct SchemaManager {
    create_order: Vec<Table>,
}

impl SchemaManager {
    pub fn new() -> Self {
        Self {
            create_order: CREATE_ORDER.to_vec(),
        }
    }

    /// Builds a manager for a custom table sequence.
    ///
    /// Every table must come after the tables it references, so creates
    /// succeed in order and drops (run in reverse) never strand a dependent.
    pub fn with_order(create_order: Vec<Table>) -> Result<Self> {
        for (position, table) in create_order.iter().enumerate() {
            if create_order[..position].contains(table) {
                return Err(Error::Ordering(format!("table {} listed twice", table)));
            }
            for referenced in table.references() {
                let earlier = create_order[..position].contains(referenced);
                if !earlier {
                    return Err(Error::Ordering(format!(
                        "table {} references {}, which is not created before it",
                        table, referenced
                    )));
                }
            }
        }
        Ok(Self { create_order })
    }

    pub fn create_order(&self) -> &[Table] {
        &self.create_order
    }

    pub fn drop_order(&self) -> Vec<Table> {
        self.create_order.iter().rev().copied().collect()
    }

    pub async fn drop_tables<W>(&self, warehouse: &W) -> Result<PhaseReport>
    where
        W: Warehouse + ?Sized,
    {
        let start = Instant::now();
        let mut statements = Vec::with_capacity(self.create_order.len());
        for table in self.drop_order() {
            let outcome = run_statement(warehouse, table.name(), &table.drop_sql())
                .await
                .map_err(|e| Error::schema(table.name(), e))?;
            statements.push(outcome);
        }
        info!(tables = statements.len(), "Dropped tables");

        Ok(PhaseReport {
            phase: Phase::Drop,
            statements,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }

    pub async fn create_tables<W>(&self, warehouse: &W) -> Result<PhaseReport>
    where
        W: Warehouse + ?Sized,
    {
        let start = Instant::now();
        let mut statements = Vec::with_capacity(self.create_order.len());
        for table in &self.create_order {
            let outcome = run_statement(warehouse, table.name(), &table.create_sql())
                .await
                .map_err(|e| Error::schema(table.name(), e))?;
            statements.push(outcome);
        }
        info!(tables = statements.len(), "Created tables");

        Ok(PhaseReport {
            phase: Phase::Create,
            statements,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }
}

impl Default for SchemaManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_order_is_valid() {
        let manager = SchemaManager::with_order(CREATE_ORDER.to_vec()).unwrap();
        assert_eq!(manager.create_order(), &CREATE_ORDER);
    }

    #[test]
    fn drops_run_dependents_first() {
        let drops = SchemaManager::new().drop_order();
        assert_eq!(drops.first(), Some(&Table::Songplay));
        assert_eq!(drops.last(), Some(&Table::StagingEvents));

        let pos = |t: Table| drops.iter().position(|d| *d == t).unwrap();
        for table in CREATE_ORDER {
            for referenced in table.references() {
                assert!(pos(table) < pos(*referenced));
            }
        }
    }

    #[test]
    fn rejects_fact_before_dimensions() {
        let order = vec![
            Table::StagingEvents,
            Table::StagingSongs,
            Table::Songplay,
            Table::Users,
            Table::Artists,
            Table::Songs,
            Table::Times,
        ];
        let err = SchemaManager::with_order(order).err().unwrap();
        assert!(matches!(err, Error::Ordering(_)));
    }

    #[test]
    fn rejects_songs_before_artists() {
        let order = vec![Table::Songs, Table::Artists];
        assert!(SchemaManager::with_order(order).is_err());
    }

    #[test]
    fn rejects_duplicates() {
        let order = vec![Table::Users, Table::Users];
        assert!(SchemaManager::with_order(order).is_err());
    }
}
