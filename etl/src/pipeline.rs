use crate::explore::QueryRunner;
use crate::loader::BulkLoader;
use crate::models::{PhaseReport, RunSummary, StatementOutcome, Table};
use crate::schema::SchemaManager;
use crate::sql::quote_ident;
use crate::storage::{self, ObjectStorage};
use crate::transform::{TransformPlan, Transformer};
use crate::warehouse::Warehouse;
use chrono::Utc;
use common::config::Settings;
use common::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::time::Instant;
use tracing::{info, info_span, Instrument};

/// Pipeline phases in the only order they may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Drop,
    Create,
    Copy,
    Insert,
    Explore,
}

impl Phase {
    /// Drop through insert; exploration is opt-in.
    pub const LOAD: [Phase; 4] = [Phase::Drop, Phase::Create, Phase::Copy, Phase::Insert];

    pub fn name(self) -> &'static str {
        match self {
            Phase::Drop => "drop",
            Phase::Create => "create",
            Phase::Copy => "copy",
            Phase::Insert => "insert",
            Phase::Explore => "explore",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub struct Pipeline {
    schema: SchemaManager,
    loader: BulkLoader,
    transformer: Transformer,
}

impl Pipeline {
    /// Builds every phase from `settings`. Invalid configuration fails
    /// here, before a single statement reaches the warehouse.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            schema: SchemaManager::new(),
            loader: BulkLoader::from_settings(settings)?,
            transformer: Transformer::new(TransformPlan::standard(), settings.load.ts_unit),
        })
    }

    pub fn new(schema: SchemaManager, loader: BulkLoader, transformer: Transformer) -> Self {
        Self {
            schema,
            loader,
            transformer,
        }
    }

    /// Checks the S3 sources of the load phase.
    pub async fn verify_sources(&self, store: &dyn ObjectStorage) -> Result<()> {
        storage::verify_sources(store, &self.loader).await
    }

    /// Runs `phases`, which must be in canonical order without repeats.
    /// The first failing statement stops the run and its error is returned.
    pub async fn run<W>(&self, warehouse: &W, phases: &[Phase]) -> Result<RunSummary>
    where
        W: Warehouse + ?Sized,
    {
        if let Some(pair) = phases.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(Error::Ordering(format!(
                "phase {} cannot run after {}",
                pair[1], pair[0]
            )));
        }

        let started_at = Utc::now();
        let mut reports = Vec::with_capacity(phases.len());
        for phase in phases {
            let span = info_span!("phase", phase = phase.name());
            let report = self.run_phase(warehouse, *phase).instrument(span).await?;
            info!(
                phase = phase.name(),
                statements = report.statements.len(),
                rows_affected = report.rows_affected(),
                elapsed_ms = report.elapsed_ms,
                "Phase complete"
            );
            reports.push(report);
        }

        Ok(RunSummary {
            started_at,
            finished_at: Utc::now(),
            phases: reports,
        })
    }

    async fn run_phase<W>(&self, warehouse: &W, phase: Phase) -> Result<PhaseReport>
    where
        W: Warehouse + ?Sized,
    {
        match phase {
            Phase::Drop => self.schema.drop_tables(warehouse).await,
            Phase::Create => self.schema.create_tables(warehouse).await,
            Phase::Copy => self.loader.load(warehouse).await,
            Phase::Insert => self.transformer.transform(warehouse).await,
            Phase::Explore => {
                let start = Instant::now();
                let mut statements = Vec::new();
                for report in QueryRunner::run_all(warehouse).await? {
                    for row in &report.rows {
                        info!(
                            report = report.query.name(),
                            label = row.label.as_deref().unwrap_or("<null>"),
                            count = row.count,
                            "Report row"
                        );
                    }
                    statements.push(StatementOutcome {
                        target: report.query.name().to_string(),
                        rows_affected: report.rows.len() as u64,
                        elapsed_ms: report.elapsed_ms,
                    });
                }
                Ok(PhaseReport {
                    phase,
                    statements,
                    elapsed_ms: start.elapsed().as_millis() as u64,
                })
            }
        }
    }

    /// Row counts for every table, in creation order.
    pub async fn table_counts<W>(&self, warehouse: &W) -> Result<Vec<(Table, i64)>>
    where
        W: Warehouse + ?Sized,
    {
        let mut counts = Vec::with_capacity(self.schema.create_order().len());
        for table in self.schema.create_order() {
            let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table.name()));
            let result = warehouse
                .query(&sql)
                .await
                .map_err(|e| Error::query(format!("count_{}", table), e))?;

            let raw = result
                .rows
                .first()
                .and_then(|row| row.first())
                .and_then(|value| value.as_deref())
                .ok_or_else(|| {
                    Error::query(
                        format!("count_{}", table),
                        Error::Statement("COUNT(*) returned no value".to_string()),
                    )
                })?;
            let count = raw.parse::<i64>().map_err(|e| {
                Error::query(
                    format!("count_{}", table),
                    Error::Statement(format!("{:?} is not a count: {}", raw, e)),
                )
            })?;
            counts.push((*table, count));
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_sort_canonically() {
        let mut phases = vec![Phase::Insert, Phase::Drop, Phase::Explore, Phase::Copy, Phase::Create];
        phases.sort();
        assert_eq!(
            phases,
            vec![Phase::Drop, Phase::Create, Phase::Copy, Phase::Insert, Phase::Explore]
        );
        assert_eq!(Phase::LOAD.len(), 4);
    }

    #[test]
    fn phase_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Phase::Copy).unwrap(), "\"copy\"");
    }
}
