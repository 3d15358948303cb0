use crate::pipeline::Phase;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One line of an exploratory report: a label and how often it occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub label: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatementOutcome {
    pub target: String,
    pub rows_affected: u64,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseReport {
    pub phase: Phase,
    pub statements: Vec<StatementOutcome>,
    pub elapsed_ms: u64,
}

impl PhaseReport {
    pub fn rows_affected(&self) -> u64 {
        self.statements.iter().map(|s| s.rows_affected).sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub phases: Vec<PhaseReport>,
}

impl RunSummary {
    pub fn statement_count(&self) -> usize {
        self.phases.iter().map(|p| p.statements.len()).sum()
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
