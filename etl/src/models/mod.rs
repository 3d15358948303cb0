mod report;
mod table;

pub use report::{PhaseReport, ReportRow, RunSummary, StatementOutcome};
pub use table::{Table, TableKind};
