//! Read-only reports over the populated star schema.

use crate::models::ReportRow;
use crate::warehouse::{QueryResult, Warehouse};
use common::{Error, Result};
use std::time::Instant;
use tracing::info;

/// Number of rows each report returns.
pub const TOP_N: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExploratoryQuery {
    MostPlayedArtists,
    MostCommonLocations,
}

impl ExploratoryQuery {
    pub const ALL: [ExploratoryQuery; 2] = [
        ExploratoryQuery::MostPlayedArtists,
        ExploratoryQuery::MostCommonLocations,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ExploratoryQuery::MostPlayedArtists => "most_played_artists",
            ExploratoryQuery::MostCommonLocations => "most_common_locations",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ExploratoryQuery::MostPlayedArtists => "Most played artists",
            ExploratoryQuery::MostCommonLocations => "Most common listening locations",
        }
    }

    pub fn to_sql(self) -> String {
        match self {
            ExploratoryQuery::MostPlayedArtists => format!(
                "SELECT artists.name, COUNT(songplay.artist_id) AS artist_listens
FROM songplay
JOIN artists ON songplay.artist_id = artists.artist_id
GROUP BY artists.name
ORDER BY artist_listens DESC
LIMIT {TOP_N}"
            ),
            ExploratoryQuery::MostCommonLocations => format!(
                "SELECT location, COUNT(songplay.location) AS usr_loc
FROM songplay
GROUP BY location
ORDER BY usr_loc DESC
LIMIT {TOP_N}"
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Report {
    pub query: ExploratoryQuery,
    pub rows: Vec<ReportRow>,
    pub elapsed_ms: u64,
}

pub struct QueryRunner;

impl QueryRunner {
    pub async fn run<W>(warehouse: &W, query: ExploratoryQuery) -> Result<Report>
    where
        W: Warehouse + ?Sized,
    {
        let start = Instant::now();
        let result = warehouse
            .query(&query.to_sql())
            .await
            .map_err(|e| Error::query(query.name(), e))?;
        let rows = parse_rows(&result).map_err(|e| Error::query(query.name(), e))?;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        info!(query = query.name(), rows = rows.len(), elapsed_ms, "Report ready");

        Ok(Report {
            query,
            rows,
            elapsed_ms,
        })
    }

    pub async fn run_all<W>(warehouse: &W) -> Result<Vec<Report>>
    where
        W: Warehouse + ?Sized,
    {
        let mut reports = Vec::with_capacity(ExploratoryQuery::ALL.len());
        for query in ExploratoryQuery::ALL {
            reports.push(Self::run(warehouse, query).await?);
        }
        Ok(reports)
    }
}

/// Reads `(label, count)` pairs; a NULL label stays `None`.
fn parse_rows(result: &QueryResult) -> Result<Vec<ReportRow>> {
    result
        .rows
        .iter()
        .map(|row| {
            let label = row.first().cloned().flatten();
            let raw_count = row.get(1).and_then(|v| v.as_deref()).ok_or_else(|| {
                Error::Statement("report row is missing its count column".to_string())
            })?;
            let count = raw_count.parse::<i64>().map_err(|e| {
                Error::Statement(format!("count {:?} is not an integer: {}", raw_count, e))
            })?;
            Ok(ReportRow { label, count })
        })
        .collect()
}
