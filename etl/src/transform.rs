//! Populates the star schema from the staging tables.
//!
//! Each step is one `INSERT ... SELECT DISTINCT`. Some steps read tables
//! filled by earlier steps, so a [`TransformPlan`] is checked against
//! [`TransformStep::depends_on`] before anything runs.

use crate::models::{PhaseReport, Table};
use crate::pipeline::Phase;
use crate::sql::quote_ident;
use crate::warehouse::{Warehouse, run_statement};
use common::config::EpochUnit;
use common::{Error, Result};
use std::fmt;
use std::time::Instant;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformStep {
    Users,
    Songs,
    Songplay,
    Artists,
    Times,
}

impl TransformStep {
    pub fn target(self) -> Table {
        match self {
            TransformStep::Users => Table::Users,
            TransformStep::Songs => Table::Songs,
            TransformStep::Songplay => Table::Songplay,
            TransformStep::Artists => Table::Artists,
            TransformStep::Times => Table::Times,
        }
    }

    /// Steps whose output this step selects from.
    ///
    /// Artists are joined through songplay and times are derived from
    /// songplay start times, so both need songplay filled first.
    pub fn depends_on(self) -> &'static [TransformStep] {
        match self {
            TransformStep::Artists | TransformStep::Times => &[TransformStep::Songplay],
            TransformStep::Users | TransformStep::Songs | TransformStep::Songplay => &[],
        }
    }

    pub fn to_sql(self, ts_unit: EpochUnit) -> String {
        let target = quote_ident(self.target().name());
        match self {
            TransformStep::Users => format!(
                "INSERT INTO {target} (user_id, first_name, last_name, gender, level)
SELECT DISTINCT userId, firstName, lastName, gender, level
FROM staging_events
WHERE staging_events.page = 'NextSong'"
            ),
            // Matches on title only; titles are not unique across artists.
            TransformStep::Songs => format!(
                "INSERT INTO {target} (song_id, title, artist_id, year, duration)
SELECT DISTINCT staging_songs.song_id, staging_songs.title, staging_songs.artist_id, staging_songs.year, staging_songs.duration
FROM staging_songs
WHERE staging_songs.title IN (SELECT staging_events.song FROM staging_events)"
            ),
            TransformStep::Songplay => format!(
                "INSERT INTO {target} (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
SELECT DISTINCT {start_time}, staging_events.userId, staging_events.level, staging_songs.song_id, staging_songs.artist_id, staging_events.sessionId, staging_events.location, staging_events.userAgent
FROM staging_events
JOIN staging_songs
  ON staging_events.artist = staging_songs.artist_name
 AND staging_events.song = staging_songs.title
WHERE staging_events.page = 'NextSong'",
                start_time = start_time_expr(ts_unit)
            ),
            TransformStep::Artists => format!(
                "INSERT INTO {target} (artist_id, name, location, latitude, longitude)
SELECT DISTINCT staging_songs.artist_id, staging_songs.artist_name, staging_songs.artist_location, staging_songs.artist_latitude, staging_songs.artist_longitude
FROM songplay
JOIN staging_songs ON songplay.artist_id = staging_songs.artist_id"
            ),
            TransformStep::Times => format!(
                "INSERT INTO {target} (start_time, hour, day, week, month, year, weekday)
SELECT DISTINCT start_time,
       DATEPART(HOUR, start_time),
       DATEPART(DAY, start_time),
       DATEPART(WEEK, start_time),
       DATEPART(MONTH, start_time),
       DATEPART(YEAR, start_time),
       DATEPART(WEEKDAY, start_time)
FROM songplay"
            ),
        }
    }
}

impl fmt::Display for TransformStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.target().name())
    }
}

fn start_time_expr(ts_unit: EpochUnit) -> &'static str {
    match ts_unit {
        EpochUnit::Seconds => "TIMESTAMP 'epoch' + staging_events.ts * INTERVAL '1 second'",
        EpochUnit::Milliseconds => {
            "TIMESTAMP 'epoch' + (staging_events.ts / 1000) * INTERVAL '1 second'"
        }
    }
}

/// An ordered list of steps in which every step follows its dependencies.
#[derive(Debug, Clone)]
pub struct TransformPlan {
    steps: Vec<TransformStep>,
}

impl TransformPlan {
    pub fn new(steps: Vec<TransformStep>) -> Result<Self> {
        for (position, step) in steps.iter().enumerate() {
            let earlier = &steps[..position];
            if earlier.contains(step) {
                return Err(Error::Ordering(format!("step {} listed twice", step)));
            }
            for dependency in step.depends_on() {
                if !earlier.contains(dependency) {
                    return Err(Error::Ordering(format!(
                        "step {} reads {}, which must be populated first",
                        step, dependency
                    )));
                }
            }
        }
        Ok(Self { steps })
    }

    /// Users and songs straight from staging, then songplay, then the
    /// tables derived from songplay.
    pub fn standard() -> Self {
        Self {
            steps: vec![
                TransformStep::Users,
                TransformStep::Songs,
                TransformStep::Songplay,
                TransformStep::Artists,
                TransformStep::Times,
            ],
        }
    }

    pub fn steps(&self) -> &[TransformStep] {
        &self.steps
    }
}

pub struct Transformer {
    plan: TransformPlan,
    ts_unit: EpochUnit,
}

impl Transformer {
    pub fn new(plan: TransformPlan, ts_unit: EpochUnit) -> Self {
        Self { plan, ts_unit }
    }

    pub fn plan(&self) -> &TransformPlan {
        &self.plan
    }

    /// Runs every step in plan order. A failure stops the phase; rows
    /// inserted by earlier steps stay in place.
    pub async fn transform<W>(&self, warehouse: &W) -> Result<PhaseReport>
    where
        W: Warehouse + ?Sized,
    {
        let start = Instant::now();
        let mut statements = Vec::with_capacity(self.plan.steps.len());
        for step in &self.plan.steps {
            let table = step.target();
            let outcome = run_statement(warehouse, table.name(), &step.to_sql(self.ts_unit))
                .await
                .map_err(|e| Error::transform(table.name(), e))?;
            statements.push(outcome);
        }
        info!(steps = statements.len(), "Populated star schema");

        Ok(PhaseReport {
            phase: Phase::Insert,
            statements,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }
}
