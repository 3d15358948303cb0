//! Bulk loads newline-delimited JSON from S3 into the staging tables.

use crate::models::{PhaseReport, Table};
use crate::pipeline::Phase;
use crate::sql::{IamRoleArn, JsonFormat, Region, S3Uri, quote_ident};
use crate::warehouse::{Warehouse, run_statement};
use common::config::Settings;
use common::{Error, Result};
use std::time::Instant;
use tracing::info;

/// One `COPY ... FROM 's3://...' ... JSON ...` statement.
#[derive(Debug, Clone)]
pub struct CopyStatement {
    pub table: Table,
    pub source: S3Uri,
    pub iam_role: IamRoleArn,
    pub format: JsonFormat,
    pub region: Region,
}

impl CopyStatement {
    pub fn to_sql(&self) -> String {
        format!(
            "COPY {} FROM {}\nIAM_ROLE {}\nJSON {}\nREGION {}",
            quote_ident(self.table.name()),
            self.source.to_literal(),
            self.iam_role.to_literal(),
            self.format.to_literal(),
            self.region.to_literal()
        )
    }
}

pub struct BulkLoader {
    statements: Vec<CopyStatement>,
}

impl BulkLoader {
    /// Validates every configured value; nothing runs when one is bad.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let iam_role = IamRoleArn::parse(&settings.iam_role.arn)?;
        let region = Region::parse(&settings.load.region)?;

        let events = CopyStatement {
            table: Table::StagingEvents,
            source: S3Uri::parse(&settings.s3.log_data)?,
            iam_role: iam_role.clone(),
            format: JsonFormat::parse(&settings.s3.log_jsonpath)?,
            region: region.clone(),
        };

        let songs = CopyStatement {
            table: Table::StagingSongs,
            source: S3Uri::parse(&settings.s3.song_data)?,
            iam_role,
            format: JsonFormat::Auto,
            region,
        };

        Ok(Self {
            statements: vec![events, songs],
        })
    }

    pub fn statements(&self) -> &[CopyStatement] {
        &self.statements
    }

    /// Runs the copies in order. A failed copy aborts the phase; rerun the
    /// whole load after fixing the cause.
    pub async fn load<W>(&self, warehouse: &W) -> Result<PhaseReport>
    where
        W: Warehouse + ?Sized,
    {
        let start = Instant::now();
        let mut statements = Vec::with_capacity(self.statements.len());
        for copy in &self.statements {
            info!(table = %copy.table, source = %copy.source, "Loading staging table");
            let outcome = run_statement(warehouse, copy.table.name(), &copy.to_sql())
                .await
                .map_err(|e| Error::load(copy.table.name(), e))?;
            statements.push(outcome);
        }

        Ok(PhaseReport {
            phase: Phase::Copy,
            statements,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::config::{ClusterConfig, EpochUnit, IamRoleConfig, LoadConfig, S3Config};

    fn settings() -> Settings {
        Settings {
            cluster: ClusterConfig {
                host: "localhost".into(),
                db_name: "dwh".into(),
                db_user: "dwhuser".into(),
                db_password: "secret".into(),
                db_port: 5439,
            },
            iam_role: IamRoleConfig {
                arn: "'arn:aws:iam::123456789012:role/dwhRole'".into(),
            },
            s3: S3Config {
                log_data: "'s3://udacity-dend/log_data'".into(),
                log_jsonpath: "'s3://udacity-dend/log_json_path.json'".into(),
                song_data: "'s3://udacity-dend/song_data'".into(),
            },
            load: LoadConfig {
                region: "us-west-2".into(),
                ts_unit: EpochUnit::Seconds,
            },
        }
    }

    #[test]
    fn events_copy_uses_jsonpaths_file() {
        let loader = BulkLoader::from_settings(&settings()).unwrap();
        let sql = loader.statements()[0].to_sql();
        assert_eq!(
            sql,
            "COPY \"staging_events\" FROM 's3://udacity-dend/log_data'\n\
             IAM_ROLE 'arn:aws:iam::123456789012:role/dwhRole'\n\
             JSON 's3://udacity-dend/log_json_path.json'\n\
             REGION 'us-west-2'"
        );
    }

    #[test]
    fn songs_copy_infers_fields() {
        let loader = BulkLoader::from_settings(&settings()).unwrap();
        let copy = &loader.statements()[1];
        assert_eq!(copy.table, Table::StagingSongs);
        assert!(copy.to_sql().contains("JSON 'auto'"));
        assert!(copy.to_sql().contains("FROM 's3://udacity-dend/song_data'"));
    }

    #[test]
    fn bad_role_fails_before_any_statement() {
        let mut settings = settings();
        settings.iam_role.arn = "arn:aws:iam::123456789012:role/x' REGION 'evil".into();
        let err = BulkLoader::from_settings(&settings).err().unwrap();
        assert!(err.is_config());
    }

    #[test]
    fn bad_region_is_rejected() {
        let mut settings = settings();
        settings.load.region = "us-west-2'; DROP TABLE users; --".into();
        assert!(BulkLoader::from_settings(&settings).is_err());
    }
}
