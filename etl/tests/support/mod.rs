#![allow(dead_code)]

use async_trait::async_trait;
use common::config::{ClusterConfig, EpochUnit, IamRoleConfig, LoadConfig, S3Config, Settings};
use common::{Error, Result};
use etl::storage::ObjectStorage;
use etl::warehouse::{QueryResult, Warehouse};
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

pub fn settings() -> Settings {
    Settings {
        cluster: ClusterConfig {
            host: "localhost".into(),
            db_name: "dwh".into(),
            db_user: "dwhuser".into(),
            db_password: "secret".into(),
            db_port: 5439,
        },
        iam_role: IamRoleConfig {
            arn: "arn:aws:iam::123456789012:role/dwhRole".into(),
        },
        s3: S3Config {
            log_data: "s3://udacity-dend/log_data".into(),
            log_jsonpath: "s3://udacity-dend/log_json_path.json".into(),
            song_data: "s3://udacity-dend/song_data".into(),
        },
        load: LoadConfig {
            region: "us-west-2".into(),
            ts_unit: EpochUnit::Seconds,
        },
    }
}

/// Records every statement it receives and answers queries from canned
/// results matched by substring.
#[derive(Default)]
pub struct RecordingWarehouse {
    statements: Mutex<Vec<String>>,
    fail_on: Option<String>,
    responses: Vec<(String, QueryResult)>,
    rows_per_statement: u64,
    latency: Option<Duration>,
}

impl RecordingWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects the first statement containing `fragment`.
    pub fn failing_on(fragment: &str) -> Self {
        Self {
            fail_on: Some(fragment.to_string()),
            ..Self::default()
        }
    }

    pub fn with_rows(mut self, rows: u64) -> Self {
        self.rows_per_statement = rows;
        self
    }

    /// Delays every statement by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn respond(mut self, fragment: &str, rows: Vec<Vec<Option<&str>>>) -> Self {
        let result = QueryResult {
            columns: vec!["label".into(), "count".into()],
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(|v| v.map(str::to_string)).collect())
                .collect(),
        };
        self.responses.push((fragment.to_string(), result));
        self
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }

    fn record(&self, sql: &str) -> Result<()> {
        self.statements.lock().unwrap().push(sql.to_string());
        match &self.fail_on {
            Some(fragment) if sql.contains(fragment.as_str()) => Err(Error::Statement(format!(
                "simulated failure at {}",
                fragment
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Warehouse for RecordingWarehouse {
    async fn execute(&self, sql: &str) -> Result<u64> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.record(sql)?;
        Ok(self.rows_per_statement)
    }

    async fn query(&self, sql: &str) -> Result<QueryResult> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.record(sql)?;
        Ok(self
            .responses
            .iter()
            .find(|(fragment, _)| sql.contains(fragment.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_default())
    }
}

/// In-memory object store keyed by `bucket/key`.
#[derive(Default)]
pub struct FakeStorage {
    objects: HashSet<String>,
}

impl FakeStorage {
    pub fn with_objects(objects: &[&str]) -> Self {
        Self {
            objects: objects.iter().map(|o| o.to_string()).collect(),
        }
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn list_objects(&self, bucket: &str, prefix: &str, limit: i32) -> Result<Vec<String>> {
        let wanted = format!("{}/{}", bucket, prefix);
        let mut keys: Vec<String> = self
            .objects
            .iter()
            .filter(|o| o.starts_with(&wanted))
            .map(|o| o[bucket.len() + 1..].to_string())
            .collect();
        keys.sort();
        keys.truncate(limit.max(0) as usize);
        Ok(keys)
    }

    async fn check_file_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        Ok(self.objects.contains(&format!("{}/{}", bucket, key)))
    }
}
