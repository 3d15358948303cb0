use super::{QueryResult, Warehouse};
use async_trait::async_trait;
use common::config::ClusterConfig;
use common::{Error, Result};
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};
use tracing::{error, info};

/// A single Redshift connection.
///
/// Statements go over the simple-query protocol: Redshift `COPY` and DDL
/// gain nothing from server-side prepares.
pub struct RedshiftWarehouse {
    client: Client,
}

impl RedshiftWarehouse {
    pub async fn connect(cluster: &ClusterConfig) -> Result<Self> {
        let endpoint = format!(
            "{}@{}:{}/{}",
            cluster.db_user, cluster.host, cluster.db_port, cluster.db_name
        );

        let mut config = tokio_postgres::Config::new();
        config
            .host(&cluster.host)
            .port(cluster.db_port)
            .dbname(&cluster.db_name)
            .user(&cluster.db_user)
            .password(&cluster.db_password);

        let (client, connection) = config.connect(NoTls).await.map_err(|e| {
            Error::Connection(format!("Failed to connect to {}: {}", endpoint, e))
        })?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(error = %e, "Warehouse connection error");
            }
        });

        info!(%endpoint, "Connected to warehouse");
        Ok(Self { client })
    }
}

#[async_trait]
impl Warehouse for RedshiftWarehouse {
    async fn execute(&self, sql: &str) -> Result<u64> {
        let messages = self.client.simple_query(sql).await?;

        let rows_affected = messages
            .iter()
            .filter_map(|message| match message {
                SimpleQueryMessage::CommandComplete(rows) => Some(*rows),
                _ => None,
            })
            .sum();

        Ok(rows_affected)
    }

    async fn query(&self, sql: &str) -> Result<QueryResult> {
        let messages = self.client.simple_query(sql).await?;

        let mut result = QueryResult::default();
        for message in &messages {
            if let SimpleQueryMessage::Row(row) = message {
                if result.columns.is_empty() {
                    result.columns = row
                        .columns()
                        .iter()
                        .map(|c| c.name().to_string())
                        .collect();
                }
                let values = (0..row.len())
                    .map(|idx| row.get(idx).map(str::to_string))
                    .collect();
                result.rows.push(values);
            }
        }

        Ok(result)
    }
}
