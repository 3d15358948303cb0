use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Environment variables prefixed with this override file values,
/// e.g. `DWH_CLUSTER__DB_PASSWORD`.
pub const ENV_PREFIX: &str = "DWH";

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(alias = "CLUSTER")]
    pub cluster: ClusterConfig,
    #[serde(alias = "IAM_ROLE")]
    pub iam_role: IamRoleConfig,
    #[serde(alias = "S3")]
    pub s3: S3Config,
    #[serde(default, alias = "LOAD")]
    pub load: LoadConfig,
}

#[derive(Deserialize, Clone)]
pub struct ClusterConfig {
    #[serde(alias = "HOST")]
    pub host: String,
    #[serde(alias = "DB_NAME")]
    pub db_name: String,
    #[serde(alias = "DB_USER")]
    pub db_user: String,
    #[serde(alias = "DB_PASSWORD")]
    pub db_password: String,
    #[serde(default = "default_db_port", alias = "DB_PORT")]
    pub db_port: u16,
}

// Keeps the password out of logs.
impl fmt::Debug for ClusterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterConfig")
            .field("host", &self.host)
            .field("db_name", &self.db_name)
            .field("db_user", &self.db_user)
            .field("db_password", &"****")
            .field("db_port", &self.db_port)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IamRoleConfig {
    #[serde(alias = "ARN")]
    pub arn: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    #[serde(alias = "LOG_DATA")]
    pub log_data: String,
    #[serde(alias = "LOG_JSONPATH")]
    pub log_jsonpath: String,
    #[serde(alias = "SONG_DATA")]
    pub song_data: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoadConfig {
    #[serde(default = "default_region", alias = "REGION")]
    pub region: String,
    #[serde(default, alias = "TS_UNIT")]
    pub ts_unit: EpochUnit,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            ts_unit: EpochUnit::default(),
        }
    }
}

/// Unit of the numeric `ts` field carried by log events.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EpochUnit {
    #[default]
    Seconds,
    Milliseconds,
}

fn default_db_port() -> u16 {
    5439
}

fn default_region() -> String {
    "us-west-2".to_string()
}

impl Settings {
    /// Loads settings from `path` and the `DWH_*` environment.
    ///
    /// `.cfg` and `.ini` files are read as INI (the classic `dwh.cfg`
    /// layout); anything else is resolved by extension.
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let file = match Path::new(path).extension().and_then(|ext| ext.to_str()) {
            Some("cfg") | Some("ini") => File::new(path, FileFormat::Ini),
            _ => File::with_name(path),
        };

        let builder = Config::builder().add_source(file).add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        );

        let config = builder.build()?;
        let settings: Settings = config.try_deserialize()?;

        debug!(
            cluster = ?settings.cluster,
            region = %settings.load.region,
            ts_unit = ?settings.load.ts_unit,
            "Loaded warehouse settings"
        );

        Ok(settings)
    }
}
