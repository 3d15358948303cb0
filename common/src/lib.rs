use aws_smithy_runtime_api::client::result::CreateUnhandledError;
use aws_smithy_runtime_api::client::result::SdkError;
use aws_smithy_runtime_api::http::Response;
use thiserror::Error;

pub mod config;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Warehouse error: {0}")]
    Warehouse(#[from] tokio_postgres::Error),

    #[error("Statement rejected: {0}")]
    Statement(String),

    #[error("Schema statement for {table} failed: {source}")]
    Schema {
        table: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Load into {table} failed: {source}")]
    Load {
        table: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Transform into {table} failed: {source}")]
    Transform {
        table: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Query {name} failed: {source}")]
    Query {
        name: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Invalid ordering: {0}")]
    Ordering(String),

    #[error("Source data missing: {0}")]
    SourceMissing(String),

    #[error("AWS SDK error: {0}")]
    AwsSdk(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    pub fn schema(table: impl Into<String>, source: Error) -> Self {
        Error::Schema {
            table: table.into(),
            source: Box::new(source),
        }
    }

    pub fn load(table: impl Into<String>, source: Error) -> Self {
        Error::Load {
            table: table.into(),
            source: Box::new(source),
        }
    }

    pub fn transform(table: impl Into<String>, source: Error) -> Self {
        Error::Transform {
            table: table.into(),
            source: Box::new(source),
        }
    }

    pub fn query(name: impl Into<String>, source: Error) -> Self {
        Error::Query {
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// Configuration problems are detected before the warehouse is touched.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_) | Error::InvalidConfig(_))
    }
}

// Implement From for various SdkError types
impl<E: std::fmt::Debug + CreateUnhandledError> From<SdkError<E, Response>> for Error {
    fn from(err: SdkError<E, Response>) -> Self {
        Error::AwsSdk(format!("{:?}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_errors_keep_the_warehouse_message() {
        let err = Error::schema("songplay", Error::Statement("relation \"times\" does not exist".into()));
        let rendered = err.to_string();
        assert!(rendered.contains("songplay"));
        assert!(rendered.contains("relation \"times\" does not exist"));

        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(
            source.as_deref(),
            Some("Statement rejected: relation \"times\" does not exist")
        );
    }

    #[test]
    fn config_errors_are_classified() {
        assert!(Error::InvalidConfig("missing ARN".into()).is_config());
        assert!(!Error::Ordering("times before songplay".into()).is_config());
    }
}
