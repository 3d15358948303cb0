use super::{quote_literal, unquote};
use common::{Error, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use url::Url;

lazy_static! {
    static ref BUCKET_NAME: Regex = Regex::new(r"^[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]$").unwrap();
    static ref IAM_ROLE_ARN: Regex =
        Regex::new(r"^arn:aws[a-z-]*:iam::\d{12}:role/[A-Za-z0-9+=,.@_/-]{1,512}$").unwrap();
    static ref AWS_REGION: Regex = Regex::new(r"^[a-z]{2}(-[a-z]+)+-\d{1,2}$").unwrap();
}

/// An `s3://bucket/key` location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Uri {
    bucket: String,
    key: String,
}

impl S3Uri {
    pub fn parse(raw: &str) -> Result<Self> {
        let value = unquote(raw);
        if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(Error::InvalidConfig(format!(
                "S3 path must not contain whitespace: {:?}",
                value
            )));
        }

        let url = Url::parse(value)
            .map_err(|e| Error::InvalidConfig(format!("Invalid S3 path {:?}: {}", value, e)))?;
        if url.scheme() != "s3" {
            return Err(Error::InvalidConfig(format!(
                "Expected an s3:// path, got {:?}",
                value
            )));
        }

        if !url.username().is_empty()
            || url.password().is_some()
            || url.port().is_some()
            || url.query().is_some()
            || url.fragment().is_some()
        {
            return Err(Error::InvalidConfig(format!(
                "S3 path must be s3://bucket/key without credentials, port, query or fragment: {:?}",
                value
            )));
        }

        let bucket = url.host_str().unwrap_or_default();
        if !BUCKET_NAME.is_match(bucket) {
            return Err(Error::InvalidConfig(format!(
                "Invalid bucket name {:?} in {:?}",
                bucket, value
            )));
        }

        // Keys are kept as written; the url crate would percent-encode them.
        let key = value
            .strip_prefix("s3://")
            .and_then(|rest| rest.strip_prefix(bucket))
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            bucket: bucket.to_string(),
            key,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Object key or key prefix; empty for a whole bucket.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn to_literal(&self) -> String {
        quote_literal(&self.to_string())
    }
}

impl fmt::Display for S3Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key.is_empty() {
            write!(f, "s3://{}", self.bucket)
        } else {
            write!(f, "s3://{}/{}", self.bucket, self.key)
        }
    }
}

/// The role Redshift assumes to read from S3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IamRoleArn(String);

impl IamRoleArn {
    pub fn parse(raw: &str) -> Result<Self> {
        let value = unquote(raw);
        if !IAM_ROLE_ARN.is_match(value) {
            return Err(Error::InvalidConfig(format!(
                "Invalid IAM role ARN {:?}",
                value
            )));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_literal(&self) -> String {
        quote_literal(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region(String);

impl Region {
    pub fn parse(raw: &str) -> Result<Self> {
        let value = unquote(raw);
        if !AWS_REGION.is_match(value) {
            return Err(Error::InvalidConfig(format!("Invalid region {:?}", value)));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_literal(&self) -> String {
        quote_literal(&self.0)
    }
}

/// How `COPY ... JSON` maps JSON fields onto columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonFormat {
    /// Match top-level keys to column names.
    Auto,
    AutoIgnoreCase,
    /// Use a JSONPaths file, one path per column in table order.
    Paths(S3Uri),
}

impl JsonFormat {
    pub fn parse(raw: &str) -> Result<Self> {
        match unquote(raw) {
            "auto" => Ok(JsonFormat::Auto),
            "auto ignorecase" => Ok(JsonFormat::AutoIgnoreCase),
            other => S3Uri::parse(other).map(JsonFormat::Paths),
        }
    }

    pub fn to_literal(&self) -> String {
        match self {
            JsonFormat::Auto => quote_literal("auto"),
            JsonFormat::AutoIgnoreCase => quote_literal("auto ignorecase"),
            JsonFormat::Paths(uri) => uri.to_literal(),
        }
    }
}
