use super::ObjectStorage;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::SdkError;
use common::Result;
use crate::sql;

/// Read-only S3 access using the default AWS credential chain.
pub struct S3Storage {
    client: S3Client,
}

impl S3Storage {
    pub async fn new(region: &sql::Region) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.as_str().to_string()))
            .load()
            .await;

        Self {
            client: S3Client::new(&config),
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn list_objects(&self, bucket: &str, prefix: &str, limit: i32) -> Result<Vec<String>> {
        let response = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .max_keys(limit)
            .send()
            .await
            .map_err(|e| match e {
                SdkError::ServiceError(err) => common::Error::Storage(err.into_err().to_string()),
                _ => common::Error::Storage(e.to_string()),
            })?;

        Ok(response
            .contents
            .unwrap_or_default()
            .into_iter()
            .filter_map(|object| object.key)
            .collect())
    }

    async fn check_file_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(err)) if err.err().is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
