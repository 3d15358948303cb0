//! Optional checks that the load sources exist before `COPY` runs.

pub mod s3;

pub use s3::S3Storage;

use crate::loader::BulkLoader;
use crate::sql::{JsonFormat, S3Uri};
use async_trait::async_trait;
use common::{Error, Result};
use tracing::info;

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Lists at most `limit` keys under `prefix`.
    async fn list_objects(&self, bucket: &str, prefix: &str, limit: i32) -> Result<Vec<String>>;
    async fn check_file_exists(&self, bucket: &str, key: &str) -> Result<bool>;
}

/// Verifies every source a [`BulkLoader`] reads from.
///
/// Data prefixes must hold at least one object; JSONPaths files must exist.
pub async fn verify_sources(storage: &dyn ObjectStorage, loader: &BulkLoader) -> Result<()> {
    for copy in loader.statements() {
        verify_prefix(storage, &copy.source)
            .await
            .map_err(|e| Error::load(copy.table.name(), e))?;

        if let JsonFormat::Paths(paths) = &copy.format {
            verify_object(storage, paths)
                .await
                .map_err(|e| Error::load(copy.table.name(), e))?;
        }
    }
    Ok(())
}

async fn verify_prefix(storage: &dyn ObjectStorage, uri: &S3Uri) -> Result<()> {
    let keys = storage.list_objects(uri.bucket(), uri.key(), 1).await?;
    if keys.is_empty() {
        return Err(Error::SourceMissing(format!("no objects under {}", uri)));
    }
    info!(source = %uri, "Source prefix has data");
    Ok(())
}

async fn verify_object(storage: &dyn ObjectStorage, uri: &S3Uri) -> Result<()> {
    if !storage.check_file_exists(uri.bucket(), uri.key()).await? {
        return Err(Error::SourceMissing(format!("{} does not exist", uri)));
    }
    Ok(())
}
