pub mod explore;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod schema;
pub mod sql;
pub mod storage;
pub mod transform;
pub mod warehouse;

use common::Result;
use common::config::Settings;
use models::RunSummary;
use pipeline::{Phase, Pipeline};
use sql::Region;
use storage::S3Storage;
use warehouse::RedshiftWarehouse;

/// Runs `phases` against the cluster named in `settings`.
///
/// With `preflight`, the S3 sources are checked before the warehouse is
/// contacted.
pub async fn run_pipeline(
    settings: &Settings,
    phases: &[Phase],
    preflight: bool,
) -> Result<RunSummary> {
    let pipeline = Pipeline::from_settings(settings)?;

    if preflight && phases.contains(&Phase::Copy) {
        let storage = S3Storage::new(&Region::parse(&settings.load.region)?).await;
        pipeline.verify_sources(&storage).await?;
    }

    let warehouse = RedshiftWarehouse::connect(&settings.cluster).await?;
    pipeline.run(&warehouse, phases).await
}
