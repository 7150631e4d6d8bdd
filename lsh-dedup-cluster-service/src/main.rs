mod dto;
mod error;
mod response;
mod util;

use dto::DedupConfig;
use error::ServiceError;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use lazy_static::lazy_static;
use lsh_dedup::{DeduplicationTable, MinHashLSH};
use response::make_response_payload;
use rusoto_core::{Client, Region};
use rusoto_s3::S3Client;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

lazy_static! {
    // AWS Region
    static ref REGION: Result<Region, ServiceError> = util::get_region();
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .without_time()
        .init();
    run(service_fn(process)).await?;
    Ok(())
}

async fn process(event: LambdaEvent<DedupConfig>) -> Result<Value, Error> {
    let (config, _context) = event.into_parts();
    let result = dedup(config).await;
    if let Err(err) = &result {
        error!(status = u16::from(err.status), "{}", err.msg);
    }
    make_response_payload(result)
}

async fn dedup(config: DedupConfig) -> Result<Value, ServiceError> {
    let region = REGION.clone()?;
    let client = S3Client::new_with_client(Client::shared(), region);

    let start = Instant::now();
    let records = util::pull_data_file(&client, &config.data).await?;
    info!(
        records = records.len(),
        secs = start.elapsed().as_secs_f64(),
        "file downloaded"
    );

    let start = Instant::now();
    let lsh = MinHashLSH::from_records(&records, config.index_config())?;
    info!(secs = start.elapsed().as_secs_f64(), "hashed records");

    let dedup_table = DeduplicationTable::new(&lsh, config.threshold)?;
    let summary = dedup_table.summary();
    info!(
        total = summary.total,
        unique = summary.unique,
        duplicates = summary.duplicates,
        secs = start.elapsed().as_secs_f64(),
        "dedupe completed"
    );

    let output = config.output_file();
    util::push_result_file(&client, &output, &dedup_table).await?;
    Ok(json!({
        "bucket": output.bucket,
        "key": output.key,
        "summary": summary,
    }))
}
