use crate::dto::DataFile;
use crate::error::ServiceError;
use csv::{Reader, Writer};
use futures::stream::TryStreamExt;
use lsh_dedup::{DeduplicationTable, Record};
use rusoto_core::Region;
use rusoto_s3::{GetObjectRequest, PutObjectRequest, S3Client, S3};
use std::env;
use std::str::FromStr;

pub fn get_region() -> Result<Region, ServiceError> {
    let region = env::var("REGION").map_err(|_| {
        ServiceError::internal_server_error("Environment variable 'REGION' not found")
    })?;
    Region::from_str(&region).map_err(|_| {
        ServiceError::internal_server_error(format!("Unable to parse region {region}"))
    })
}

pub async fn pull_data_file(
    client: &S3Client,
    data: &DataFile,
) -> Result<Vec<Record>, ServiceError> {
    let request = GetObjectRequest {
        bucket: data.bucket.clone(),
        key: data.key.clone(),
        ..Default::default()
    };
    let mut object = client
        .get_object(request)
        .await
        .map_err(ServiceError::internal_server_error)?;
    let body = object
        .body
        .take()
        .ok_or_else(|| ServiceError::internal_server_error("Unable to extract body"))?;
    let bytes = body
        .map_ok(|b| b.to_vec())
        .try_concat()
        .await
        .map_err(ServiceError::internal_server_error)?;
    parse_records(&bytes)
}

pub async fn push_result_file(
    client: &S3Client,
    output: &DataFile,
    dedup_table: &DeduplicationTable<'_, String>,
) -> Result<(), ServiceError> {
    let request = PutObjectRequest {
        bucket: output.bucket.clone(),
        key: output.key.clone(),
        body: Some(render_results(dedup_table)?.into()),
        ..Default::default()
    };
    client
        .put_object(request)
        .await
        .map(|_| ())
        .map_err(ServiceError::internal_server_error)
}

/// Reads a CSV with `id` and `text` columns.
pub fn parse_records(bytes: &[u8]) -> Result<Vec<Record>, ServiceError> {
    let mut reader = Reader::from_reader(bytes);
    let headers = reader
        .headers()
        .map_err(ServiceError::internal_server_error)?
        .clone();
    reader
        .records()
        .map(|record| match record {
            Ok(rec) => rec.deserialize(Some(&headers)).map_err(|_| {
                ServiceError::bad_request("file must contain columns 'id' and 'text'")
            }),
            Err(err) => Err(ServiceError::internal_server_error(err)),
        })
        .collect()
}

/// Writes one `id,cluster_id` row per record.
pub fn render_results(dedup_table: &DeduplicationTable<'_, String>) -> Result<Vec<u8>, ServiceError> {
    let mut writer = Writer::from_writer(vec![]);
    writer
        .write_record(["id", "cluster_id"])
        .map_err(ServiceError::internal_server_error)?;
    for (rec_id, cluster_id) in dedup_table.cluster_assignments() {
        writer
            .write_record([rec_id.as_str(), cluster_id.as_str()])
            .map_err(ServiceError::internal_server_error)?;
    }
    writer
        .into_inner()
        .map_err(ServiceError::internal_server_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Status;
    use lsh_dedup::{IndexConfig, MinHashLSH};

    #[test]
    fn parses_id_and_text_columns() {
        let csv = b"id,text\na1,the cat sat\nb2,\"a dog, ran\"\n";
        let records = parse_records(csv).unwrap();
        assert_eq!(
            records,
            vec![Record::new("a1", "the cat sat"), Record::new("b2", "a dog, ran")]
        );
    }

    #[test]
    fn missing_columns_is_bad_request() {
        let err = parse_records(b"uuid,body\na1,the cat sat\n").unwrap_err();
        assert_eq!(err.status, Status::BadRequest);
    }

    #[test]
    fn renders_cluster_rows() {
        let records = vec![
            Record::new("a", "the cat sat"),
            Record::new("b", "the cat sat"),
            Record::new("c", "a dog ran"),
        ];
        let lsh = MinHashLSH::from_records(&records, IndexConfig::new(8, 1)).unwrap();
        let table = DeduplicationTable::new(&lsh, 1.0).unwrap();
        let rendered = String::from_utf8(render_results(&table).unwrap()).unwrap();
        assert_eq!(rendered, "id,cluster_id\na,0-2\nb,0-2\nc,1-1\n");
    }
}
