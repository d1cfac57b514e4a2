use std::sync::Arc;
use std::time::Duration;

use aws_sdk_dynamodb::types::{PutRequest, WriteRequest};
use inventory_core::contract::{IngestSummary, InventoryRow};
use inventory_lambda::adapters::dynamo_items::row_to_item;
use inventory_lambda::adapters::inventory_table::InventoryWriter;
use inventory_lambda::adapters::object_source::ObjectSource;
use inventory_lambda::config::TableConfig;
use inventory_lambda::handlers::ingest::handle_ingest_event;
use inventory_lambda::telemetry::init_tracing;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

const BATCH_WRITE_LIMIT: usize = 25;
const MAX_UNPROCESSED_ROUNDS: u32 = 8;

struct S3ObjectSource {
    s3_client: aws_sdk_s3::Client,
}

impl ObjectSource for S3ObjectSource {
    fn read_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, String> {
        let bucket = bucket.to_string();
        let object_key = key.to_string();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .get_object()
                    .bucket(bucket)
                    .key(object_key)
                    .send()
                    .await
                    .map_err(|error| {
                        format!(
                            "failed to read object from s3: {}",
                            aws_sdk_s3::error::DisplayErrorContext(&error)
                        )
                    })?;
                let body = output
                    .body
                    .collect()
                    .await
                    .map_err(|error| format!("failed to read object body: {error}"))?;
                Ok(body.into_bytes().to_vec())
            })
        })
    }
}

struct DynamoInventoryWriter {
    table_name: String,
    dynamodb_client: aws_sdk_dynamodb::Client,
}

impl InventoryWriter for DynamoInventoryWriter {
    fn put_rows(&self, rows: &[InventoryRow]) -> Result<(), String> {
        if rows.is_empty() {
            return Ok(());
        }

        let requests = rows
            .iter()
            .map(write_request)
            .collect::<Result<Vec<_>, String>>()?;
        let table_name = self.table_name.clone();
        let client = self.dynamodb_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                for chunk in requests.chunks(BATCH_WRITE_LIMIT) {
                    write_chunk(&client, &table_name, chunk.to_vec()).await?;
                }
                Ok(())
            })
        })
    }
}

fn write_request(row: &InventoryRow) -> Result<WriteRequest, String> {
    let put = PutRequest::builder()
        .set_item(Some(row_to_item(row)))
        .build()
        .map_err(|error| format!("invalid put request: {error}"))?;
    Ok(WriteRequest::builder().put_request(put).build())
}

async fn write_chunk(
    client: &aws_sdk_dynamodb::Client,
    table_name: &str,
    chunk: Vec<WriteRequest>,
) -> Result<(), String> {
    let mut pending = chunk;
    let mut round = 0u32;

    while !pending.is_empty() {
        if round >= MAX_UNPROCESSED_ROUNDS {
            return Err(format!(
                "{} rows still unprocessed after {MAX_UNPROCESSED_ROUNDS} batch writes",
                pending.len()
            ));
        }
        if round > 0 {
            tokio::time::sleep(Duration::from_millis(100 * u64::from(round))).await;
        }

        let output = client
            .batch_write_item()
            .request_items(table_name, pending)
            .send()
            .await
            .map_err(|error| {
                format!(
                    "failed to batch write inventory rows: {}",
                    aws_sdk_dynamodb::error::DisplayErrorContext(&error)
                )
            })?;

        pending = output
            .unprocessed_items()
            .and_then(|items| items.get(table_name))
            .cloned()
            .unwrap_or_default();
        round += 1;
    }

    Ok(())
}

struct Dependencies {
    source: S3ObjectSource,
    table: DynamoInventoryWriter,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: Arc<Dependencies>,
) -> Result<IngestSummary, Error> {
    handle_ingest_event(event.payload, &deps.source, &deps.table).map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = TableConfig::from_env()?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let deps = Arc::new(Dependencies {
        source: S3ObjectSource {
            s3_client: aws_sdk_s3::Client::new(&aws_config),
        },
        table: DynamoInventoryWriter {
            table_name: config.table_name,
            dynamodb_client: aws_sdk_dynamodb::Client::new(&aws_config),
        },
    });

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let deps = deps.clone();
        async move { handle_request(event, deps).await }
    }))
    .await
}

#[cfg(test)]
mod tests {
    use aws_sdk_dynamodb::types::AttributeValue;

    use super::*;

    #[test]
    fn write_requests_carry_the_full_row() {
        let request = write_request(&InventoryRow {
            store: "Berlin".to_string(),
            item: "Apples".to_string(),
            count: 3,
        })
        .expect("request should build");

        let item = request.put_request().expect("put request").item();
        assert_eq!(item.get("Count"), Some(&AttributeValue::N("3".to_string())));
        assert_eq!(item.len(), 3);
    }
}
