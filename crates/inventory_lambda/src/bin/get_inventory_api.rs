use std::collections::HashMap;
use std::sync::Arc;

use aws_sdk_dynamodb::types::AttributeValue;
use inventory_core::api::ApiGatewayResponse;
use inventory_core::attributes::StoredItem;
use inventory_core::contract::STORE_ATTRIBUTE;
use inventory_lambda::adapters::dynamo_items::stored_item;
use inventory_lambda::adapters::inventory_table::InventoryReader;
use inventory_lambda::config::TableConfig;
use inventory_lambda::handlers::query::handle_query_event;
use inventory_lambda::telemetry::init_tracing;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

struct DynamoInventoryReader {
    table_name: String,
    dynamodb_client: aws_sdk_dynamodb::Client,
}

impl InventoryReader for DynamoInventoryReader {
    fn query_store(&self, store: &str) -> Result<Vec<StoredItem>, String> {
        let table_name = self.table_name.clone();
        let store = store.to_string();
        let client = self.dynamodb_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let mut items = Vec::new();
                let mut start_key: Option<HashMap<String, AttributeValue>> = None;
                loop {
                    let output = client
                        .query()
                        .table_name(&table_name)
                        .key_condition_expression("#store = :store")
                        .expression_attribute_names("#store", STORE_ATTRIBUTE)
                        .expression_attribute_values(":store", AttributeValue::S(store.clone()))
                        .set_exclusive_start_key(start_key.take())
                        .send()
                        .await
                        .map_err(|error| {
                            format!(
                                "failed to query inventory table: {}",
                                aws_sdk_dynamodb::error::DisplayErrorContext(&error)
                            )
                        })?;

                    items.extend(output.items().iter().map(stored_item));
                    match output.last_evaluated_key() {
                        Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                        _ => break,
                    }
                }
                Ok(items)
            })
        })
    }

    fn scan_all(&self) -> Result<Vec<StoredItem>, String> {
        let table_name = self.table_name.clone();
        let client = self.dynamodb_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let mut items = Vec::new();
                let mut start_key: Option<HashMap<String, AttributeValue>> = None;
                loop {
                    let output = client
                        .scan()
                        .table_name(&table_name)
                        .set_exclusive_start_key(start_key.take())
                        .send()
                        .await
                        .map_err(|error| {
                            format!(
                                "failed to scan inventory table: {}",
                                aws_sdk_dynamodb::error::DisplayErrorContext(&error)
                            )
                        })?;

                    items.extend(output.items().iter().map(stored_item));
                    match output.last_evaluated_key() {
                        Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                        _ => break,
                    }
                }
                Ok(items)
            })
        })
    }
}

async fn handle_request(
    event: LambdaEvent<Value>,
    table: Arc<DynamoInventoryReader>,
) -> Result<ApiGatewayResponse, Error> {
    Ok(handle_query_event(event.payload, table.as_ref()))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = TableConfig::from_env()?;
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let table = Arc::new(DynamoInventoryReader {
        table_name: config.table_name,
        dynamodb_client: aws_sdk_dynamodb::Client::new(&aws_config),
    });

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let table = table.clone();
        async move { handle_request(event, table).await }
    }))
    .await
}
