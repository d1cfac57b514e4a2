use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType,
    StreamSpecification, StreamViewType,
};

use super::errors::{from_sdk, malformed};
use super::AwsCloud;
use crate::cloud::{ProviderResult, TableControl, TableSpec, TableState};

fn new_image_stream(operation: &str) -> ProviderResult<StreamSpecification> {
    StreamSpecification::builder()
        .stream_enabled(true)
        .stream_view_type(StreamViewType::NewImage)
        .build()
        .map_err(|error| malformed(operation, error))
}

fn string_attribute(operation: &str, name: &str) -> ProviderResult<AttributeDefinition> {
    AttributeDefinition::builder()
        .attribute_name(name)
        .attribute_type(ScalarAttributeType::S)
        .build()
        .map_err(|error| malformed(operation, error))
}

fn key_element(operation: &str, name: &str, key_type: KeyType) -> ProviderResult<KeySchemaElement> {
    KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(key_type)
        .build()
        .map_err(|error| malformed(operation, error))
}

impl TableControl for AwsCloud {
    fn describe_table(&self, name: &str) -> ProviderResult<Option<TableState>> {
        let output = match self.block_on(self.dynamodb.describe_table().table_name(name).send()) {
            Ok(output) => output,
            Err(error) => {
                let error = from_sdk("DescribeTable", error);
                return if error.is_not_found() {
                    Ok(None)
                } else {
                    Err(error)
                };
            }
        };

        let Some(table) = output.table() else {
            return Ok(None);
        };
        Ok(Some(TableState {
            status: table
                .table_status()
                .map(|status| status.as_str().to_string())
                .unwrap_or_else(|| "UNKNOWN".to_string()),
            stream_enabled: table
                .stream_specification()
                .map(|stream| stream.stream_enabled())
                .unwrap_or(false),
            latest_stream_arn: table.latest_stream_arn().map(str::to_string),
        }))
    }

    fn create_table(&self, spec: &TableSpec) -> ProviderResult<()> {
        let operation = "CreateTable";
        let request = self
            .dynamodb
            .create_table()
            .table_name(&spec.name)
            .attribute_definitions(string_attribute(operation, &spec.hash_key)?)
            .attribute_definitions(string_attribute(operation, &spec.range_key)?)
            .key_schema(key_element(operation, &spec.hash_key, KeyType::Hash)?)
            .key_schema(key_element(operation, &spec.range_key, KeyType::Range)?)
            .billing_mode(BillingMode::PayPerRequest)
            .stream_specification(new_image_stream(operation)?);

        self.block_on(request.send())
            .map_err(|error| from_sdk(operation, error))?;
        Ok(())
    }

    fn enable_stream(&self, name: &str) -> ProviderResult<()> {
        let operation = "UpdateTable";
        self.block_on(
            self.dynamodb
                .update_table()
                .table_name(name)
                .stream_specification(new_image_stream(operation)?)
                .send(),
        )
        .map_err(|error| from_sdk(operation, error))?;
        Ok(())
    }

    fn delete_table(&self, name: &str) -> ProviderResult<()> {
        self.block_on(self.dynamodb.delete_table().table_name(name).send())
            .map_err(|error| from_sdk("DeleteTable", error))?;
        Ok(())
    }
}
