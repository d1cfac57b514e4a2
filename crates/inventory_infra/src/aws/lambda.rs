use std::collections::HashMap;

use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::{Environment, EventSourcePosition, FunctionCode, Runtime};

use super::errors::{from_sdk, malformed};
use super::AwsCloud;
use crate::cloud::{
    BindingSpec, FunctionControl, FunctionSpec, FunctionState, InvokePermission, ProviderResult,
    StreamBinding,
};

const INVOKE_ACTION: &str = "lambda:InvokeFunction";

fn environment(spec: &FunctionSpec) -> Environment {
    let variables: HashMap<String, String> = spec
        .environment
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    Environment::builder().set_variables(Some(variables)).build()
}

impl FunctionControl for AwsCloud {
    fn get_function(&self, name: &str) -> ProviderResult<Option<FunctionState>> {
        let output = match self.block_on(self.lambda.get_function().function_name(name).send()) {
            Ok(output) => output,
            Err(error) => {
                let error = from_sdk("GetFunction", error);
                return if error.is_not_found() {
                    Ok(None)
                } else {
                    Err(error)
                };
            }
        };

        let Some(configuration) = output.configuration() else {
            return Err(malformed("GetFunction", format!("{name} has no configuration")));
        };
        let arn = configuration
            .function_arn()
            .ok_or_else(|| malformed("GetFunction", format!("{name} has no ARN")))?;
        Ok(Some(FunctionState {
            arn: arn.to_string(),
            state: configuration.state().map(|state| state.as_str().to_string()),
            last_update_status: configuration
                .last_update_status()
                .map(|status| status.as_str().to_string()),
        }))
    }

    fn create_function(&self, spec: &FunctionSpec, archive: &[u8]) -> ProviderResult<String> {
        let output = self
            .block_on(
                self.lambda
                    .create_function()
                    .function_name(&spec.name)
                    .role(&spec.role_arn)
                    .runtime(Runtime::from(spec.runtime.as_str()))
                    .handler(&spec.handler)
                    .timeout(spec.timeout_seconds)
                    .memory_size(spec.memory_mb)
                    .environment(environment(spec))
                    .code(FunctionCode::builder().zip_file(Blob::new(archive)).build())
                    .publish(true)
                    .send(),
            )
            .map_err(|error| from_sdk("CreateFunction", error))?;

        output
            .function_arn()
            .map(str::to_string)
            .ok_or_else(|| malformed("CreateFunction", format!("{} has no ARN", spec.name)))
    }

    fn update_function_code(&self, name: &str, archive: &[u8]) -> ProviderResult<()> {
        self.block_on(
            self.lambda
                .update_function_code()
                .function_name(name)
                .zip_file(Blob::new(archive))
                .publish(true)
                .send(),
        )
        .map_err(|error| from_sdk("UpdateFunctionCode", error))?;
        Ok(())
    }

    fn update_function_configuration(&self, spec: &FunctionSpec) -> ProviderResult<()> {
        self.block_on(
            self.lambda
                .update_function_configuration()
                .function_name(&spec.name)
                .role(&spec.role_arn)
                .runtime(Runtime::from(spec.runtime.as_str()))
                .handler(&spec.handler)
                .timeout(spec.timeout_seconds)
                .memory_size(spec.memory_mb)
                .environment(environment(spec))
                .send(),
        )
        .map_err(|error| from_sdk("UpdateFunctionConfiguration", error))?;
        Ok(())
    }

    fn add_permission(&self, permission: &InvokePermission) -> ProviderResult<()> {
        self.block_on(
            self.lambda
                .add_permission()
                .function_name(&permission.function)
                .statement_id(&permission.statement_id)
                .action(INVOKE_ACTION)
                .principal(&permission.principal)
                .source_arn(&permission.source_arn)
                .send(),
        )
        .map_err(|error| from_sdk("AddPermission", error))?;
        Ok(())
    }

    fn list_stream_bindings(&self, function: &str) -> ProviderResult<Vec<StreamBinding>> {
        let mut bindings = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let page = self
                .block_on(
                    self.lambda
                        .list_event_source_mappings()
                        .function_name(function)
                        .set_marker(marker.take())
                        .send(),
                )
                .map_err(|error| from_sdk("ListEventSourceMappings", error))?;

            bindings.extend(page.event_source_mappings().iter().filter_map(|mapping| {
                mapping.uuid().map(|uuid| StreamBinding {
                    uuid: uuid.to_string(),
                    event_source_arn: mapping.event_source_arn().map(str::to_string),
                })
            }));

            match page.next_marker() {
                Some(next) if !next.is_empty() => marker = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(bindings)
    }

    fn create_stream_binding(&self, spec: &BindingSpec) -> ProviderResult<String> {
        let output = self
            .block_on(
                self.lambda
                    .create_event_source_mapping()
                    .function_name(&spec.function_arn)
                    .event_source_arn(&spec.stream_arn)
                    .batch_size(spec.batch_size)
                    .maximum_batching_window_in_seconds(spec.batching_window_seconds)
                    .starting_position(EventSourcePosition::from(spec.starting_position.as_str()))
                    .enabled(true)
                    .send(),
            )
            .map_err(|error| from_sdk("CreateEventSourceMapping", error))?;

        output
            .uuid()
            .map(str::to_string)
            .ok_or_else(|| malformed("CreateEventSourceMapping", "no mapping UUID returned"))
    }

    fn delete_stream_binding(&self, uuid: &str) -> ProviderResult<()> {
        self.block_on(self.lambda.delete_event_source_mapping().uuid(uuid).send())
            .map_err(|error| from_sdk("DeleteEventSourceMapping", error))?;
        Ok(())
    }

    fn delete_function(&self, name: &str) -> ProviderResult<()> {
        self.block_on(self.lambda.delete_function().function_name(name).send())
            .map_err(|error| from_sdk("DeleteFunction", error))?;
        Ok(())
    }
}
