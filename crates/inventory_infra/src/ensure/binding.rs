use tracing::info;

use crate::cloud::{BindingSpec, FunctionControl, StreamBinding};
use crate::error::DeployError;

pub const BINDING_BATCH_SIZE: i32 = 100;
pub const BINDING_BATCHING_WINDOW_SECONDS: i32 = 1;
pub const BINDING_STARTING_POSITION: &str = "LATEST";

impl BindingSpec {
    pub fn new(function_arn: &str, stream_arn: &str) -> Self {
        Self {
            function_arn: function_arn.to_string(),
            stream_arn: stream_arn.to_string(),
            batch_size: BINDING_BATCH_SIZE,
            batching_window_seconds: BINDING_BATCHING_WINDOW_SECONDS,
            starting_position: BINDING_STARTING_POSITION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingAction {
    Create,
    Reuse(String),
}

pub fn plan_binding(current: &[StreamBinding], desired: &BindingSpec) -> BindingAction {
    current
        .iter()
        .find(|binding| binding.event_source_arn.as_deref() == Some(desired.stream_arn.as_str()))
        .map(|binding| BindingAction::Reuse(binding.uuid.clone()))
        .unwrap_or(BindingAction::Create)
}

/// Ensures one enabled stream binding exists for the (stream, function) pair
/// and returns its UUID.
pub fn ensure_binding(
    functions: &impl FunctionControl,
    spec: &BindingSpec,
) -> Result<String, DeployError> {
    let current = functions
        .list_stream_bindings(&spec.function_arn)
        .map_err(DeployError::at("list stream bindings"))?;

    match plan_binding(&current, spec) {
        BindingAction::Reuse(uuid) => {
            info!(uuid = %uuid, "stream binding exists");
            Ok(uuid)
        }
        BindingAction::Create => {
            let uuid = functions
                .create_stream_binding(spec)
                .map_err(DeployError::at("create stream binding"))?;
            info!(uuid = %uuid, "stream binding created");
            Ok(uuid)
        }
    }
}
