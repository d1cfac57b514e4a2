use std::collections::BTreeMap;

use tracing::info;

use super::Timing;
use crate::cloud::{FunctionControl, FunctionSpec, FunctionState};
use crate::error::DeployError;
use crate::readiness::wait_until;
use crate::retry::call_with_retries;

pub const FUNCTION_RUNTIME: &str = "provided.al2023";
pub const FUNCTION_HANDLER: &str = "bootstrap";
pub const FUNCTION_TIMEOUT_SECONDS: i32 = 30;
pub const FUNCTION_MEMORY_MB: i32 = 256;

impl FunctionSpec {
    pub fn new(name: &str, role_arn: &str, environment: BTreeMap<String, String>) -> Self {
        Self {
            name: name.to_string(),
            role_arn: role_arn.to_string(),
            runtime: FUNCTION_RUNTIME.to_string(),
            handler: FUNCTION_HANDLER.to_string(),
            timeout_seconds: FUNCTION_TIMEOUT_SECONDS,
            memory_mb: FUNCTION_MEMORY_MB,
            environment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionAction {
    Create,
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionOutcome {
    pub action: FunctionAction,
    pub arn: String,
}

pub fn plan_function(current: Option<&FunctionState>) -> FunctionAction {
    match current {
        None => FunctionAction::Create,
        Some(_) => FunctionAction::Update,
    }
}

/// Creates the function, or pushes new code and configuration to an existing
/// one, waiting for it to settle around every mutation.
pub fn ensure_function(
    functions: &impl FunctionControl,
    timing: &Timing<'_>,
    spec: &FunctionSpec,
    archive: &[u8],
) -> Result<FunctionOutcome, DeployError> {
    let name = spec.name.as_str();
    let current = functions
        .get_function(name)
        .map_err(DeployError::at(format!("look up function {name}")))?;

    let mut action = plan_function(current.as_ref());
    if action == FunctionAction::Create {
        match functions.create_function(spec, archive) {
            Ok(arn) => {
                wait_ready(functions, timing, name)?;
                info!(function = name, "function created");
                return Ok(FunctionOutcome { action, arn });
            }
            Err(error) if error.is_already_exists() => {
                info!(function = name, "function already exists, updating it");
                action = FunctionAction::Update;
            }
            Err(error) => return Err(DeployError::at(format!("create function {name}"))(error)),
        }
    }

    wait_ready(functions, timing, name)?;
    call_with_retries(timing.clock, &timing.retry, "update function code", || {
        functions.update_function_code(name, archive)
    })
    .map_err(DeployError::at(format!("update code of function {name}")))?;

    wait_ready(functions, timing, name)?;
    call_with_retries(
        timing.clock,
        &timing.retry,
        "update function configuration",
        || functions.update_function_configuration(spec),
    )
    .map_err(DeployError::at(format!("update configuration of function {name}")))?;

    let settled = wait_ready(functions, timing, name)?;
    info!(function = name, "function updated");
    Ok(FunctionOutcome {
        action,
        arn: settled.arn,
    })
}

fn wait_ready(
    functions: &impl FunctionControl,
    timing: &Timing<'_>,
    name: &str,
) -> Result<FunctionState, DeployError> {
    wait_until(
        timing.clock,
        &timing.poll,
        &format!("function {name}"),
        || {
            functions
                .get_function(name)
                .map_err(DeployError::at(format!("look up function {name}")))?
                .ok_or_else(|| DeployError::MissingOutput {
                    resource: format!("function {name}"),
                    output: "configuration",
                })
        },
        FunctionState::is_ready,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::cloud::{BindingSpec, InvokePermission, ProviderResult, StreamBinding};
    use crate::error::{ErrorClass, ErrorKind, ProviderError};
    use crate::test_helpers::{InMemoryCloud, ManualClock};

    fn spec(name: &str) -> FunctionSpec {
        FunctionSpec::new(
            name,
            "arn:aws:iam::123456789012:role/LabRole",
            BTreeMap::from([("TABLE_NAME".to_string(), "Inventory".to_string())]),
        )
    }

    #[test]
    fn new_specs_use_the_custom_runtime_settings() {
        let spec = spec("load_inventory_dev");
        assert_eq!(spec.runtime, "provided.al2023");
        assert_eq!(spec.handler, "bootstrap");
        assert_eq!(spec.timeout_seconds, 30);
        assert_eq!(spec.memory_mb, 256);
    }

    #[test]
    fn creates_then_updates() {
        let cloud = InMemoryCloud::new().with_pending_polls(1);
        let clock = ManualClock::new();
        let timing = Timing::new(&clock);

        let created = ensure_function(&cloud, &timing, &spec("load_inventory_dev"), b"zip-v1")
            .expect("create");
        assert_eq!(created.action, FunctionAction::Create);

        let updated = ensure_function(&cloud, &timing, &spec("load_inventory_dev"), b"zip-v2")
            .expect("update");
        assert_eq!(updated.action, FunctionAction::Update);
        assert_eq!(updated.arn, created.arn);

        let stored = cloud.function("load_inventory_dev").expect("stored");
        assert_eq!(stored.archive, b"zip-v2".to_vec());
        assert_eq!(stored.versions_published, 2);
    }

    #[test]
    fn update_retries_transient_conflicts() {
        let cloud = InMemoryCloud::new();
        let clock = ManualClock::new();
        let timing = Timing::new(&clock);
        ensure_function(&cloud, &timing, &spec("notify_low_stock_dev"), b"v1").expect("create");

        for _ in 0..2 {
            cloud.fail_next(
                "UpdateFunctionCode",
                ProviderError::new(
                    ErrorKind::TransientConflict,
                    "ResourceConflictException",
                    "An update is in progress",
                ),
            );
        }

        ensure_function(&cloud, &timing, &spec("notify_low_stock_dev"), b"v2").expect("update");
        assert_eq!(cloud.call_count("UpdateFunctionCode"), 3);
    }

    #[test]
    fn a_function_stuck_pending_times_out() {
        let cloud = InMemoryCloud::new().with_pending_polls(u32::MAX);
        let clock = ManualClock::new();

        let error = ensure_function(
            &cloud,
            &Timing::new(&clock),
            &spec("get_inventory_api_dev"),
            b"v1",
        )
        .expect_err("never ready");

        assert_eq!(error.class(), ErrorClass::ReadinessTimeout);
        assert!(error.to_string().contains("State=Pending"));
    }

    /// Reports the function as missing on the first lookup only.
    struct LateArrival<'a> {
        inner: &'a InMemoryCloud,
        first_lookup: Mutex<bool>,
    }

    impl FunctionControl for LateArrival<'_> {
        fn get_function(&self, name: &str) -> ProviderResult<Option<FunctionState>> {
            let mut first = self.first_lookup.lock().expect("poisoned mutex");
            if std::mem::replace(&mut *first, false) {
                return Ok(None);
            }
            self.inner.get_function(name)
        }

        fn create_function(&self, spec: &FunctionSpec, archive: &[u8]) -> ProviderResult<String> {
            self.inner.create_function(spec, archive)
        }

        fn update_function_code(&self, name: &str, archive: &[u8]) -> ProviderResult<()> {
            self.inner.update_function_code(name, archive)
        }

        fn update_function_configuration(&self, spec: &FunctionSpec) -> ProviderResult<()> {
            self.inner.update_function_configuration(spec)
        }

        fn add_permission(&self, permission: &InvokePermission) -> ProviderResult<()> {
            self.inner.add_permission(permission)
        }

        fn list_stream_bindings(&self, function: &str) -> ProviderResult<Vec<StreamBinding>> {
            self.inner.list_stream_bindings(function)
        }

        fn create_stream_binding(&self, spec: &BindingSpec) -> ProviderResult<String> {
            self.inner.create_stream_binding(spec)
        }

        fn delete_stream_binding(&self, uuid: &str) -> ProviderResult<()> {
            self.inner.delete_stream_binding(uuid)
        }

        fn delete_function(&self, name: &str) -> ProviderResult<()> {
            self.inner.delete_function(name)
        }
    }

    #[test]
    fn a_function_created_concurrently_is_updated_instead() {
        let cloud = InMemoryCloud::new();
        cloud.seed_function("load_inventory_dev");
        let functions = LateArrival {
            inner: &cloud,
            first_lookup: Mutex::new(true),
        };
        let clock = ManualClock::new();

        let outcome = ensure_function(
            &functions,
            &Timing::new(&clock),
            &spec("load_inventory_dev"),
            b"zip-v2",
        )
        .expect("update");

        assert_eq!(outcome.action, FunctionAction::Update);
        assert_eq!(cloud.call_count("CreateFunction"), 1);
        let stored = cloud.function("load_inventory_dev").expect("stored");
        assert_eq!(stored.archive, b"zip-v2".to_vec());
        assert_eq!(outcome.arn, stored.arn);
    }
}
