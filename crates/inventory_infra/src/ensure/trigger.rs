use tracing::info;

use super::permission::{grant_invoke, Grant};
use crate::cloud::{FunctionControl, InvokePermission, ObjectStorage, ObjectTrigger};
use crate::error::DeployError;

pub const CSV_SUFFIX: &str = ".csv";
pub const OBJECT_CREATED_EVENTS: &str = "s3:ObjectCreated:*";

pub fn object_trigger_permission(bucket: &str, function_arn: &str) -> InvokePermission {
    InvokePermission {
        function: function_arn.to_string(),
        statement_id: format!("s3invoke-{bucket}"),
        principal: "s3.amazonaws.com".to_string(),
        source_arn: format!("arn:aws:s3:::{bucket}"),
    }
}

/// Routes `.csv` uploads in `bucket` to the ingestion function. The bucket's
/// notification configuration is replaced on every run.
pub fn ensure_object_trigger(
    storage: &impl ObjectStorage,
    functions: &impl FunctionControl,
    bucket: &str,
    function_arn: &str,
) -> Result<Grant, DeployError> {
    let grant = grant_invoke(functions, &object_trigger_permission(bucket, function_arn))?;

    let trigger = ObjectTrigger {
        bucket: bucket.to_string(),
        function_arn: function_arn.to_string(),
        events: vec![OBJECT_CREATED_EVENTS.to_string()],
        key_suffix: CSV_SUFFIX.to_string(),
    };
    storage
        .put_object_trigger(&trigger)
        .map_err(DeployError::at(format!("configure notifications on {bucket}")))?;
    info!(bucket, "object-created trigger configured");

    Ok(grant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::InMemoryCloud;

    const FUNCTION_ARN: &str = "arn:aws:lambda:us-east-1:123456789012:function:load_inventory_dev";

    #[test]
    fn permission_names_the_bucket() {
        let permission = object_trigger_permission("inventory-uploads-dev", FUNCTION_ARN);
        assert_eq!(permission.statement_id, "s3invoke-inventory-uploads-dev");
        assert_eq!(permission.source_arn, "arn:aws:s3:::inventory-uploads-dev");
        assert_eq!(permission.principal, "s3.amazonaws.com");
    }

    #[test]
    fn rerunning_tolerates_the_existing_grant() {
        let cloud = InMemoryCloud::new();
        cloud.seed_function("load_inventory_dev");
        cloud.seed_bucket("inventory-uploads-dev");

        let first = ensure_object_trigger(&cloud, &cloud, "inventory-uploads-dev", FUNCTION_ARN)
            .expect("first");
        let second = ensure_object_trigger(&cloud, &cloud, "inventory-uploads-dev", FUNCTION_ARN)
            .expect("second");

        assert_eq!(first, Grant::Granted);
        assert_eq!(second, Grant::AlreadyGranted);
        assert_eq!(cloud.counts().permissions, 1);

        let trigger = cloud.trigger("inventory-uploads-dev").expect("trigger set");
        assert_eq!(trigger.key_suffix, ".csv");
        assert_eq!(trigger.events, vec!["s3:ObjectCreated:*".to_string()]);
    }
}
