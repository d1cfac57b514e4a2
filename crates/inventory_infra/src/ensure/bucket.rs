use tracing::info;

use crate::cloud::ObjectStorage;
use crate::error::DeployError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketAction {
    Create,
    Reuse,
}

pub fn plan_bucket(exists: bool) -> BucketAction {
    if exists {
        BucketAction::Reuse
    } else {
        BucketAction::Create
    }
}

pub fn ensure_bucket(
    storage: &impl ObjectStorage,
    bucket: &str,
    region: &str,
) -> Result<BucketAction, DeployError> {
    let exists = storage
        .bucket_exists(bucket)
        .map_err(DeployError::at(format!("look up bucket {bucket}")))?;

    let action = plan_bucket(exists);
    match action {
        BucketAction::Reuse => info!(bucket, "bucket exists"),
        BucketAction::Create => match storage.create_bucket(bucket, region) {
            Ok(()) => info!(bucket, region, "bucket created"),
            Err(error) if error.is_already_exists() => info!(bucket, "bucket already owned"),
            Err(error) => return Err(DeployError::at(format!("create bucket {bucket}"))(error)),
        },
    }
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ProviderError};
    use crate::test_helpers::InMemoryCloud;

    #[test]
    fn creates_missing_buckets_once() {
        let cloud = InMemoryCloud::new();

        assert_eq!(
            ensure_bucket(&cloud, "inventory-web-dev", "eu-west-1").expect("create"),
            BucketAction::Create
        );
        assert_eq!(
            ensure_bucket(&cloud, "inventory-web-dev", "eu-west-1").expect("reuse"),
            BucketAction::Reuse
        );
        assert_eq!(cloud.bucket_names(), vec!["inventory-web-dev".to_string()]);
    }

    #[test]
    fn already_owned_is_success() {
        let cloud = InMemoryCloud::new();
        cloud.fail_next(
            "CreateBucket",
            ProviderError::new(
                ErrorKind::AlreadyExists,
                "BucketAlreadyOwnedByYou",
                "already owned",
            ),
        );

        assert!(ensure_bucket(&cloud, "inventory-web-dev", "us-east-1").is_ok());
    }

    #[test]
    fn names_taken_by_someone_else_fail() {
        let cloud = InMemoryCloud::new();
        cloud.fail_next(
            "CreateBucket",
            ProviderError::new(ErrorKind::Other, "BucketAlreadyExists", "taken"),
        );

        let error = ensure_bucket(&cloud, "inventory-web-dev", "us-east-1").expect_err("taken");
        assert!(error.to_string().contains("BucketAlreadyExists"));
    }
}
