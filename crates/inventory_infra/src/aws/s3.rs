use std::time::Duration;

use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, Delete, Event, FilterRule,
    FilterRuleName, LambdaFunctionConfiguration, NotificationConfiguration,
    NotificationConfigurationFilter, ObjectIdentifier, S3KeyFilter,
};

use super::errors::{from_sdk, malformed};
use super::AwsCloud;
use crate::cloud::{ObjectStorage, ObjectTrigger, ObjectVersion, ProviderResult};

/// Region whose buckets must be created without a location constraint.
const DEFAULT_LOCATION: &str = "us-east-1";

impl ObjectStorage for AwsCloud {
    fn bucket_exists(&self, bucket: &str) -> ProviderResult<bool> {
        let result = self.block_on(self.s3.head_bucket().bucket(bucket).send());
        match result {
            Ok(_) => Ok(true),
            Err(error) => {
                let error = from_sdk("HeadBucket", error);
                if error.is_not_found() {
                    Ok(false)
                } else {
                    Err(error)
                }
            }
        }
    }

    fn create_bucket(&self, bucket: &str, region: &str) -> ProviderResult<()> {
        let location = (region != DEFAULT_LOCATION).then(|| {
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(region))
                .build()
        });
        self.block_on(
            self.s3
                .create_bucket()
                .bucket(bucket)
                .set_create_bucket_configuration(location)
                .send(),
        )
        .map_err(|error| from_sdk("CreateBucket", error))?;
        Ok(())
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> ProviderResult<()> {
        self.block_on(
            self.s3
                .put_object()
                .bucket(bucket)
                .key(key)
                .content_type(content_type)
                .body(ByteStream::from(body))
                .send(),
        )
        .map_err(|error| from_sdk("PutObject", error))?;
        Ok(())
    }

    fn presign_get(&self, bucket: &str, key: &str, expires_in: Duration) -> ProviderResult<String> {
        let config = PresigningConfig::expires_in(expires_in)
            .map_err(|error| malformed("PresignGetObject", error))?;
        let request = self
            .block_on(self.s3.get_object().bucket(bucket).key(key).presigned(config))
            .map_err(|error| from_sdk("PresignGetObject", error))?;
        Ok(request.uri().to_string())
    }

    fn put_object_trigger(&self, trigger: &ObjectTrigger) -> ProviderResult<()> {
        let operation = "PutBucketNotificationConfiguration";
        let filter = NotificationConfigurationFilter::builder()
            .key(
                S3KeyFilter::builder()
                    .filter_rules(
                        FilterRule::builder()
                            .name(FilterRuleName::Suffix)
                            .value(&trigger.key_suffix)
                            .build(),
                    )
                    .build(),
            )
            .build();
        let function = LambdaFunctionConfiguration::builder()
            .lambda_function_arn(&trigger.function_arn)
            .set_events(Some(
                trigger.events.iter().map(|event| Event::from(event.as_str())).collect(),
            ))
            .filter(filter)
            .build()
            .map_err(|error| malformed(operation, error))?;

        self.block_on(
            self.s3
                .put_bucket_notification_configuration()
                .bucket(&trigger.bucket)
                .notification_configuration(
                    NotificationConfiguration::builder()
                        .lambda_function_configurations(function)
                        .build(),
                )
                .send(),
        )
        .map_err(|error| from_sdk(operation, error))?;
        Ok(())
    }

    fn list_object_versions(&self, bucket: &str) -> ProviderResult<Vec<ObjectVersion>> {
        let mut versions = Vec::new();
        let mut key_marker: Option<String> = None;
        let mut version_marker: Option<String> = None;

        loop {
            let page = self
                .block_on(
                    self.s3
                        .list_object_versions()
                        .bucket(bucket)
                        .set_key_marker(key_marker.take())
                        .set_version_id_marker(version_marker.take())
                        .send(),
                )
                .map_err(|error| from_sdk("ListObjectVersions", error))?;

            let entries = page
                .versions()
                .iter()
                .map(|version| (version.key(), version.version_id()))
                .chain(
                    page.delete_markers()
                        .iter()
                        .map(|marker| (marker.key(), marker.version_id())),
                );
            for (key, version_id) in entries {
                if let Some(key) = key {
                    versions.push(ObjectVersion {
                        key: key.to_string(),
                        version_id: version_id.map(str::to_string),
                    });
                }
            }

            if !page.is_truncated().unwrap_or(false) {
                break;
            }
            key_marker = page.next_key_marker().map(str::to_string);
            version_marker = page.next_version_id_marker().map(str::to_string);
            if key_marker.is_none() && version_marker.is_none() {
                break;
            }
        }

        Ok(versions)
    }

    fn list_object_keys(&self, bucket: &str) -> ProviderResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let page = self
                .block_on(
                    self.s3
                        .list_objects_v2()
                        .bucket(bucket)
                        .set_continuation_token(token.take())
                        .send(),
                )
                .map_err(|error| from_sdk("ListObjectsV2", error))?;

            keys.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );

            match page.next_continuation_token() {
                Some(next) if page.is_truncated().unwrap_or(false) => token = Some(next.to_string()),
                _ => break,
            }
        }

        Ok(keys)
    }

    fn delete_objects(&self, bucket: &str, objects: &[ObjectVersion]) -> ProviderResult<()> {
        let operation = "DeleteObjects";
        if objects.is_empty() {
            return Ok(());
        }

        let identifiers = objects
            .iter()
            .map(|object| {
                ObjectIdentifier::builder()
                    .key(&object.key)
                    .set_version_id(object.version_id.clone())
                    .build()
                    .map_err(|error| malformed(operation, error))
            })
            .collect::<ProviderResult<Vec<_>>>()?;
        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .quiet(true)
            .build()
            .map_err(|error| malformed(operation, error))?;

        self.block_on(self.s3.delete_objects().bucket(bucket).delete(delete).send())
            .map_err(|error| from_sdk(operation, error))?;
        Ok(())
    }

    fn delete_bucket(&self, bucket: &str) -> ProviderResult<()> {
        self.block_on(self.s3.delete_bucket().bucket(bucket).send())
            .map_err(|error| from_sdk("DeleteBucket", error))?;
        Ok(())
    }
}
