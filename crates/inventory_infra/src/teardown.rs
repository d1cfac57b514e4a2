use std::fmt;

use tracing::{debug, info, warn};

use crate::cloud::{CloudProvider, ObjectVersion};
use crate::config::TeardownConfig;
use crate::error::ProviderError;
use crate::names::FunctionRole;

/// Largest batch a single delete-objects request accepts.
pub const DELETE_BATCH_LIMIT: usize = 1000;
const PENDING_SUBSCRIPTION: &str = "PendingConfirmation";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownOutcome {
    Deleted,
    AlreadyAbsent,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownEntry {
    pub resource: String,
    pub outcome: TeardownOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub entries: Vec<TeardownEntry>,
}

impl TeardownReport {
    fn record(&mut self, resource: String, outcome: TeardownOutcome) {
        match &outcome {
            TeardownOutcome::Deleted => info!(resource = %resource, "deleted"),
            TeardownOutcome::AlreadyAbsent => info!(resource = %resource, "already absent"),
            TeardownOutcome::Failed(message) => {
                warn!(resource = %resource, error = %message, "delete failed")
            }
        }
        self.entries.push(TeardownEntry { resource, outcome });
    }

    /// Records a delete call: success, "not found" as absent, anything else
    /// as a failure.
    fn record_result(&mut self, resource: String, result: Result<(), ProviderError>) {
        let outcome = match result {
            Ok(()) => TeardownOutcome::Deleted,
            Err(error) if error.is_not_found() => TeardownOutcome::AlreadyAbsent,
            Err(error) => TeardownOutcome::Failed(error.to_string()),
        };
        self.record(resource, outcome);
    }

    pub fn failures(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.outcome, TeardownOutcome::Failed(_)))
            .count()
    }

    pub fn outcome(&self, resource: &str) -> Option<&TeardownOutcome> {
        self.entries
            .iter()
            .find(|entry| entry.resource == resource)
            .map(|entry| &entry.outcome)
    }
}

impl fmt::Display for TeardownReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let deleted = self
            .entries
            .iter()
            .filter(|entry| entry.outcome == TeardownOutcome::Deleted)
            .count();
        write!(
            f,
            "teardown complete: {deleted} deleted, {} already absent, {} failed",
            self.entries.len() - deleted - self.failures(),
            self.failures()
        )
    }
}

/// Deletes the pipeline in reverse dependency order. Failures are recorded
/// and never stop the sequence.
pub fn teardown(cloud: &impl CloudProvider, config: &TeardownConfig) -> TeardownReport {
    let names = &config.names;
    let mut report = TeardownReport::default();

    delete_http_api(cloud, &names.api, &mut report);
    for role in FunctionRole::ALL {
        delete_function(cloud, names.function(role), &mut report);
    }
    delete_topic(cloud, &names.topic, &mut report);
    report.record_result(format!("table {}", names.table), cloud.delete_table(&names.table));
    for bucket in names.buckets() {
        delete_bucket(cloud, bucket, &mut report);
    }

    report
}

fn delete_http_api(cloud: &impl CloudProvider, name: &str, report: &mut TeardownReport) {
    let apis = match cloud.list_apis() {
        Ok(apis) => apis,
        Err(error) => {
            report.record(
                format!("http api {name}"),
                TeardownOutcome::Failed(error.to_string()),
            );
            return;
        }
    };

    let matching: Vec<_> = apis.into_iter().filter(|api| api.name == name).collect();
    if matching.is_empty() {
        report.record(format!("http api {name}"), TeardownOutcome::AlreadyAbsent);
    }
    for api in matching {
        report.record_result(format!("http api {name} ({})", api.id), cloud.delete_api(&api.id));
    }
}

fn delete_function(cloud: &impl CloudProvider, name: &str, report: &mut TeardownReport) {
    match cloud.list_stream_bindings(name) {
        Ok(bindings) => {
            for binding in bindings {
                report.record_result(
                    format!("stream binding {}", binding.uuid),
                    cloud.delete_stream_binding(&binding.uuid),
                );
            }
        }
        Err(error) if error.is_not_found() => {
            report.record(format!("function {name}"), TeardownOutcome::AlreadyAbsent);
            return;
        }
        Err(error) => report.record(
            format!("stream bindings of {name}"),
            TeardownOutcome::Failed(error.to_string()),
        ),
    }

    report.record_result(format!("function {name}"), cloud.delete_function(name));
}

fn delete_topic(cloud: &impl CloudProvider, name: &str, report: &mut TeardownReport) {
    let topic_arns = match cloud.list_topic_arns() {
        Ok(arns) => arns,
        Err(error) => {
            report.record(
                format!("topic {name}"),
                TeardownOutcome::Failed(error.to_string()),
            );
            return;
        }
    };

    let arn_suffix = format!(":{name}");
    let matching: Vec<_> = topic_arns
        .into_iter()
        .filter(|arn| arn.ends_with(&arn_suffix))
        .collect();
    if matching.is_empty() {
        report.record(format!("topic {name}"), TeardownOutcome::AlreadyAbsent);
    }

    for topic_arn in matching {
        match cloud.list_subscription_arns(&topic_arn) {
            Ok(subscriptions) => {
                for subscription in subscriptions
                    .iter()
                    .filter(|arn| !arn.is_empty() && arn.as_str() != PENDING_SUBSCRIPTION)
                {
                    report.record_result(
                        format!("subscription {subscription}"),
                        cloud.unsubscribe(subscription),
                    );
                }
            }
            Err(error) => report.record(
                format!("subscriptions of {topic_arn}"),
                TeardownOutcome::Failed(error.to_string()),
            ),
        }
        report.record_result(format!("topic {topic_arn}"), cloud.delete_topic(&topic_arn));
    }
}

fn delete_bucket(cloud: &impl CloudProvider, bucket: &str, report: &mut TeardownReport) {
    let resource = format!("bucket {bucket}");
    match cloud.bucket_exists(bucket) {
        Ok(true) => {}
        Ok(false) => {
            report.record(resource, TeardownOutcome::AlreadyAbsent);
            return;
        }
        Err(error) => {
            report.record(resource, TeardownOutcome::Failed(error.to_string()));
            return;
        }
    }

    // Versioning may never have been enabled; failures here are expected.
    match cloud.list_object_versions(bucket) {
        Ok(versions) => {
            for batch in versions.chunks(DELETE_BATCH_LIMIT) {
                if let Err(error) = cloud.delete_objects(bucket, batch) {
                    debug!(bucket, error = %error, "deleting object versions failed");
                }
            }
        }
        Err(error) => debug!(bucket, error = %error, "listing object versions failed"),
    }

    let emptied = cloud.list_object_keys(bucket).and_then(|keys| {
        let objects: Vec<ObjectVersion> = keys
            .into_iter()
            .map(|key| ObjectVersion {
                key,
                version_id: None,
            })
            .collect();
        objects
            .chunks(DELETE_BATCH_LIMIT)
            .try_for_each(|batch| cloud.delete_objects(bucket, batch))
    });
    if let Err(error) = emptied {
        if !error.is_not_found() {
            report.record(resource, TeardownOutcome::Failed(error.to_string()));
            return;
        }
    }

    report.record_result(resource, cloud.delete_bucket(bucket));
}
