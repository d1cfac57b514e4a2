use std::fs;

use inventory_infra::config::{DeployConfig, TeardownConfig};
use inventory_infra::ensure::Timing;
use inventory_infra::names::{FunctionRole, ResourceNames};
use inventory_infra::provision::Provisioner;
use inventory_infra::teardown::{teardown, TeardownOutcome};
use inventory_infra::test_helpers::{InMemoryCloud, ManualClock, ResourceCounts};

fn teardown_config() -> TeardownConfig {
    TeardownConfig {
        region: "us-east-1".to_string(),
        names: ResourceNames::new("dev", "Inventory"),
    }
}

fn provision(cloud: &InMemoryCloud, workspace: &tempfile::TempDir, email: Option<&str>) -> String {
    let root = workspace.path();
    for role in FunctionRole::ALL {
        let function_dir = root.join("artifacts").join(role.base_name());
        fs::create_dir_all(&function_dir).expect("create artifact dir");
        fs::write(function_dir.join("bootstrap"), b"binary").expect("write bootstrap");
    }
    fs::create_dir_all(root.join("web")).expect("create web dir");
    fs::write(root.join("web").join("index.html"), "<html></html>").expect("write index");

    let config = DeployConfig {
        region: "us-east-1".to_string(),
        names: ResourceNames::new("dev", "Inventory"),
        role_arn: "arn:aws:iam::123456789012:role/LabRole".to_string(),
        notify_email: email.map(str::to_string),
        threshold: 2,
        artifacts_dir: root.join("artifacts"),
        build_dir: root.join(".build"),
        web_dir: root.join("web"),
    };
    let clock = ManualClock::new();
    Provisioner::new(cloud, Timing::new(&clock))
        .run(&config)
        .expect("deploy")
        .topic_arn
}

#[test]
fn teardown_of_an_empty_account_completes() {
    let cloud = InMemoryCloud::new();

    let report = teardown(&cloud, &teardown_config());

    assert_eq!(report.failures(), 0);
    assert!(report
        .entries
        .iter()
        .all(|entry| entry.outcome == TeardownOutcome::AlreadyAbsent));
    assert_eq!(cloud.call_count("DeleteBucket"), 0);
    assert_eq!(
        report.to_string(),
        format!(
            "teardown complete: 0 deleted, {} already absent, 0 failed",
            report.entries.len()
        )
    );
}

#[test]
fn teardown_removes_everything_provisioning_created() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let cloud = InMemoryCloud::new();
    provision(&cloud, &workspace, Some("ops@example.com"));
    cloud.seed_object("inventory-uploads-dev", "stock/berlin.csv");

    let report = teardown(&cloud, &teardown_config());

    assert_eq!(report.failures(), 0);
    assert_eq!(cloud.counts(), ResourceCounts::default());
    assert_eq!(
        report.outcome("function notify_low_stock_dev"),
        Some(&TeardownOutcome::Deleted)
    );
    assert_eq!(
        report.outcome("table Inventory"),
        Some(&TeardownOutcome::Deleted)
    );
    assert_eq!(cloud.call_count("DeleteEventSourceMapping"), 1);
    assert_eq!(cloud.call_count("Unsubscribe"), 0);
}

#[test]
fn confirmed_subscriptions_are_removed_before_the_topic() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let cloud = InMemoryCloud::new();
    let topic_arn = provision(&cloud, &workspace, Some("ops@example.com"));
    cloud.confirm_subscriptions(&topic_arn);

    let report = teardown(&cloud, &teardown_config());

    assert_eq!(report.failures(), 0);
    assert_eq!(cloud.call_count("Unsubscribe"), 1);
    assert_eq!(
        report.outcome(&format!("topic {topic_arn}")),
        Some(&TeardownOutcome::Deleted)
    );
    assert!(cloud.topic_arns().is_empty());
}

#[test]
fn teardown_twice_reports_the_second_run_as_absent() {
    let workspace = tempfile::tempdir().expect("tempdir");
    let cloud = InMemoryCloud::new();
    provision(&cloud, &workspace, None);

    let first = teardown(&cloud, &teardown_config());
    let second = teardown(&cloud, &teardown_config());

    assert_eq!(first.failures(), 0);
    assert_eq!(second.failures(), 0);
    assert!(second
        .entries
        .iter()
        .all(|entry| entry.outcome == TeardownOutcome::AlreadyAbsent));
}
