use tracing::info;

use crate::cloud::TopicControl;
use crate::error::DeployError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionAction {
    Subscribe(String),
    Skip,
}

pub fn plan_subscription(email: Option<&str>) -> SubscriptionAction {
    match email.map(str::trim) {
        Some(email) if !email.is_empty() => SubscriptionAction::Subscribe(email.to_string()),
        _ => SubscriptionAction::Skip,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicOutcome {
    pub arn: String,
    pub subscribed: Option<String>,
}

/// Creates (or looks up) the alert topic and subscribes the e-mail endpoint
/// when one is configured. Confirmation happens out of band.
pub fn ensure_topic(
    topics: &impl TopicControl,
    name: &str,
    email: Option<&str>,
) -> Result<TopicOutcome, DeployError> {
    let arn = topics
        .create_topic(name)
        .map_err(DeployError::at(format!("create topic {name}")))?;
    info!(topic = %arn, "topic ready");

    let subscribed = match plan_subscription(email) {
        SubscriptionAction::Skip => None,
        SubscriptionAction::Subscribe(email) => {
            topics
                .subscribe_email(&arn, &email)
                .map_err(DeployError::at(format!("subscribe {email} to {name}")))?;
            info!(topic = %arn, "e-mail subscription requested");
            Some(email)
        }
    };

    Ok(TopicOutcome { arn, subscribed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::InMemoryCloud;

    #[test]
    fn blank_emails_are_skipped() {
        assert_eq!(plan_subscription(None), SubscriptionAction::Skip);
        assert_eq!(plan_subscription(Some("  ")), SubscriptionAction::Skip);
        assert_eq!(
            plan_subscription(Some("ops@example.com")),
            SubscriptionAction::Subscribe("ops@example.com".to_string())
        );
    }

    #[test]
    fn topic_creation_is_idempotent() {
        let cloud = InMemoryCloud::new();

        let first = ensure_topic(&cloud, "inventory-low-stock-dev", None).expect("first");
        let second = ensure_topic(&cloud, "inventory-low-stock-dev", None).expect("second");

        assert_eq!(first.arn, second.arn);
        assert_eq!(cloud.counts().topics, 1);
        assert!(first.arn.ends_with(":inventory-low-stock-dev"));
    }

    #[test]
    fn email_subscriptions_start_pending() {
        let cloud = InMemoryCloud::new();

        let outcome =
            ensure_topic(&cloud, "inventory-low-stock-dev", Some("ops@example.com")).expect("ok");

        assert_eq!(outcome.subscribed.as_deref(), Some("ops@example.com"));
        assert_eq!(
            cloud.subscriptions(&outcome.arn),
            vec!["PendingConfirmation".to_string()]
        );
    }
}
