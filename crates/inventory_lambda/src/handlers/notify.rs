use inventory_core::alerts::{low_stock_alerts, ChangeStreamEvent};
use inventory_core::contract::AlertSummary;
use serde_json::Value;
use tracing::info;

use crate::adapters::alert_publisher::AlertPublisher;
use crate::config::NotifierConfig;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotifyError {
    #[error("invalid change stream event: {0}")]
    InvalidEvent(String),
    #[error("failed to publish low stock alert for {store}/{item}: {message}")]
    Publish {
        store: String,
        item: String,
        message: String,
    },
}

pub fn handle_change_stream(
    event: Value,
    config: &NotifierConfig,
    publisher: &impl AlertPublisher,
) -> Result<AlertSummary, NotifyError> {
    let event: ChangeStreamEvent = serde_json::from_value(event)
        .map_err(|error| NotifyError::InvalidEvent(error.to_string()))?;

    let mut alerts_sent = 0usize;
    for alert in low_stock_alerts(&event, config.threshold) {
        publisher
            .publish(&alert.subject(), &alert.message())
            .map_err(|message| NotifyError::Publish {
                store: alert.store.clone(),
                item: alert.item.clone(),
                message,
            })?;
        info!(
            store = %alert.store,
            item = %alert.item,
            count = alert.count,
            threshold = alert.threshold,
            "low stock alert published"
        );
        alerts_sent += 1;
    }

    Ok(AlertSummary {
        ok: true,
        alerts_sent,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    struct CapturingPublisher {
        messages: Mutex<Vec<(String, String)>>,
    }

    impl CapturingPublisher {
        fn new() -> Self {
            Self {
                messages: Mutex::new(Vec::new()),
            }
        }

        fn messages(&self) -> Vec<(String, String)> {
            self.messages.lock().expect("poisoned mutex").clone()
        }
    }

    impl AlertPublisher for CapturingPublisher {
        fn publish(&self, subject: &str, message: &str) -> Result<(), String> {
            self.messages
                .lock()
                .expect("poisoned mutex")
                .push((subject.to_string(), message.to_string()));
            Ok(())
        }
    }

    struct RejectingPublisher;

    impl AlertPublisher for RejectingPublisher {
        fn publish(&self, _subject: &str, _message: &str) -> Result<(), String> {
            Err("AuthorizationError".to_string())
        }
    }

    fn config() -> NotifierConfig {
        NotifierConfig {
            topic_arn: "arn:aws:sns:us-east-1:123456789012:inventory-low-stock-test".to_string(),
            threshold: 2,
        }
    }

    fn stream(event_name: &str, count: &str) -> Value {
        json!({
            "Records": [{
                "eventName": event_name,
                "dynamodb": {
                    "NewImage": {
                        "Store": {"S": "Berlin"},
                        "Item": {"S": "Apples"},
                        "Count": {"N": count}
                    }
                }
            }]
        })
    }

    #[test]
    fn insert_below_threshold_publishes_exactly_once() {
        let publisher = CapturingPublisher::new();
        let summary =
            handle_change_stream(stream("INSERT", "1"), &config(), &publisher).expect("ok");

        assert_eq!(summary.alerts_sent, 1);
        let messages = publisher.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, "Low stock: Berlin - Apples");
        let payload: Value = serde_json::from_str(&messages[0].1).expect("message is JSON");
        assert_eq!(
            payload,
            json!({"type": "LOW_STOCK", "store": "Berlin", "item": "Apples", "count": 1, "threshold": 2})
        );
    }

    #[test]
    fn remove_events_publish_nothing() {
        let publisher = CapturingPublisher::new();
        let summary =
            handle_change_stream(stream("REMOVE", "0"), &config(), &publisher).expect("ok");

        assert_eq!(summary.alerts_sent, 0);
        assert!(publisher.messages().is_empty());
    }

    #[test]
    fn publish_failures_are_reported() {
        let error = handle_change_stream(stream("MODIFY", "0"), &config(), &RejectingPublisher)
            .expect_err("publish failure should surface");

        assert!(matches!(error, NotifyError::Publish { .. }));
    }

    #[test]
    fn empty_events_send_no_alerts() {
        let summary =
            handle_change_stream(json!({}), &config(), &CapturingPublisher::new()).expect("ok");
        assert_eq!(summary.alerts_sent, 0);
    }
}
