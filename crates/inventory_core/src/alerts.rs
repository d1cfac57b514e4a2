use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::contract::{LowStockAlert, COUNT_ATTRIBUTE, ITEM_ATTRIBUTE, STORE_ATTRIBUTE};

/// Change-stream batch delivered to the notifier function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeStreamEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<ChangeRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    #[serde(rename = "eventName", default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub dynamodb: Option<ChangeImages>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeImages {
    #[serde(rename = "NewImage", default)]
    pub new_image: Option<BTreeMap<String, WireAttribute>>,
}

/// Attribute value in the stream wire format, e.g. `{"S": "Berlin"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireAttribute {
    #[serde(rename = "S", default, skip_serializing_if = "Option::is_none")]
    pub s: Option<String>,
    #[serde(rename = "N", default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
}

fn is_upsert(event_name: Option<&str>) -> bool {
    matches!(event_name, Some("INSERT") | Some("MODIFY"))
}

/// Extracts the (store, item, count) triple from an insert/modify record.
pub fn changed_stock(record: &ChangeRecord) -> Option<(String, String, i64)> {
    if !is_upsert(record.event_name.as_deref()) {
        return None;
    }

    let image = record.dynamodb.as_ref()?.new_image.as_ref()?;
    let store = image.get(STORE_ATTRIBUTE)?.s.clone()?;
    let item = image.get(ITEM_ATTRIBUTE)?.s.clone()?;
    let count = image.get(COUNT_ATTRIBUTE)?.n.as_deref()?.trim().parse::<i64>().ok()?;

    Some((store, item, count))
}

/// Every insert/modify in the batch whose count is at or below `threshold`.
/// Repeated alerts for the same item are not suppressed.
pub fn low_stock_alerts(event: &ChangeStreamEvent, threshold: i64) -> Vec<LowStockAlert> {
    event
        .records
        .iter()
        .filter_map(changed_stock)
        .filter(|(_, _, count)| *count <= threshold)
        .map(|(store, item, count)| LowStockAlert::new(store, item, count, threshold))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn event(value: serde_json::Value) -> ChangeStreamEvent {
        serde_json::from_value(value).expect("stream event should parse")
    }

    fn record(event_name: &str, count: &str) -> serde_json::Value {
        json!({
            "eventName": event_name,
            "dynamodb": {
                "NewImage": {
                    "Store": {"S": "Berlin"},
                    "Item": {"S": "Apples"},
                    "Count": {"N": count}
                }
            }
        })
    }

    #[test]
    fn insert_at_or_below_threshold_raises_one_alert() {
        let alerts = low_stock_alerts(&event(json!({"Records": [record("INSERT", "1")]})), 2);

        assert_eq!(alerts, vec![LowStockAlert::new("Berlin", "Apples", 1, 2)]);
    }

    #[test]
    fn remove_records_never_alert() {
        let alerts = low_stock_alerts(&event(json!({"Records": [record("REMOVE", "0")]})), 2);
        assert!(alerts.is_empty());
    }

    #[test]
    fn modify_above_threshold_is_ignored_and_equal_count_alerts() {
        let alerts = low_stock_alerts(
            &event(json!({"Records": [record("MODIFY", "3"), record("MODIFY", "2")]})),
            2,
        );
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].count, 2);
    }

    #[test]
    fn records_with_incomplete_images_are_skipped() {
        let alerts = low_stock_alerts(
            &event(json!({
                "Records": [
                    {"eventName": "INSERT"},
                    {"eventName": "INSERT", "dynamodb": {"NewImage": {"Store": {"S": "Berlin"}}}},
                    record("INSERT", "not-a-number")
                ]
            })),
            2,
        );
        assert!(alerts.is_empty());
    }

    #[test]
    fn repeated_modifications_alert_every_time() {
        let alerts = low_stock_alerts(
            &event(json!({"Records": [record("MODIFY", "1"), record("MODIFY", "0")]})),
            2,
        );
        assert_eq!(alerts.len(), 2);
    }
}
