use serde::{Deserialize, Serialize};

pub const DEFAULT_TABLE_NAME: &str = "Inventory";
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 2;

pub const STORE_ATTRIBUTE: &str = "Store";
pub const ITEM_ATTRIBUTE: &str = "Item";
pub const COUNT_ATTRIBUTE: &str = "Count";

pub const LOW_STOCK_ALERT_TYPE: &str = "LOW_STOCK";
/// Longest subject the topic accepts.
pub const MAX_SUBJECT_LEN: usize = 99;

/// Environment variables the provisioner sets on the functions.
pub const TABLE_NAME_ENV: &str = "TABLE_NAME";
pub const TOPIC_ARN_ENV: &str = "TOPIC_ARN";
pub const THRESHOLD_ENV: &str = "THRESHOLD";

/// One inventory line as stored in the table, keyed by (store, item).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRow {
    pub store: String,
    pub item: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSummary {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written: Option<usize>,
}

impl IngestSummary {
    pub fn no_records() -> Self {
        Self {
            ok: true,
            msg: Some("no records".to_string()),
            written: None,
        }
    }

    pub fn written(count: usize) -> Self {
        Self {
            ok: true,
            msg: None,
            written: Some(count),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub ok: bool,
    pub alerts_sent: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LowStockAlert {
    #[serde(rename = "type")]
    pub alert_type: String,
    pub store: String,
    pub item: String,
    pub count: i64,
    pub threshold: i64,
}

impl LowStockAlert {
    pub fn new(store: impl Into<String>, item: impl Into<String>, count: i64, threshold: i64) -> Self {
        Self {
            alert_type: LOW_STOCK_ALERT_TYPE.to_string(),
            store: store.into(),
            item: item.into(),
            count,
            threshold,
        }
    }

    /// Printable ASCII only, at most [`MAX_SUBJECT_LEN`] characters. Other
    /// characters become `?`; the message keeps the original text.
    pub fn subject(&self) -> String {
        format!("Low stock: {} - {}", self.store, self.item)
            .chars()
            .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
            .take(MAX_SUBJECT_LEN)
            .collect()
    }

    pub fn message(&self) -> String {
        serde_json::to_string(self).expect("low stock alert should serialize")
    }
}

/// Object-created notification batch delivered to the ingestion function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectCreatedEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<ObjectCreatedRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectCreatedRecord {
    pub s3: ObjectLocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket: BucketRef,
    pub object: ObjectRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub key: String,
}
