use inventory_core::contract::{IngestSummary, ObjectCreatedEvent};
use inventory_core::csv_rows::{dedupe_by_key, parse_inventory_csv};
use serde_json::Value;
use tracing::info;

use crate::adapters::inventory_table::InventoryWriter;
use crate::adapters::object_source::ObjectSource;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    #[error("invalid object-created event: {0}")]
    InvalidEvent(String),
    #[error("failed to read s3://{bucket}/{key}: {message}")]
    Read {
        bucket: String,
        key: String,
        message: String,
    },
    #[error("failed to parse s3://{bucket}/{key} as CSV: {message}")]
    Parse {
        bucket: String,
        key: String,
        message: String,
    },
    #[error("failed to write rows from s3://{bucket}/{key}: {message}")]
    Write {
        bucket: String,
        key: String,
        message: String,
    },
}

/// Loads every CSV object named in the event into the inventory table.
///
/// `written` counts accepted rows, including rows that overwrite an earlier
/// row for the same key in the same object.
pub fn handle_ingest_event(
    event: Value,
    source: &impl ObjectSource,
    table: &impl InventoryWriter,
) -> Result<IngestSummary, IngestError> {
    let event: ObjectCreatedEvent = serde_json::from_value(event)
        .map_err(|error| IngestError::InvalidEvent(error.to_string()))?;

    if event.records.is_empty() {
        return Ok(IngestSummary::no_records());
    }

    let mut total_written = 0usize;
    for record in &event.records {
        let bucket = record.s3.bucket.name.as_str();
        let key = record.s3.object.key.as_str();

        let bytes = source
            .read_object(bucket, key)
            .map_err(|message| IngestError::Read {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message,
            })?;
        let body = String::from_utf8_lossy(&bytes);

        let rows = parse_inventory_csv(&body).map_err(|error| IngestError::Parse {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message: error.to_string(),
        })?;
        let accepted = rows.len();

        table
            .put_rows(&dedupe_by_key(rows))
            .map_err(|message| IngestError::Write {
                bucket: bucket.to_string(),
                key: key.to_string(),
                message,
            })?;

        info!(bucket, key, rows = accepted, "object ingested");
        total_written += accepted;
    }

    Ok(IngestSummary::written(total_written))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use inventory_core::contract::InventoryRow;
    use serde_json::json;

    use super::*;

    struct FixtureSource {
        objects: HashMap<(String, String), Vec<u8>>,
    }

    impl FixtureSource {
        fn with(bucket: &str, key: &str, body: &str) -> Self {
            Self {
                objects: HashMap::from([(
                    (bucket.to_string(), key.to_string()),
                    body.as_bytes().to_vec(),
                )]),
            }
        }
    }

    impl ObjectSource for FixtureSource {
        fn read_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, String> {
            self.objects
                .get(&(bucket.to_string(), key.to_string()))
                .cloned()
                .ok_or_else(|| format!("NoSuchKey: {key}"))
        }
    }

    struct RecordingTable {
        batches: Mutex<Vec<Vec<InventoryRow>>>,
    }

    impl RecordingTable {
        fn new() -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
            }
        }

        fn rows(&self) -> Vec<InventoryRow> {
            self.batches
                .lock()
                .expect("poisoned mutex")
                .iter()
                .flatten()
                .cloned()
                .collect()
        }
    }

    impl InventoryWriter for RecordingTable {
        fn put_rows(&self, rows: &[InventoryRow]) -> Result<(), String> {
            self.batches
                .lock()
                .expect("poisoned mutex")
                .push(rows.to_vec());
            Ok(())
        }
    }

    fn created(bucket: &str, key: &str) -> Value {
        json!({
            "Records": [
                {"s3": {"bucket": {"name": bucket}, "object": {"key": key}}}
            ]
        })
    }

    #[test]
    fn empty_batches_report_no_records() {
        let table = RecordingTable::new();
        let summary = handle_ingest_event(
            json!({"Records": []}),
            &FixtureSource::with("b", "k", ""),
            &table,
        )
        .expect("ingest should succeed");

        assert_eq!(summary, IngestSummary::no_records());
        assert!(table.rows().is_empty());
    }

    #[test]
    fn writes_parsed_rows_and_counts_them() {
        let source = FixtureSource::with(
            "uploads",
            "stock.csv",
            "Store,Item,Count\nBerlin,Apples,3\nBerlin,Pears,many\n,Plums,1\n",
        );
        let table = RecordingTable::new();

        let summary =
            handle_ingest_event(created("uploads", "stock.csv"), &source, &table).expect("ok");

        assert_eq!(summary, IngestSummary::written(2));
        assert_eq!(
            table.rows(),
            vec![
                InventoryRow {
                    store: "Berlin".to_string(),
                    item: "Apples".to_string(),
                    count: 3
                },
                InventoryRow {
                    store: "Berlin".to_string(),
                    item: "Pears".to_string(),
                    count: 0
                },
            ]
        );
    }

    #[test]
    fn repeated_keys_are_written_once_with_the_last_count() {
        let source = FixtureSource::with(
            "uploads",
            "stock.csv",
            "store,item,count\nBerlin,Apples,3\nBerlin,Apples,8\n",
        );
        let table = RecordingTable::new();

        let summary =
            handle_ingest_event(created("uploads", "stock.csv"), &source, &table).expect("ok");

        assert_eq!(summary.written, Some(2));
        let rows = table.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].count, 8);
    }

    #[test]
    fn unreadable_objects_fail_the_batch() {
        let table = RecordingTable::new();
        let error = handle_ingest_event(
            created("uploads", "missing.csv"),
            &FixtureSource::with("uploads", "other.csv", ""),
            &table,
        )
        .expect_err("missing object should fail");

        assert!(matches!(error, IngestError::Read { .. }));
        assert!(table.rows().is_empty());
    }

    #[test]
    fn malformed_events_are_rejected() {
        let error = handle_ingest_event(
            json!({"Records": [{"s3": {}}]}),
            &FixtureSource::with("b", "k", ""),
            &RecordingTable::new(),
        )
        .expect_err("malformed event should fail");

        assert!(matches!(error, IngestError::InvalidEvent(_)));
    }
}
