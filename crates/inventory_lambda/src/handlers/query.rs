use inventory_core::api::{
    json_response, preflight_response, render_rows, ApiGatewayResponse, HttpApiRequest,
    InventoryQuery,
};
use serde_json::{json, Value};
use tracing::error;

use crate::adapters::inventory_table::InventoryReader;

pub fn handle_query_event(event: Value, table: &impl InventoryReader) -> ApiGatewayResponse {
    let request = match serde_json::from_value::<HttpApiRequest>(event) {
        Ok(value) => value,
        Err(error) => {
            return json_response(
                400,
                json!({
                    "error": "validation_error",
                    "message": format!("Malformed request: {error}"),
                }),
            );
        }
    };

    let items = match request.query() {
        InventoryQuery::Preflight => return preflight_response(),
        InventoryQuery::Store(store) => table.query_store(&store),
        InventoryQuery::All => table.scan_all(),
    };

    match items {
        Ok(items) => json_response(200, render_rows(&items)),
        Err(message) => {
            error!(error = %message, "inventory table read failed");
            json_response(
                500,
                json!({
                    "error": "table_error",
                    "message": message,
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use inventory_core::attributes::{StoredAttribute, StoredItem};

    use super::*;

    struct FixtureTable {
        items: Vec<StoredItem>,
        reads: AtomicUsize,
    }

    impl FixtureTable {
        fn new() -> Self {
            Self {
                items: vec![
                    item("Berlin", "Apples", "3"),
                    item("Madrid", "Oranges", "2.5"),
                    item("Berlin", "Pears", "0"),
                ],
                reads: AtomicUsize::new(0),
            }
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    impl InventoryReader for FixtureTable {
        fn query_store(&self, store: &str) -> Result<Vec<StoredItem>, String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .items
                .iter()
                .filter(|item| item.get("Store").and_then(StoredAttribute::as_text) == Some(store))
                .cloned()
                .collect())
        }

        fn scan_all(&self) -> Result<Vec<StoredItem>, String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.items.clone())
        }
    }

    struct FailingTable;

    impl InventoryReader for FailingTable {
        fn query_store(&self, _store: &str) -> Result<Vec<StoredItem>, String> {
            Err("AccessDeniedException".to_string())
        }

        fn scan_all(&self) -> Result<Vec<StoredItem>, String> {
            Err("AccessDeniedException".to_string())
        }
    }

    fn item(store: &str, name: &str, count: &str) -> StoredItem {
        StoredItem::from([
            ("Store".to_string(), StoredAttribute::S(store.to_string())),
            ("Item".to_string(), StoredAttribute::S(name.to_string())),
            ("Count".to_string(), StoredAttribute::N(count.to_string())),
        ])
    }

    fn body(response: &ApiGatewayResponse) -> Value {
        serde_json::from_str(&response.body).expect("body should be JSON")
    }

    #[test]
    fn store_parameter_returns_only_that_store() {
        let table = FixtureTable::new();
        let response = handle_query_event(
            json!({
                "requestContext": {"http": {"method": "GET"}},
                "pathParameters": {"store": "Berlin"}
            }),
            &table,
        );

        assert_eq!(response.status_code, 200);
        let rows = body(&response);
        let rows = rows.as_array().expect("array body");
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row["store"] == "Berlin"));
    }

    #[test]
    fn no_parameter_returns_all_rows_with_normalized_counts() {
        let table = FixtureTable::new();
        let response = handle_query_event(
            json!({"requestContext": {"http": {"method": "GET"}}}),
            &table,
        );

        assert_eq!(
            body(&response),
            json!([
                {"store": "Berlin", "item": "Apples", "count": 3},
                {"store": "Madrid", "item": "Oranges", "count": 2.5},
                {"store": "Berlin", "item": "Pears", "count": 0}
            ])
        );
    }

    #[test]
    fn options_returns_ok_without_reading_the_table() {
        let table = FixtureTable::new();
        let response = handle_query_event(
            json!({
                "requestContext": {"http": {"method": "OPTIONS"}},
                "pathParameters": {"store": "Berlin"}
            }),
            &table,
        );

        assert_eq!(response.status_code, 200);
        assert_eq!(body(&response), json!({"ok": true}));
        assert_eq!(table.reads(), 0);
    }

    #[test]
    fn table_failures_become_server_errors() {
        let response = handle_query_event(
            json!({"requestContext": {"http": {"method": "GET"}}}),
            &FailingTable,
        );

        assert_eq!(response.status_code, 500);
        assert_eq!(body(&response)["error"], "table_error");
    }

    #[test]
    fn non_object_events_are_rejected() {
        let response = handle_query_event(json!("GET /items"), &FixtureTable::new());
        assert_eq!(response.status_code, 400);
    }
}
