use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::attributes::{StoredAttribute, StoredItem};
use crate::contract::{COUNT_ATTRIBUTE, ITEM_ATTRIBUTE, STORE_ATTRIBUTE};

/// The subset of an HTTP API (payload format 2.0) request the query
/// function reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpApiRequest {
    #[serde(rename = "requestContext", default)]
    pub request_context: Option<RequestContext>,
    #[serde(rename = "pathParameters", default)]
    pub path_parameters: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    #[serde(default)]
    pub http: Option<HttpDescription>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpDescription {
    #[serde(default)]
    pub method: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryQuery {
    Preflight,
    Store(String),
    All,
}

impl HttpApiRequest {
    pub fn method(&self) -> &str {
        self.request_context
            .as_ref()
            .and_then(|context| context.http.as_ref())
            .and_then(|http| http.method.as_deref())
            .unwrap_or("")
    }

    pub fn store_parameter(&self) -> Option<&str> {
        self.path_parameters
            .as_ref()
            .and_then(|parameters| parameters.get("store"))
            .map(String::as_str)
            .filter(|store| !store.is_empty())
    }

    pub fn query(&self) -> InventoryQuery {
        if self.method() == "OPTIONS" {
            return InventoryQuery::Preflight;
        }
        match self.store_parameter() {
            Some(store) => InventoryQuery::Store(store.to_string()),
            None => InventoryQuery::All,
        }
    }
}

/// One row of the query API response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiRow {
    pub store: Value,
    pub item: Value,
    pub count: Value,
}

impl ApiRow {
    pub fn from_item(item: &StoredItem) -> Self {
        let field = |name: &str| {
            item.get(name)
                .map(StoredAttribute::to_json)
                .unwrap_or(Value::Null)
        };
        Self {
            store: field(STORE_ATTRIBUTE),
            item: field(ITEM_ATTRIBUTE),
            count: field(COUNT_ATTRIBUTE),
        }
    }
}

pub fn render_rows(items: &[StoredItem]) -> Vec<ApiRow> {
    items.iter().map(ApiRow::from_item).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

pub fn json_response(status_code: u16, payload: impl Serialize) -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code,
        headers: json!({
            "Content-Type": "application/json",
            "Access-Control-Allow-Origin": "*",
        }),
        body: serde_json::to_string(&payload).expect("response payload should serialize"),
    }
}

pub fn preflight_response() -> ApiGatewayResponse {
    json_response(200, json!({"ok": true}))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(value: Value) -> HttpApiRequest {
        serde_json::from_value(value).expect("request should parse")
    }

    #[test]
    fn options_requests_are_preflight_even_with_a_store() {
        let query = request(json!({
            "requestContext": {"http": {"method": "OPTIONS"}},
            "pathParameters": {"store": "Berlin"}
        }))
        .query();
        assert_eq!(query, InventoryQuery::Preflight);
    }

    #[test]
    fn store_parameter_selects_one_store() {
        let query = request(json!({
            "requestContext": {"http": {"method": "GET"}},
            "pathParameters": {"store": "Berlin"}
        }))
        .query();
        assert_eq!(query, InventoryQuery::Store("Berlin".to_string()));
    }

    #[test]
    fn missing_or_null_parameters_select_everything() {
        assert_eq!(request(json!({})).query(), InventoryQuery::All);
        assert_eq!(
            request(json!({"pathParameters": null})).query(),
            InventoryQuery::All
        );
        assert_eq!(
            request(json!({"pathParameters": {"store": ""}})).query(),
            InventoryQuery::All
        );
    }

    #[test]
    fn rows_render_in_store_item_count_order() {
        let item = StoredItem::from([
            (STORE_ATTRIBUTE.to_string(), StoredAttribute::S("Berlin".to_string())),
            (ITEM_ATTRIBUTE.to_string(), StoredAttribute::S("Apples".to_string())),
            (COUNT_ATTRIBUTE.to_string(), StoredAttribute::N("4".to_string())),
        ]);

        let body = serde_json::to_string(&render_rows(&[item])).expect("serializes");
        assert_eq!(body, r#"[{"store":"Berlin","item":"Apples","count":4}]"#);
    }

    #[test]
    fn missing_attributes_render_as_null() {
        let item = StoredItem::from([(
            STORE_ATTRIBUTE.to_string(),
            StoredAttribute::S("Berlin".to_string()),
        )]);
        let row = ApiRow::from_item(&item);
        assert_eq!(row.item, Value::Null);
        assert_eq!(row.count, Value::Null);
    }

    #[test]
    fn responses_carry_cors_header() {
        let response = preflight_response();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, r#"{"ok":true}"#);
        assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
    }
}
