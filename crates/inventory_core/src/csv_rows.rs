use std::collections::HashMap;

use csv::{ReaderBuilder, StringRecord};

use crate::contract::InventoryRow;

/// Column positions for one logical field, lower-case header first.
#[derive(Debug, Default, Clone, Copy)]
struct ColumnPair {
    lower: Option<usize>,
    capitalized: Option<usize>,
}

impl ColumnPair {
    fn locate(headers: &StringRecord, lower: &str, capitalized: &str) -> Self {
        Self {
            lower: headers.iter().position(|header| header == lower),
            capitalized: headers.iter().position(|header| header == capitalized),
        }
    }

    fn value<'r>(&self, record: &'r StringRecord) -> &'r str {
        let lower = self
            .lower
            .and_then(|index| record.get(index))
            .filter(|value| !value.is_empty());
        let capitalized = self
            .capitalized
            .and_then(|index| record.get(index))
            .filter(|value| !value.is_empty());
        lower.or(capitalized).unwrap_or("").trim()
    }
}

/// Parses a headed CSV body into inventory rows.
///
/// Accepts `store`/`Store`, `item`/`Item` and `count`/`Count` columns; rows
/// without a store or item are skipped and a count that is not an integer is
/// stored as 0.
pub fn parse_inventory_csv(body: &str) -> Result<Vec<InventoryRow>, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = reader.headers()?.clone();
    let store_column = ColumnPair::locate(&headers, "store", "Store");
    let item_column = ColumnPair::locate(&headers, "item", "Item");
    let count_column = ColumnPair::locate(&headers, "count", "Count");

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let store = store_column.value(&record);
        let item = item_column.value(&record);
        if store.is_empty() || item.is_empty() {
            continue;
        }

        rows.push(InventoryRow {
            store: store.to_string(),
            item: item.to_string(),
            count: parse_count(count_column.value(&record)),
        });
    }

    Ok(rows)
}

pub fn parse_count(raw: &str) -> i64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0;
    }
    trimmed.parse::<i64>().unwrap_or(0)
}

/// Collapses rows sharing a (store, item) key so the last occurrence wins,
/// keeping the position where the key was first seen.
pub fn dedupe_by_key(rows: Vec<InventoryRow>) -> Vec<InventoryRow> {
    let mut positions: HashMap<(String, String), usize> = HashMap::with_capacity(rows.len());
    let mut unique: Vec<InventoryRow> = Vec::with_capacity(rows.len());

    for row in rows {
        let key = (row.store.clone(), row.item.clone());
        match positions.get(&key) {
            Some(&index) => unique[index] = row,
            None => {
                positions.insert(key, unique.len());
                unique.push(row);
            }
        }
    }

    unique
}
