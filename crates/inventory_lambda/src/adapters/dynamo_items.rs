use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use inventory_core::attributes::{StoredAttribute, StoredItem};
use inventory_core::contract::{InventoryRow, COUNT_ATTRIBUTE, ITEM_ATTRIBUTE, STORE_ATTRIBUTE};

pub fn row_to_item(row: &InventoryRow) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (
            STORE_ATTRIBUTE.to_string(),
            AttributeValue::S(row.store.clone()),
        ),
        (ITEM_ATTRIBUTE.to_string(), AttributeValue::S(row.item.clone())),
        (
            COUNT_ATTRIBUTE.to_string(),
            AttributeValue::N(row.count.to_string()),
        ),
    ])
}

pub fn stored_item(item: &HashMap<String, AttributeValue>) -> StoredItem {
    item.iter()
        .map(|(name, value)| (name.clone(), stored_attribute(value)))
        .collect()
}

fn stored_attribute(value: &AttributeValue) -> StoredAttribute {
    match value {
        AttributeValue::S(text) => StoredAttribute::S(text.clone()),
        AttributeValue::N(number) => StoredAttribute::N(number.clone()),
        _ => StoredAttribute::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_map_to_string_keys_and_numeric_count() {
        let item = row_to_item(&InventoryRow {
            store: "Berlin".to_string(),
            item: "Apples".to_string(),
            count: 7,
        });

        assert_eq!(item["Store"], AttributeValue::S("Berlin".to_string()));
        assert_eq!(item["Item"], AttributeValue::S("Apples".to_string()));
        assert_eq!(item["Count"], AttributeValue::N("7".to_string()));
    }

    #[test]
    fn unsupported_attribute_types_map_to_other() {
        let item = HashMap::from([
            ("Store".to_string(), AttributeValue::S("Berlin".to_string())),
            ("Discontinued".to_string(), AttributeValue::Bool(true)),
        ]);

        let stored = stored_item(&item);
        assert_eq!(stored["Store"], StoredAttribute::S("Berlin".to_string()));
        assert_eq!(stored["Discontinued"], StoredAttribute::Other);
    }
}
