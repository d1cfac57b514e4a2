use inventory_core::attributes::StoredItem;
use inventory_core::contract::InventoryRow;

/// Upserts rows keyed by (store, item), overwriting existing counts.
pub trait InventoryWriter {
    fn put_rows(&self, rows: &[InventoryRow]) -> Result<(), String>;
}

pub trait InventoryReader {
    fn query_store(&self, store: &str) -> Result<Vec<StoredItem>, String>;
    fn scan_all(&self) -> Result<Vec<StoredItem>, String>;
}
