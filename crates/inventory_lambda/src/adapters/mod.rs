pub mod alert_publisher;
pub mod dynamo_items;
pub mod inventory_table;
pub mod object_source;
