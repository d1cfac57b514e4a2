pub mod ingest;
pub mod notify;
pub mod query;
