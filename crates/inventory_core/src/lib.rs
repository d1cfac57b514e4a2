//! Shared inventory pipeline domain primitives.
//!
//! This crate owns the event contracts and the pure transforms behind the
//! three inventory functions (CSV ingestion, query API, low-stock alerts).
//! It intentionally excludes AWS SDK and Lambda runtime concerns.

pub mod alerts;
pub mod api;
pub mod attributes;
pub mod contract;
pub mod csv_rows;
