//! AWS-oriented adapters and handlers for the inventory functions.
//!
//! This crate owns runtime integration details (Lambda handlers, table and
//! topic adapters). Row parsing, alert rules and response shapes live in
//! `inventory_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod telemetry;
