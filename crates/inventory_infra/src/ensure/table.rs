use inventory_core::contract::{ITEM_ATTRIBUTE, STORE_ATTRIBUTE};
use tracing::info;

use super::Timing;
use crate::cloud::{TableControl, TableSpec, TableState};
use crate::error::{DeployError, ProviderError};
use crate::readiness::wait_until;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableAction {
    Create,
    EnableStream,
    Reuse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOutcome {
    pub action: TableAction,
    pub stream_arn: String,
}

/// Inventory table keyed by `Store` (hash) and `Item` (range).
pub fn inventory_table(name: &str) -> TableSpec {
    TableSpec {
        name: name.to_string(),
        hash_key: STORE_ATTRIBUTE.to_string(),
        range_key: ITEM_ATTRIBUTE.to_string(),
    }
}

pub fn plan_table(current: Option<&TableState>) -> TableAction {
    match current {
        None => TableAction::Create,
        Some(state) if !state.stream_enabled => TableAction::EnableStream,
        Some(_) => TableAction::Reuse,
    }
}

/// Ensures the table exists with its change stream enabled and returns the
/// latest stream ARN. A table still being deleted is waited out and then
/// created again.
pub fn ensure_table(
    tables: &impl TableControl,
    timing: &Timing<'_>,
    spec: &TableSpec,
) -> Result<TableOutcome, DeployError> {
    let name = spec.name.as_str();
    let mut current = describe(tables, name)?;

    if current.as_ref().is_some_and(TableState::is_deleting) {
        info!(table = name, "table is being deleted, waiting for it to go");
        wait_until(
            timing.clock,
            &timing.poll,
            &format!("table {name} deletion"),
            || describe(tables, name).map(|state| state.unwrap_or_else(TableState::absent)),
            TableState::is_absent,
        )?;
        current = None;
    }

    let action = plan_table(current.as_ref());
    match action {
        TableAction::Create => match tables.create_table(spec) {
            Ok(()) => info!(table = name, "table created"),
            Err(error) if error.is_already_exists() => {
                info!(table = name, "table already exists")
            }
            Err(error) => return Err(DeployError::at(format!("create table {name}"))(error)),
        },
        TableAction::EnableStream => {
            tables
                .enable_stream(name)
                .map_err(DeployError::at(format!("enable stream on table {name}")))?;
            info!(table = name, "table stream enabled");
        }
        TableAction::Reuse => info!(table = name, "table exists"),
    }

    let settled = match current {
        Some(state) if action == TableAction::Reuse && state.is_active() => state,
        _ => wait_until(
            timing.clock,
            &timing.poll,
            &format!("table {name}"),
            || {
                describe(tables, name)?.ok_or_else(|| {
                    DeployError::at(format!("describe table {name}"))(ProviderError::not_found(
                        "ResourceNotFoundException",
                        format!("table {name} disappeared while waiting for it to become active"),
                    ))
                })
            },
            TableState::is_active,
        )?,
    };

    let stream_arn = settled
        .latest_stream_arn
        .filter(|arn| !arn.is_empty())
        .ok_or_else(|| DeployError::MissingOutput {
            resource: format!("table {name}"),
            output: "stream ARN",
        })?;

    Ok(TableOutcome { action, stream_arn })
}

fn describe(tables: &impl TableControl, name: &str) -> Result<Option<TableState>, DeployError> {
    tables
        .describe_table(name)
        .map_err(DeployError::at(format!("describe table {name}")))
}
