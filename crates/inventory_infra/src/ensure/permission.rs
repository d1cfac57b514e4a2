use tracing::info;

use crate::cloud::{FunctionControl, InvokePermission};
use crate::error::DeployError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    Granted,
    AlreadyGranted,
}

/// Grants `principal` permission to invoke the function. A statement that is
/// already present counts as success.
pub fn grant_invoke(
    functions: &impl FunctionControl,
    permission: &InvokePermission,
) -> Result<Grant, DeployError> {
    match functions.add_permission(permission) {
        Ok(()) => {
            info!(
                statement = %permission.statement_id,
                principal = %permission.principal,
                "invoke permission granted"
            );
            Ok(Grant::Granted)
        }
        Err(error) if error.is_already_exists() => Ok(Grant::AlreadyGranted),
        Err(error) => Err(DeployError::at(format!(
            "grant invoke permission {}",
            permission.statement_id
        ))(error)),
    }
}
