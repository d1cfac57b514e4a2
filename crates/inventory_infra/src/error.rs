use std::path::PathBuf;
use std::time::Duration;

use crate::config::ConfigError;

/// Provider-neutral meaning of a failed cloud call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The resource is mid-update or the caller is throttled; the call may succeed later.
    TransientConflict,
    AlreadyExists,
    NotFound,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, code, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    pub fn is_already_exists(&self) -> bool {
        self.kind == ErrorKind::AlreadyExists
    }
}

/// Coarse class of a workflow failure, for callers that branch on outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Configuration,
    TransientConflict,
    ReadinessTimeout,
    AlreadyExists,
    NotFound,
    Provider,
}

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{step} failed: {source}")]
    Provider {
        step: String,
        #[source]
        source: ProviderError,
    },
    #[error("{resource} not ready after {}s ({last_state})", waited.as_secs())]
    Timeout {
        resource: String,
        waited: Duration,
        last_state: String,
    },
    #[error("failed to package {}: {message}", path.display())]
    Package { path: PathBuf, message: String },
    #[error("{resource} returned no {output}")]
    MissingOutput {
        resource: String,
        output: &'static str,
    },
}

impl DeployError {
    /// Wraps a provider error with the workflow step that produced it.
    ///
    /// ```
    /// use inventory_infra::error::{DeployError, ErrorKind, ProviderError};
    ///
    /// let failed: Result<(), ProviderError> =
    ///     Err(ProviderError::new(ErrorKind::Other, "AccessDenied", "denied"));
    /// let error = failed.map_err(DeployError::at("create bucket")).unwrap_err();
    /// assert_eq!(error.to_string(), "create bucket failed: AccessDenied: denied");
    /// ```
    pub fn at(step: impl Into<String>) -> impl FnOnce(ProviderError) -> DeployError {
        let step = step.into();
        move |source| DeployError::Provider { step, source }
    }

    pub fn package(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        DeployError::Package {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            DeployError::Config(_) => ErrorClass::Configuration,
            DeployError::Provider { source, .. } => match source.kind {
                ErrorKind::TransientConflict => ErrorClass::TransientConflict,
                ErrorKind::AlreadyExists => ErrorClass::AlreadyExists,
                ErrorKind::NotFound => ErrorClass::NotFound,
                ErrorKind::Other => ErrorClass::Provider,
            },
            DeployError::Timeout { .. } => ErrorClass::ReadinessTimeout,
            DeployError::Package { .. } | DeployError::MissingOutput { .. } => {
                ErrorClass::Provider
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_are_classed_by_kind() {
        let error = DeployError::at("update code")(ProviderError::new(
            ErrorKind::TransientConflict,
            "ResourceConflictException",
            "update in progress",
        ));
        assert_eq!(error.class(), ErrorClass::TransientConflict);

        let error = DeployError::at("describe table")(ProviderError::new(
            ErrorKind::Other,
            "AccessDeniedException",
            "denied",
        ));
        assert_eq!(error.class(), ErrorClass::Provider);
    }

    #[test]
    fn timeouts_and_config_errors_have_their_own_class() {
        let timeout = DeployError::Timeout {
            resource: "function load_inventory_dev".to_string(),
            waited: Duration::from_secs(120),
            last_state: "State=Pending, LastUpdateStatus=InProgress".to_string(),
        };
        assert_eq!(timeout.class(), ErrorClass::ReadinessTimeout);
        assert_eq!(
            timeout.to_string(),
            "function load_inventory_dev not ready after 120s (State=Pending, LastUpdateStatus=InProgress)"
        );

        let config = DeployError::from(ConfigError::Missing("SUFFIX"));
        assert_eq!(config.class(), ErrorClass::Configuration);
    }
}
