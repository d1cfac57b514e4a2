use inventory_core::contract::{
    DEFAULT_LOW_STOCK_THRESHOLD, TABLE_NAME_ENV, THRESHOLD_ENV, TOPIC_ARN_ENV,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
    #[error("{name} must be an integer, got '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Table-backed functions (ingestion and query).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    pub table_name: String,
}

impl TableConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            table_name: required(&lookup, TABLE_NAME_ENV)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierConfig {
    pub topic_arn: String,
    pub threshold: i64,
}

impl NotifierConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let topic_arn = required(&lookup, TOPIC_ARN_ENV)?;
        let threshold = match lookup(THRESHOLD_ENV) {
            None => DEFAULT_LOW_STOCK_THRESHOLD,
            Some(raw) => raw.trim().parse::<i64>().map_err(|_| ConfigError::Invalid {
                name: THRESHOLD_ENV,
                value: raw.clone(),
            })?,
        };
        Ok(Self {
            topic_arn,
            threshold,
        })
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| values.get(name).cloned()
    }

    #[test]
    fn table_config_requires_table_name() {
        let error = TableConfig::from_lookup(lookup(&[])).expect_err("should fail");
        assert_eq!(error.to_string(), "TABLE_NAME must be configured");
    }

    #[test]
    fn notifier_threshold_defaults_to_two() {
        let config = NotifierConfig::from_lookup(lookup(&[("TOPIC_ARN", "arn:aws:sns:topic")]))
            .expect("config should load");
        assert_eq!(config.threshold, 2);
    }

    #[test]
    fn notifier_rejects_non_integer_threshold() {
        let error = NotifierConfig::from_lookup(lookup(&[
            ("TOPIC_ARN", "arn:aws:sns:topic"),
            ("THRESHOLD", "low"),
        ]))
        .expect_err("should fail");
        assert_eq!(
            error,
            ConfigError::Invalid {
                name: "THRESHOLD",
                value: "low".to_string()
            }
        );
    }
}
