use std::path::PathBuf;

use clap::Args;
use inventory_core::contract::{DEFAULT_LOW_STOCK_THRESHOLD, DEFAULT_TABLE_NAME};

use crate::names::ResourceNames;

pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name}='{value}' is invalid: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings shared by deploy and teardown.
#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    /// AWS region to manage resources in
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    pub region: String,
    /// Suffix appended to every bucket, function, topic and API name
    #[arg(long, env = "SUFFIX")]
    pub suffix: Option<String>,
    /// Inventory table name
    #[arg(long, env = "DDB_TABLE", default_value = DEFAULT_TABLE_NAME)]
    pub table: String,
}

#[derive(Debug, Clone, Args)]
pub struct DeployArgs {
    #[command(flatten)]
    pub target: TargetArgs,
    /// Existing execution role assumed by the functions
    #[arg(long, env = "LAMBDA_ROLE_ARN")]
    pub role_arn: Option<String>,
    /// E-mail address subscribed to low-stock alerts
    #[arg(long, env = "NOTIFY_EMAIL")]
    pub notify_email: Option<String>,
    /// Alert when a count drops to this value or below
    #[arg(long, env = "LOW_STOCK_THRESHOLD")]
    pub threshold: Option<String>,
    /// Directory holding one `<function>/bootstrap` per function
    #[arg(long, env = "LAMBDA_ARTIFACTS_DIR", default_value = "target/lambda")]
    pub artifacts_dir: PathBuf,
    /// Directory receiving the function zip archives
    #[arg(long, env = "LAMBDA_BUILD_DIR", default_value = ".build")]
    pub build_dir: PathBuf,
    /// Static site uploaded to the web bucket
    #[arg(long, env = "WEB_DIR", default_value = "web")]
    pub web_dir: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct TeardownArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub region: String,
    pub names: ResourceNames,
    pub role_arn: String,
    pub notify_email: Option<String>,
    pub threshold: i64,
    pub artifacts_dir: PathBuf,
    pub build_dir: PathBuf,
    pub web_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownConfig {
    pub region: String,
    pub names: ResourceNames,
}

impl TargetArgs {
    fn resolve(self) -> Result<(String, ResourceNames), ConfigError> {
        let suffix = required(self.suffix, "SUFFIX")?;
        for bucket in [
            format!("inventory-uploads-{suffix}"),
            format!("inventory-web-{suffix}"),
        ] {
            validate_bucket_name(&bucket).map_err(|reason| ConfigError::Invalid {
                name: "SUFFIX",
                value: suffix.clone(),
                reason,
            })?;
        }
        let table = self.table.trim();
        if table.is_empty() {
            return Err(ConfigError::Missing("DDB_TABLE"));
        }
        let region = match self.region.trim() {
            "" => DEFAULT_REGION.to_string(),
            region => region.to_string(),
        };
        Ok((region, ResourceNames::new(&suffix, table)))
    }
}

impl TryFrom<DeployArgs> for DeployConfig {
    type Error = ConfigError;

    fn try_from(args: DeployArgs) -> Result<Self, Self::Error> {
        let (region, names) = args.target.resolve()?;
        let role_arn = required(args.role_arn, "LAMBDA_ROLE_ARN")?;
        let threshold = match args.threshold.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_LOW_STOCK_THRESHOLD,
            Some(raw) => raw.parse::<i64>().map_err(|_| ConfigError::Invalid {
                name: "LOW_STOCK_THRESHOLD",
                value: raw.to_string(),
                reason: "expected an integer".to_string(),
            })?,
        };
        let notify_email = args
            .notify_email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty());

        Ok(Self {
            region,
            names,
            role_arn,
            notify_email,
            threshold,
            artifacts_dir: args.artifacts_dir,
            build_dir: args.build_dir,
            web_dir: args.web_dir,
        })
    }
}

impl TryFrom<TeardownArgs> for TeardownConfig {
    type Error = ConfigError;

    fn try_from(args: TeardownArgs) -> Result<Self, Self::Error> {
        let (region, names) = args.target.resolve()?;
        Ok(Self { region, names })
    }
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(name))
}

pub fn validate_bucket_name(input: &str) -> Result<(), String> {
    if input.len() < 3 || input.len() > 63 {
        return Err("bucket name must be 3-63 characters".to_string());
    }
    if !input
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(
            "bucket name must contain only lowercase letters, numbers, and hyphens".to_string(),
        );
    }
    if input.starts_with('-') || input.ends_with('-') {
        return Err("bucket name cannot start or end with a hyphen".to_string());
    }
    Ok(())
}
