use std::collections::BTreeMap;
use std::fmt;
use std::fs;

use chrono::{DateTime, Utc};
use inventory_core::contract::{TABLE_NAME_ENV, THRESHOLD_ENV, TOPIC_ARN_ENV};
use tracing::info;

use crate::cloud::{BindingSpec, CloudProvider, FunctionSpec, HttpApiSpec};
use crate::config::DeployConfig;
use crate::ensure::binding::ensure_binding;
use crate::ensure::bucket::ensure_bucket;
use crate::ensure::function::ensure_function;
use crate::ensure::http_api::ensure_http_api;
use crate::ensure::site::{landing_link, publish_site, INDEX_KEY, LINK_LIFETIME};
use crate::ensure::table::{ensure_table, inventory_table};
use crate::ensure::topic::ensure_topic;
use crate::ensure::trigger::ensure_object_trigger;
use crate::ensure::Timing;
use crate::error::DeployError;
use crate::names::FunctionRole;
use crate::package::package_directory;

/// Everything a caller needs after a successful deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub region: String,
    pub suffix: String,
    pub account_id: String,
    pub role_arn: String,
    pub uploads_bucket: String,
    pub web_bucket: String,
    pub table: String,
    pub stream_arn: String,
    pub topic_arn: String,
    pub notify_email: Option<String>,
    pub binding_uuid: String,
    pub api_id: String,
    pub api_endpoint: String,
    pub landing_link: String,
    pub link_expires_at: DateTime<Utc>,
}

pub struct Provisioner<'a, P> {
    cloud: &'a P,
    timing: Timing<'a>,
}

impl<'a, P: CloudProvider> Provisioner<'a, P> {
    pub fn new(cloud: &'a P, timing: Timing<'a>) -> Self {
        Self { cloud, timing }
    }

    /// Ensures every managed resource in dependency order. Safe to re-run
    /// with the same configuration.
    pub fn run(&self, config: &DeployConfig) -> Result<ProvisionReport, DeployError> {
        let cloud = self.cloud;
        let names = &config.names;

        let account_id = cloud
            .account_id()
            .map_err(DeployError::at("resolve account id"))?;
        info!(
            region = %config.region,
            suffix = %names.suffix,
            account = %account_id,
            role = %config.role_arn,
            "provisioning inventory pipeline"
        );

        for bucket in names.buckets() {
            ensure_bucket(cloud, bucket, &config.region)?;
        }

        let table = ensure_table(cloud, &self.timing, &inventory_table(&names.table))?;
        let archives = package_functions(config)?;

        let table_env = BTreeMap::from([(TABLE_NAME_ENV.to_string(), names.table.clone())]);
        let loader = self.ensure_role(config, FunctionRole::Loader, table_env.clone(), &archives)?;
        let query = self.ensure_role(config, FunctionRole::QueryApi, table_env, &archives)?;

        let topic = ensure_topic(cloud, &names.topic, config.notify_email.as_deref())?;
        let notifier_env = BTreeMap::from([
            (TOPIC_ARN_ENV.to_string(), topic.arn.clone()),
            (THRESHOLD_ENV.to_string(), config.threshold.to_string()),
        ]);
        let notifier =
            self.ensure_role(config, FunctionRole::Notifier, notifier_env, &archives)?;

        ensure_object_trigger(cloud, cloud, &names.uploads_bucket, &loader)?;

        let routing = ensure_http_api(
            cloud,
            cloud,
            &HttpApiSpec::public(&names.api),
            &query,
            &config.region,
            &account_id,
        )?;

        let binding_uuid = ensure_binding(cloud, &BindingSpec::new(&notifier, &table.stream_arn))?;

        publish_site(cloud, &names.web_bucket, &config.web_dir)?;
        let presigned = cloud
            .presign_get(&names.web_bucket, INDEX_KEY, LINK_LIFETIME)
            .map_err(DeployError::at(format!("presign {INDEX_KEY}")))?;
        let link_expires_at = Utc::now() + chrono::Duration::seconds(LINK_LIFETIME.as_secs() as i64);

        Ok(ProvisionReport {
            region: config.region.clone(),
            suffix: names.suffix.clone(),
            account_id,
            role_arn: config.role_arn.clone(),
            uploads_bucket: names.uploads_bucket.clone(),
            web_bucket: names.web_bucket.clone(),
            table: names.table.clone(),
            stream_arn: table.stream_arn,
            topic_arn: topic.arn,
            notify_email: topic.subscribed,
            binding_uuid,
            api_id: routing.api_id,
            landing_link: landing_link(&presigned, &routing.endpoint),
            api_endpoint: routing.endpoint,
            link_expires_at,
        })
    }

    fn ensure_role(
        &self,
        config: &DeployConfig,
        role: FunctionRole,
        environment: BTreeMap<String, String>,
        archives: &BTreeMap<FunctionRole, Vec<u8>>,
    ) -> Result<String, DeployError> {
        let name = config.names.function(role);
        let archive = archives
            .get(&role)
            .ok_or_else(|| DeployError::MissingOutput {
                resource: format!("function {name}"),
                output: "archive",
            })?;
        let spec = FunctionSpec::new(name, &config.role_arn, environment);
        Ok(ensure_function(self.cloud, &self.timing, &spec, archive)?.arn)
    }
}

/// Zips `<artifacts>/<function>/` into `<build>/<function>.zip` for every
/// function and returns the archive bytes.
fn package_functions(
    config: &DeployConfig,
) -> Result<BTreeMap<FunctionRole, Vec<u8>>, DeployError> {
    let mut archives = BTreeMap::new();
    for role in FunctionRole::ALL {
        let base = role.base_name();
        let archive = config.build_dir.join(format!("{base}.zip"));
        package_directory(&config.artifacts_dir.join(base), &archive)?;
        let bytes = fs::read(&archive).map_err(|error| DeployError::package(&archive, error))?;
        archives.insert(role, bytes);
    }
    Ok(archives)
}

impl fmt::Display for ProvisionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Region:         {}", self.region)?;
        writeln!(f, "Suffix:         {}", self.suffix)?;
        writeln!(f, "Account:        {}", self.account_id)?;
        writeln!(f, "Lambda role:    {}", self.role_arn)?;
        writeln!(f)?;
        writeln!(f, "=== DEPLOY OK ===")?;
        writeln!(f, "Uploads bucket: {}", self.uploads_bucket)?;
        writeln!(f, "Web bucket:     {}", self.web_bucket)?;
        writeln!(f, "Table:          {}", self.table)?;
        writeln!(f, "Table stream:   {}", self.stream_arn)?;
        writeln!(f, "Alert topic:    {}", self.topic_arn)?;
        writeln!(f, "Stream binding: {}", self.binding_uuid)?;
        writeln!(f, "API endpoint:   {}", self.api_endpoint)?;
        writeln!(f, "Test API:       {}/items", self.api_endpoint)?;
        writeln!(f, "Test store:     {}/items/Berlin", self.api_endpoint)?;
        writeln!(f)?;
        writeln!(
            f,
            "Landing page (expires {}):",
            self.link_expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(f, "{}", self.landing_link)?;
        writeln!(f)?;
        match &self.notify_email {
            Some(email) => writeln!(
                f,
                "Alert subscription: confirm the message sent to {email} before alerts arrive."
            )?,
            None => writeln!(f, "NOTIFY_EMAIL not set, no e-mail subscription created.")?,
        }
        write!(
            f,
            "Next step: upload a CSV to s3://{} to populate the table.",
            self.uploads_bucket
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packaging_needs_every_staged_function() {
        let artifacts = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(artifacts.path().join("load_inventory")).expect("mkdir");
        fs::write(artifacts.path().join("load_inventory").join("bootstrap"), b"bin")
            .expect("write");
        let build = tempfile::tempdir().expect("tempdir");

        let config = DeployConfig {
            region: "us-east-1".to_string(),
            names: crate::names::ResourceNames::new("dev", "Inventory"),
            role_arn: "arn:aws:iam::123456789012:role/LabRole".to_string(),
            notify_email: None,
            threshold: 2,
            artifacts_dir: artifacts.path().to_path_buf(),
            build_dir: build.path().to_path_buf(),
            web_dir: artifacts.path().join("web"),
        };

        let error = package_functions(&config).expect_err("query api not staged");
        assert!(error.to_string().contains("get_inventory_api"));
        assert!(build.path().join("load_inventory.zip").is_file());
    }
}
