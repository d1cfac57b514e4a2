//! Provider seams used by the ensurers and the teardown sequencer.
//!
//! Every call is synchronous and returns a [`ProviderError`] whose `kind` has
//! already been classified by the adapter. Workflows never inspect codes.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::error::ProviderError;

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectVersion {
    pub key: String,
    pub version_id: Option<String>,
}

/// Bucket notification routing created objects to a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectTrigger {
    pub bucket: String,
    pub function_arn: String,
    pub events: Vec<String>,
    pub key_suffix: String,
}

pub trait ObjectStorage {
    fn bucket_exists(&self, bucket: &str) -> ProviderResult<bool>;
    fn create_bucket(&self, bucket: &str, region: &str) -> ProviderResult<()>;
    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> ProviderResult<()>;
    fn presign_get(&self, bucket: &str, key: &str, expires_in: Duration) -> ProviderResult<String>;
    fn put_object_trigger(&self, trigger: &ObjectTrigger) -> ProviderResult<()>;
    fn list_object_versions(&self, bucket: &str) -> ProviderResult<Vec<ObjectVersion>>;
    fn list_object_keys(&self, bucket: &str) -> ProviderResult<Vec<String>>;
    /// Deletes at most 1000 objects; `version_id` selects a specific version.
    fn delete_objects(&self, bucket: &str, objects: &[ObjectVersion]) -> ProviderResult<()>;
    fn delete_bucket(&self, bucket: &str) -> ProviderResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub name: String,
    pub hash_key: String,
    pub range_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableState {
    pub status: String,
    pub stream_enabled: bool,
    pub latest_stream_arn: Option<String>,
}

impl TableState {
    pub const ACTIVE: &'static str = "ACTIVE";
    pub const DELETING: &'static str = "DELETING";
    pub const ABSENT: &'static str = "ABSENT";

    pub fn absent() -> Self {
        Self {
            status: Self::ABSENT.to_string(),
            stream_enabled: false,
            latest_stream_arn: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == Self::ACTIVE
    }

    pub fn is_deleting(&self) -> bool {
        self.status == Self::DELETING
    }

    pub fn is_absent(&self) -> bool {
        self.status == Self::ABSENT
    }
}

impl fmt::Display for TableState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TableStatus={}, StreamEnabled={}",
            self.status, self.stream_enabled
        )
    }
}

pub trait TableControl {
    /// `Ok(None)` when the table does not exist.
    fn describe_table(&self, name: &str) -> ProviderResult<Option<TableState>>;
    fn create_table(&self, spec: &TableSpec) -> ProviderResult<()>;
    fn enable_stream(&self, name: &str) -> ProviderResult<()>;
    fn delete_table(&self, name: &str) -> ProviderResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpec {
    pub name: String,
    pub role_arn: String,
    pub runtime: String,
    pub handler: String,
    pub timeout_seconds: i32,
    pub memory_mb: i32,
    pub environment: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionState {
    pub arn: String,
    pub state: Option<String>,
    pub last_update_status: Option<String>,
}

impl FunctionState {
    /// `Active`, with the last update `Successful` or not reported.
    pub fn is_ready(&self) -> bool {
        self.state.as_deref() == Some("Active")
            && matches!(self.last_update_status.as_deref(), None | Some("Successful"))
    }
}

impl fmt::Display for FunctionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "State={}, LastUpdateStatus={}",
            self.state.as_deref().unwrap_or("Unknown"),
            self.last_update_status.as_deref().unwrap_or("Unknown")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokePermission {
    pub function: String,
    pub statement_id: String,
    pub principal: String,
    pub source_arn: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamBinding {
    pub uuid: String,
    pub event_source_arn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingSpec {
    pub function_arn: String,
    pub stream_arn: String,
    pub batch_size: i32,
    pub batching_window_seconds: i32,
    pub starting_position: String,
}

pub trait FunctionControl {
    /// `Ok(None)` when the function does not exist.
    fn get_function(&self, name: &str) -> ProviderResult<Option<FunctionState>>;
    /// Returns the new function ARN.
    fn create_function(&self, spec: &FunctionSpec, archive: &[u8]) -> ProviderResult<String>;
    fn update_function_code(&self, name: &str, archive: &[u8]) -> ProviderResult<()>;
    fn update_function_configuration(&self, spec: &FunctionSpec) -> ProviderResult<()>;
    fn add_permission(&self, permission: &InvokePermission) -> ProviderResult<()>;
    fn list_stream_bindings(&self, function: &str) -> ProviderResult<Vec<StreamBinding>>;
    /// Returns the binding UUID.
    fn create_stream_binding(&self, spec: &BindingSpec) -> ProviderResult<String>;
    fn delete_stream_binding(&self, uuid: &str) -> ProviderResult<()>;
    fn delete_function(&self, name: &str) -> ProviderResult<()>;
}

pub trait TopicControl {
    /// Idempotent on the provider; returns the topic ARN.
    fn create_topic(&self, name: &str) -> ProviderResult<String>;
    fn subscribe_email(&self, topic_arn: &str, email: &str) -> ProviderResult<()>;
    fn list_topic_arns(&self) -> ProviderResult<Vec<String>>;
    fn list_subscription_arns(&self, topic_arn: &str) -> ProviderResult<Vec<String>>;
    fn unsubscribe(&self, subscription_arn: &str) -> ProviderResult<()>;
    fn delete_topic(&self, topic_arn: &str) -> ProviderResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    pub allow_origins: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpApiSpec {
    pub name: String,
    pub cors: CorsPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpApi {
    pub id: String,
    pub name: String,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Integration {
    pub id: String,
    pub uri: Option<String>,
}

pub trait HttpApiControl {
    fn list_apis(&self) -> ProviderResult<Vec<HttpApi>>;
    fn create_api(&self, spec: &HttpApiSpec) -> ProviderResult<HttpApi>;
    fn list_integrations(&self, api_id: &str) -> ProviderResult<Vec<Integration>>;
    /// Creates an `AWS_PROXY` integration (payload format 2.0); returns its id.
    fn create_proxy_integration(&self, api_id: &str, function_arn: &str) -> ProviderResult<String>;
    fn list_route_keys(&self, api_id: &str) -> ProviderResult<Vec<String>>;
    fn create_route(&self, api_id: &str, route_key: &str, target: &str) -> ProviderResult<()>;
    fn stage_exists(&self, api_id: &str, stage: &str) -> ProviderResult<bool>;
    fn create_stage(&self, api_id: &str, stage: &str) -> ProviderResult<()>;
    fn enable_auto_deploy(&self, api_id: &str, stage: &str) -> ProviderResult<()>;
    fn delete_api(&self, api_id: &str) -> ProviderResult<()>;
}

pub trait AccountIdentity {
    fn account_id(&self) -> ProviderResult<String>;
}

/// Everything the provisioner and the teardown sequencer talk to.
pub trait CloudProvider:
    ObjectStorage + TableControl + FunctionControl + TopicControl + HttpApiControl + AccountIdentity
{
}

impl<T> CloudProvider for T where
    T: ObjectStorage + TableControl + FunctionControl + TopicControl + HttpApiControl + AccountIdentity
{
}
