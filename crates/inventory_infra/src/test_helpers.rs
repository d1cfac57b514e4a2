//! Test doubles for the provider seams.
//!
//! [`InMemoryCloud`] keeps every resource in maps behind a mutex and can be
//! told to keep tables and functions pending for a number of polls or to fail
//! specific operations. [`ManualClock`] advances only when something sleeps.

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::cloud::{
    AccountIdentity, BindingSpec, FunctionControl, FunctionSpec, FunctionState, HttpApi,
    HttpApiControl, HttpApiSpec, Integration, InvokePermission, ObjectStorage, ObjectTrigger,
    ObjectVersion, ProviderResult, StreamBinding, TableControl, TableSpec, TableState,
    TopicControl,
};
use crate::error::{ErrorKind, ProviderError};

pub const TEST_ACCOUNT_ID: &str = "123456789012";
pub const TEST_REGION: &str = "us-east-1";
const PENDING_SUBSCRIPTION: &str = "PendingConfirmation";

pub struct ManualClock {
    start: Instant,
    now: Cell<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        let start = Instant::now();
        Self {
            start,
            now: Cell::new(start),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.now.get().duration_since(self.start)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }
}

/// Snapshot of a stored function, for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFunction {
    pub arn: String,
    pub spec: Option<FunctionSpec>,
    pub archive: Vec<u8>,
    pub versions_published: u32,
    pub statement_ids: BTreeSet<String>,
}

/// Resource totals used to compare runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    pub buckets: usize,
    pub tables: usize,
    pub functions: usize,
    pub topics: usize,
    pub subscriptions: usize,
    pub apis: usize,
    pub integrations: usize,
    pub routes: usize,
    pub bindings: usize,
    pub permissions: usize,
}

#[derive(Debug, Default)]
struct StoredObject {
    body: Vec<u8>,
    content_type: String,
}

#[derive(Debug, Default)]
struct BucketRecord {
    objects: BTreeMap<String, StoredObject>,
    versions: Vec<ObjectVersion>,
    trigger: Option<ObjectTrigger>,
}

#[derive(Debug)]
struct TableRecord {
    stream_arn: Option<String>,
    pending_polls: u32,
}

#[derive(Debug)]
struct FunctionRecord {
    function: StoredFunction,
    pending_polls: u32,
    updating: bool,
}

#[derive(Debug)]
struct BindingRecord {
    uuid: String,
    function_arn: String,
    stream_arn: String,
}

#[derive(Debug)]
struct ApiRecord {
    api: HttpApi,
    integrations: Vec<Integration>,
    routes: Vec<(String, String)>,
    stages: BTreeMap<String, bool>,
}

#[derive(Debug, Default)]
struct CloudState {
    buckets: BTreeMap<String, BucketRecord>,
    tables: BTreeMap<String, TableRecord>,
    functions: BTreeMap<String, FunctionRecord>,
    bindings: Vec<BindingRecord>,
    topics: BTreeMap<String, Vec<(String, String)>>,
    apis: Vec<ApiRecord>,
    next_id: u32,
    calls: HashMap<String, usize>,
    failures: HashMap<String, VecDeque<ProviderError>>,
}

impl CloudState {
    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Records the call and pops a scripted failure for it, if any.
    fn enter(&mut self, operation: &str) -> ProviderResult<()> {
        *self.calls.entry(operation.to_string()).or_default() += 1;
        match self
            .failures
            .get_mut(operation)
            .and_then(VecDeque::pop_front)
        {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn function_key(&self, name_or_arn: &str) -> Option<String> {
        self.functions
            .iter()
            .find(|(name, record)| name.as_str() == name_or_arn || record.function.arn == name_or_arn)
            .map(|(name, _)| name.clone())
    }

    fn function_mut(&mut self, name_or_arn: &str) -> ProviderResult<&mut FunctionRecord> {
        let key = self
            .function_key(name_or_arn)
            .ok_or_else(|| missing("ResourceNotFoundException", name_or_arn))?;
        self.functions
            .get_mut(&key)
            .ok_or_else(|| missing("ResourceNotFoundException", name_or_arn))
    }

    fn bucket_mut(&mut self, bucket: &str) -> ProviderResult<&mut BucketRecord> {
        self.buckets
            .get_mut(bucket)
            .ok_or_else(|| missing("NoSuchBucket", bucket))
    }

    fn api_mut(&mut self, api_id: &str) -> ProviderResult<&mut ApiRecord> {
        self.apis
            .iter_mut()
            .find(|record| record.api.id == api_id)
            .ok_or_else(|| missing("NotFoundException", api_id))
    }
}

fn missing(code: &str, resource: &str) -> ProviderError {
    ProviderError::not_found(code, format!("{resource} does not exist"))
}

fn function_arn(name: &str) -> String {
    format!("arn:aws:lambda:{TEST_REGION}:{TEST_ACCOUNT_ID}:function:{name}")
}

fn stream_arn(table: &str, id: u32) -> String {
    format!("arn:aws:dynamodb:{TEST_REGION}:{TEST_ACCOUNT_ID}:table/{table}/stream/2026-01-01T00:00:{id:02}.000")
}

/// In-memory provider implementing every seam in [`crate::cloud`].
#[derive(Debug, Default)]
pub struct InMemoryCloud {
    state: Mutex<CloudState>,
    pending_polls: u32,
}

impl InMemoryCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables and functions report a non-ready state for `polls` lookups
    /// after each mutation.
    pub fn with_pending_polls(mut self, polls: u32) -> Self {
        self.pending_polls = polls;
        self
    }

    /// Makes the next call to `operation` (e.g. `"UpdateFunctionCode"`) fail.
    /// Repeated calls queue further failures.
    pub fn fail_next(&self, operation: &str, error: ProviderError) {
        self.lock()
            .failures
            .entry(operation.to_string())
            .or_default()
            .push_back(error);
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.lock().calls.get(operation).copied().unwrap_or(0)
    }

    pub fn seed_bucket(&self, bucket: &str) {
        self.lock().buckets.entry(bucket.to_string()).or_default();
    }

    pub fn seed_object(&self, bucket: &str, key: &str) {
        self.lock()
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .objects
            .insert(key.to_string(), StoredObject::default());
    }

    pub fn seed_version(&self, bucket: &str, key: &str, version_id: &str) {
        self.lock()
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .versions
            .push(ObjectVersion {
                key: key.to_string(),
                version_id: Some(version_id.to_string()),
            });
    }

    pub fn seed_table(&self, name: &str, stream_enabled: bool) {
        let mut state = self.lock();
        let id = state.next_id();
        state.tables.insert(
            name.to_string(),
            TableRecord {
                stream_arn: stream_enabled.then(|| stream_arn(name, id)),
                pending_polls: 0,
            },
        );
    }

    pub fn seed_function(&self, name: &str) {
        self.lock().functions.insert(
            name.to_string(),
            FunctionRecord {
                function: StoredFunction {
                    arn: function_arn(name),
                    spec: None,
                    archive: Vec::new(),
                    versions_published: 1,
                    statement_ids: BTreeSet::new(),
                },
                pending_polls: 0,
                updating: false,
            },
        );
    }

    pub fn seed_route(&self, api_id: &str, route_key: &str) -> ProviderResult<()> {
        let mut state = self.lock();
        let api = state.api_mut(api_id)?;
        api.routes.push((route_key.to_string(), String::new()));
        Ok(())
    }

    /// Turns every pending e-mail subscription of the topic into a confirmed one.
    pub fn confirm_subscriptions(&self, topic_arn: &str) {
        let mut state = self.lock();
        if let Some(subscriptions) = state.topics.get_mut(topic_arn) {
            for (index, (_, arn)) in subscriptions.iter_mut().enumerate() {
                if arn == PENDING_SUBSCRIPTION {
                    *arn = format!("{topic_arn}:sub-{index}");
                }
            }
        }
    }

    pub fn bucket_names(&self) -> Vec<String> {
        self.lock().buckets.keys().cloned().collect()
    }

    pub fn object_keys(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .buckets
            .get(bucket)
            .map(|record| record.objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn object_body(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.lock()
            .buckets
            .get(bucket)
            .and_then(|record| record.objects.get(key))
            .map(|object| object.body.clone())
    }

    pub fn content_type(&self, bucket: &str, key: &str) -> Option<String> {
        self.lock()
            .buckets
            .get(bucket)
            .and_then(|record| record.objects.get(key))
            .map(|object| object.content_type.clone())
    }

    pub fn trigger(&self, bucket: &str) -> Option<ObjectTrigger> {
        self.lock()
            .buckets
            .get(bucket)
            .and_then(|record| record.trigger.clone())
    }

    pub fn table_names(&self) -> Vec<String> {
        self.lock().tables.keys().cloned().collect()
    }

    pub fn function(&self, name: &str) -> Option<StoredFunction> {
        self.lock()
            .functions
            .get(name)
            .map(|record| record.function.clone())
    }

    pub fn function_names(&self) -> Vec<String> {
        self.lock().functions.keys().cloned().collect()
    }

    pub fn topic_arns(&self) -> Vec<String> {
        self.lock().topics.keys().cloned().collect()
    }

    pub fn subscriptions(&self, topic_arn: &str) -> Vec<String> {
        self.lock()
            .topics
            .get(topic_arn)
            .map(|subscriptions| subscriptions.iter().map(|(_, arn)| arn.clone()).collect())
            .unwrap_or_default()
    }

    pub fn route_keys(&self, api_id: &str) -> Vec<String> {
        self.lock()
            .apis
            .iter()
            .find(|record| record.api.id == api_id)
            .map(|record| record.routes.iter().map(|(key, _)| key.clone()).collect())
            .unwrap_or_default()
    }

    pub fn stage_auto_deploy(&self, api_id: &str, stage: &str) -> Option<bool> {
        self.lock()
            .apis
            .iter()
            .find(|record| record.api.id == api_id)
            .and_then(|record| record.stages.get(stage).copied())
    }

    pub fn counts(&self) -> ResourceCounts {
        let state = self.lock();
        ResourceCounts {
            buckets: state.buckets.len(),
            tables: state.tables.len(),
            functions: state.functions.len(),
            topics: state.topics.len(),
            subscriptions: state.topics.values().map(Vec::len).sum(),
            apis: state.apis.len(),
            integrations: state.apis.iter().map(|api| api.integrations.len()).sum(),
            routes: state.apis.iter().map(|api| api.routes.len()).sum(),
            bindings: state.bindings.len(),
            permissions: state
                .functions
                .values()
                .map(|record| record.function.statement_ids.len())
                .sum(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CloudState> {
        self.state.lock().expect("poisoned mutex")
    }
}

impl ObjectStorage for InMemoryCloud {
    fn bucket_exists(&self, bucket: &str) -> ProviderResult<bool> {
        let mut state = self.lock();
        state.enter("HeadBucket")?;
        Ok(state.buckets.contains_key(bucket))
    }

    fn create_bucket(&self, bucket: &str, _region: &str) -> ProviderResult<()> {
        let mut state = self.lock();
        state.enter("CreateBucket")?;
        if state.buckets.contains_key(bucket) {
            return Err(ProviderError::new(
                ErrorKind::AlreadyExists,
                "BucketAlreadyOwnedByYou",
                format!("{bucket} already exists"),
            ));
        }
        state.buckets.insert(bucket.to_string(), BucketRecord::default());
        Ok(())
    }

    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> ProviderResult<()> {
        let mut state = self.lock();
        state.enter("PutObject")?;
        state.bucket_mut(bucket)?.objects.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn presign_get(&self, bucket: &str, key: &str, expires_in: Duration) -> ProviderResult<String> {
        let mut state = self.lock();
        state.enter("PresignGetObject")?;
        state.bucket_mut(bucket)?;
        Ok(format!(
            "https://{bucket}.s3.amazonaws.com/{key}?X-Amz-Expires={}&X-Amz-Signature=test",
            expires_in.as_secs()
        ))
    }

    fn put_object_trigger(&self, trigger: &ObjectTrigger) -> ProviderResult<()> {
        let mut state = self.lock();
        state.enter("PutBucketNotificationConfiguration")?;
        state.bucket_mut(&trigger.bucket)?.trigger = Some(trigger.clone());
        Ok(())
    }

    fn list_object_versions(&self, bucket: &str) -> ProviderResult<Vec<ObjectVersion>> {
        let mut state = self.lock();
        state.enter("ListObjectVersions")?;
        Ok(state.bucket_mut(bucket)?.versions.clone())
    }

    fn list_object_keys(&self, bucket: &str) -> ProviderResult<Vec<String>> {
        let mut state = self.lock();
        state.enter("ListObjectsV2")?;
        Ok(state.bucket_mut(bucket)?.objects.keys().cloned().collect())
    }

    fn delete_objects(&self, bucket: &str, objects: &[ObjectVersion]) -> ProviderResult<()> {
        let mut state = self.lock();
        state.enter("DeleteObjects")?;
        if objects.len() > 1000 {
            return Err(ProviderError::new(
                ErrorKind::Other,
                "MalformedXML",
                "at most 1000 objects per request",
            ));
        }
        let record = state.bucket_mut(bucket)?;
        for object in objects {
            match &object.version_id {
                Some(version_id) => record
                    .versions
                    .retain(|version| version.version_id.as_ref() != Some(version_id)),
                None => {
                    record.objects.remove(&object.key);
                }
            }
        }
        Ok(())
    }

    fn delete_bucket(&self, bucket: &str) -> ProviderResult<()> {
        let mut state = self.lock();
        state.enter("DeleteBucket")?;
        let record = state.bucket_mut(bucket)?;
        if !record.objects.is_empty() || !record.versions.is_empty() {
            return Err(ProviderError::new(
                ErrorKind::Other,
                "BucketNotEmpty",
                format!("{bucket} is not empty"),
            ));
        }
        state.buckets.remove(bucket);
        Ok(())
    }
}

impl TableControl for InMemoryCloud {
    fn describe_table(&self, name: &str) -> ProviderResult<Option<TableState>> {
        let mut state = self.lock();
        state.enter("DescribeTable")?;
        let Some(record) = state.tables.get_mut(name) else {
            return Ok(None);
        };
        let status = if record.pending_polls > 0 {
            record.pending_polls -= 1;
            "CREATING"
        } else {
            TableState::ACTIVE
        };
        Ok(Some(TableState {
            status: status.to_string(),
            stream_enabled: record.stream_arn.is_some(),
            latest_stream_arn: record.stream_arn.clone(),
        }))
    }

    fn create_table(&self, spec: &TableSpec) -> ProviderResult<()> {
        let mut state = self.lock();
        state.enter("CreateTable")?;
        if state.tables.contains_key(&spec.name) {
            return Err(ProviderError::new(
                ErrorKind::AlreadyExists,
                "ResourceInUseException",
                format!("Table already exists: {}", spec.name),
            ));
        }
        let id = state.next_id();
        state.tables.insert(
            spec.name.clone(),
            TableRecord {
                stream_arn: Some(stream_arn(&spec.name, id)),
                pending_polls: self.pending_polls,
            },
        );
        Ok(())
    }

    fn enable_stream(&self, name: &str) -> ProviderResult<()> {
        let mut state = self.lock();
        state.enter("UpdateTable")?;
        let id = state.next_id();
        let record = state
            .tables
            .get_mut(name)
            .ok_or_else(|| missing("ResourceNotFoundException", name))?;
        record.stream_arn = Some(stream_arn(name, id));
        record.pending_polls = self.pending_polls;
        Ok(())
    }

    fn delete_table(&self, name: &str) -> ProviderResult<()> {
        let mut state = self.lock();
        state.enter("DeleteTable")?;
        state
            .tables
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| missing("ResourceNotFoundException", name))
    }
}

impl FunctionControl for InMemoryCloud {
    fn get_function(&self, name: &str) -> ProviderResult<Option<FunctionState>> {
        let mut state = self.lock();
        state.enter("GetFunction")?;
        let Some(key) = state.function_key(name) else {
            return Ok(None);
        };
        let Some(record) = state.functions.get_mut(&key) else {
            return Ok(None);
        };
        let (lifecycle, last_update) = if record.pending_polls > 0 {
            record.pending_polls -= 1;
            if record.updating {
                ("Active", Some("InProgress"))
            } else {
                ("Pending", None)
            }
        } else {
            record.updating = false;
            ("Active", record.function.spec.as_ref().map(|_| "Successful"))
        };
        Ok(Some(FunctionState {
            arn: record.function.arn.clone(),
            state: Some(lifecycle.to_string()),
            last_update_status: last_update.map(str::to_string),
        }))
    }

    fn create_function(&self, spec: &FunctionSpec, archive: &[u8]) -> ProviderResult<String> {
        let mut state = self.lock();
        state.enter("CreateFunction")?;
        if state.function_key(&spec.name).is_some() {
            return Err(ProviderError::new(
                ErrorKind::AlreadyExists,
                "ResourceConflictException",
                format!("Function already exist: {}", spec.name),
            ));
        }
        let arn = function_arn(&spec.name);
        state.functions.insert(
            spec.name.clone(),
            FunctionRecord {
                function: StoredFunction {
                    arn: arn.clone(),
                    spec: Some(spec.clone()),
                    archive: archive.to_vec(),
                    versions_published: 1,
                    statement_ids: BTreeSet::new(),
                },
                pending_polls: self.pending_polls,
                updating: false,
            },
        );
        Ok(arn)
    }

    fn update_function_code(&self, name: &str, archive: &[u8]) -> ProviderResult<()> {
        let pending_polls = self.pending_polls;
        let mut state = self.lock();
        state.enter("UpdateFunctionCode")?;
        let record = state.function_mut(name)?;
        record.function.archive = archive.to_vec();
        record.function.versions_published += 1;
        record.pending_polls = pending_polls;
        record.updating = true;
        Ok(())
    }

    fn update_function_configuration(&self, spec: &FunctionSpec) -> ProviderResult<()> {
        let pending_polls = self.pending_polls;
        let mut state = self.lock();
        state.enter("UpdateFunctionConfiguration")?;
        let record = state.function_mut(&spec.name)?;
        record.function.spec = Some(spec.clone());
        record.pending_polls = pending_polls;
        record.updating = true;
        Ok(())
    }

    fn add_permission(&self, permission: &InvokePermission) -> ProviderResult<()> {
        let mut state = self.lock();
        state.enter("AddPermission")?;
        let record = state.function_mut(&permission.function)?;
        if !record
            .function
            .statement_ids
            .insert(permission.statement_id.clone())
        {
            return Err(ProviderError::new(
                ErrorKind::AlreadyExists,
                "ResourceConflictException",
                format!(
                    "The statement id ({}) provided already exists",
                    permission.statement_id
                ),
            ));
        }
        Ok(())
    }

    fn list_stream_bindings(&self, function: &str) -> ProviderResult<Vec<StreamBinding>> {
        let mut state = self.lock();
        state.enter("ListEventSourceMappings")?;
        let key = state
            .function_key(function)
            .ok_or_else(|| missing("ResourceNotFoundException", function))?;
        let arn = function_arn(&key);
        Ok(state
            .bindings
            .iter()
            .filter(|binding| binding.function_arn == arn)
            .map(|binding| StreamBinding {
                uuid: binding.uuid.clone(),
                event_source_arn: Some(binding.stream_arn.clone()),
            })
            .collect())
    }

    fn create_stream_binding(&self, spec: &BindingSpec) -> ProviderResult<String> {
        let mut state = self.lock();
        state.enter("CreateEventSourceMapping")?;
        let key = state
            .function_key(&spec.function_arn)
            .ok_or_else(|| missing("ResourceNotFoundException", &spec.function_arn))?;
        if state.bindings.iter().any(|binding| {
            binding.function_arn == function_arn(&key) && binding.stream_arn == spec.stream_arn
        }) {
            return Err(ProviderError::new(
                ErrorKind::AlreadyExists,
                "ResourceConflictException",
                "event source mapping already exists",
            ));
        }
        let uuid = format!("00000000-0000-0000-0000-{:012}", state.next_id());
        state.bindings.push(BindingRecord {
            uuid: uuid.clone(),
            function_arn: function_arn(&key),
            stream_arn: spec.stream_arn.clone(),
        });
        Ok(uuid)
    }

    fn delete_stream_binding(&self, uuid: &str) -> ProviderResult<()> {
        let mut state = self.lock();
        state.enter("DeleteEventSourceMapping")?;
        let before = state.bindings.len();
        state.bindings.retain(|binding| binding.uuid != uuid);
        if state.bindings.len() == before {
            return Err(missing("ResourceNotFoundException", uuid));
        }
        Ok(())
    }

    fn delete_function(&self, name: &str) -> ProviderResult<()> {
        let mut state = self.lock();
        state.enter("DeleteFunction")?;
        let key = state
            .function_key(name)
            .ok_or_else(|| missing("ResourceNotFoundException", name))?;
        state.functions.remove(&key);
        Ok(())
    }
}

impl TopicControl for InMemoryCloud {
    fn create_topic(&self, name: &str) -> ProviderResult<String> {
        let mut state = self.lock();
        state.enter("CreateTopic")?;
        let arn = format!("arn:aws:sns:{TEST_REGION}:{TEST_ACCOUNT_ID}:{name}");
        state.topics.entry(arn.clone()).or_default();
        Ok(arn)
    }

    fn subscribe_email(&self, topic_arn: &str, email: &str) -> ProviderResult<()> {
        let mut state = self.lock();
        state.enter("Subscribe")?;
        let subscriptions = state
            .topics
            .get_mut(topic_arn)
            .ok_or_else(|| missing("NotFound", topic_arn))?;
        if !subscriptions.iter().any(|(endpoint, _)| endpoint == email) {
            subscriptions.push((email.to_string(), PENDING_SUBSCRIPTION.to_string()));
        }
        Ok(())
    }

    fn list_topic_arns(&self) -> ProviderResult<Vec<String>> {
        let mut state = self.lock();
        state.enter("ListTopics")?;
        Ok(state.topics.keys().cloned().collect())
    }

    fn list_subscription_arns(&self, topic_arn: &str) -> ProviderResult<Vec<String>> {
        let mut state = self.lock();
        state.enter("ListSubscriptionsByTopic")?;
        state
            .topics
            .get(topic_arn)
            .map(|subscriptions| subscriptions.iter().map(|(_, arn)| arn.clone()).collect())
            .ok_or_else(|| missing("NotFound", topic_arn))
    }

    fn unsubscribe(&self, subscription_arn: &str) -> ProviderResult<()> {
        let mut state = self.lock();
        state.enter("Unsubscribe")?;
        for subscriptions in state.topics.values_mut() {
            subscriptions.retain(|(_, arn)| arn != subscription_arn);
        }
        Ok(())
    }

    fn delete_topic(&self, topic_arn: &str) -> ProviderResult<()> {
        let mut state = self.lock();
        state.enter("DeleteTopic")?;
        state.topics.remove(topic_arn);
        Ok(())
    }
}

impl HttpApiControl for InMemoryCloud {
    fn list_apis(&self) -> ProviderResult<Vec<HttpApi>> {
        let mut state = self.lock();
        state.enter("GetApis")?;
        Ok(state.apis.iter().map(|record| record.api.clone()).collect())
    }

    fn create_api(&self, spec: &HttpApiSpec) -> ProviderResult<HttpApi> {
        let mut state = self.lock();
        state.enter("CreateApi")?;
        let id = format!("api{:04}", state.next_id());
        let api = HttpApi {
            endpoint: Some(format!(
                "https://{id}.execute-api.{TEST_REGION}.amazonaws.com"
            )),
            id,
            name: spec.name.clone(),
        };
        state.apis.push(ApiRecord {
            api: api.clone(),
            integrations: Vec::new(),
            routes: Vec::new(),
            stages: BTreeMap::new(),
        });
        Ok(api)
    }

    fn list_integrations(&self, api_id: &str) -> ProviderResult<Vec<Integration>> {
        let mut state = self.lock();
        state.enter("GetIntegrations")?;
        Ok(state.api_mut(api_id)?.integrations.clone())
    }

    fn create_proxy_integration(&self, api_id: &str, function_arn: &str) -> ProviderResult<String> {
        let mut state = self.lock();
        state.enter("CreateIntegration")?;
        let id = format!("int{:04}", state.next_id());
        state.api_mut(api_id)?.integrations.push(Integration {
            id: id.clone(),
            uri: Some(function_arn.to_string()),
        });
        Ok(id)
    }

    fn list_route_keys(&self, api_id: &str) -> ProviderResult<Vec<String>> {
        let mut state = self.lock();
        state.enter("GetRoutes")?;
        Ok(state
            .api_mut(api_id)?
            .routes
            .iter()
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn create_route(&self, api_id: &str, route_key: &str, target: &str) -> ProviderResult<()> {
        let mut state = self.lock();
        state.enter("CreateRoute")?;
        let api = state.api_mut(api_id)?;
        if api.routes.iter().any(|(key, _)| key == route_key) {
            return Err(ProviderError::new(
                ErrorKind::AlreadyExists,
                "ConflictException",
                format!("Route with key {route_key} already exists for this API"),
            ));
        }
        api.routes.push((route_key.to_string(), target.to_string()));
        Ok(())
    }

    fn stage_exists(&self, api_id: &str, stage: &str) -> ProviderResult<bool> {
        let mut state = self.lock();
        state.enter("GetStage")?;
        Ok(state.api_mut(api_id)?.stages.contains_key(stage))
    }

    fn create_stage(&self, api_id: &str, stage: &str) -> ProviderResult<()> {
        let mut state = self.lock();
        state.enter("CreateStage")?;
        state.api_mut(api_id)?.stages.insert(stage.to_string(), true);
        Ok(())
    }

    fn enable_auto_deploy(&self, api_id: &str, stage: &str) -> ProviderResult<()> {
        let mut state = self.lock();
        state.enter("UpdateStage")?;
        let api = state.api_mut(api_id)?;
        match api.stages.get_mut(stage) {
            Some(auto_deploy) => {
                *auto_deploy = true;
                Ok(())
            }
            None => Err(missing("NotFoundException", stage)),
        }
    }

    fn delete_api(&self, api_id: &str) -> ProviderResult<()> {
        let mut state = self.lock();
        state.enter("DeleteApi")?;
        let before = state.apis.len();
        state.apis.retain(|record| record.api.id != api_id);
        if state.apis.len() == before {
            return Err(missing("NotFoundException", api_id));
        }
        Ok(())
    }
}

impl AccountIdentity for InMemoryCloud {
    fn account_id(&self) -> ProviderResult<String> {
        self.lock().enter("GetCallerIdentity")?;
        Ok(TEST_ACCOUNT_ID.to_string())
    }
}
