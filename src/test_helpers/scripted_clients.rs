//! Scripted in-memory collaborators.
//!
//! Each fake replays a sequence of frames, one per call, repeating the last frame once the
//! script runs out, and counts calls so tests can assert on polling behavior.

use crate::client::{
    AgentHeartbeat, CommandDispatchService, HeartbeatRegistry, MemberGroup, ObjectStore,
    ProvisioningRegistry, SendCommandInput,
};
use crate::constants::{DispatchStatus, PingStatus};
use crate::error::{ClientError, ClientResult};
use crate::models::{CommandOutput, DispatchRecord, InvocationRecord, RegistryFilter};
use crate::orchestration::OutputSink;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn frame_at<T: Clone>(frames: &[T], index: usize) -> Option<T> {
    frames.get(index.min(frames.len().saturating_sub(1))).cloned()
}

/// Provisioning registry replaying member counts
pub struct ScriptedProvisioningRegistry {
    counts: Vec<usize>,
    failure: Option<ClientError>,
    calls: AtomicUsize,
    last_filters: Mutex<Vec<RegistryFilter>>,
}

impl ScriptedProvisioningRegistry {
    pub fn sequence(counts: Vec<usize>) -> Self {
        Self {
            counts,
            failure: None,
            calls: AtomicUsize::new(0),
            last_filters: Mutex::new(Vec::new()),
        }
    }

    pub fn fixed(count: usize) -> Self {
        Self::sequence(vec![count])
    }

    pub fn failing(error: ClientError) -> Self {
        Self {
            failure: Some(error),
            ..Self::sequence(vec![])
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_filters(&self) -> Vec<RegistryFilter> {
        self.last_filters.lock().clone()
    }
}

#[async_trait]
impl ProvisioningRegistry for ScriptedProvisioningRegistry {
    async fn describe_members(&self, filters: &[RegistryFilter]) -> ClientResult<Vec<MemberGroup>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_filters.lock() = filters.to_vec();

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let count = frame_at(&self.counts, call).unwrap_or(0);
        let ids: Vec<String> = (1..=count).map(|n| format!("i-{n}")).collect();

        // Report in groups of two, like launch reservations
        Ok(ids.chunks(2).map(|chunk| MemberGroup::new(chunk.to_vec())).collect())
    }
}

/// Heartbeat registry replaying ping states
pub struct ScriptedHeartbeatRegistry {
    frames: Vec<Vec<PingStatus>>,
    failure: Option<ClientError>,
    calls: AtomicUsize,
}

impl ScriptedHeartbeatRegistry {
    pub fn sequence(frames: Vec<Vec<PingStatus>>) -> Self {
        Self {
            frames,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fixed(frame: Vec<PingStatus>) -> Self {
        Self::sequence(vec![frame])
    }

    pub fn failing(error: ClientError) -> Self {
        Self {
            failure: Some(error),
            ..Self::sequence(vec![])
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HeartbeatRegistry for ScriptedHeartbeatRegistry {
    async fn describe_agents(
        &self,
        _filters: &[RegistryFilter],
    ) -> ClientResult<Vec<AgentHeartbeat>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        Ok(frame_at(&self.frames, call)
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(n, status)| AgentHeartbeat::new(format!("i-{}", n + 1), status))
            .collect())
    }
}

type InvocationFrames = Vec<Vec<InvocationRecord>>;

struct ScriptedDispatch {
    frames: InvocationFrames,
    list_calls: usize,
    last_observed: Option<Vec<InvocationRecord>>,
    requested_at: DateTime<Utc>,
}

impl ScriptedDispatch {
    fn status(&self) -> DispatchStatus {
        let Some(observed) = &self.last_observed else {
            return DispatchStatus::Pending;
        };

        if let Some(failed) = observed.iter().find(|i| i.status.is_hard_failure()) {
            failed.status
        } else if observed.is_empty() || observed.iter().any(|i| i.status.is_pending()) {
            DispatchStatus::InProgress
        } else {
            DispatchStatus::Success
        }
    }
}

/// Dispatch service whose invocations follow a per-dispatch script
#[derive(Default)]
pub struct ScriptedDispatchService {
    dispatches: DashMap<String, ScriptedDispatch>,
    queued_scripts: Mutex<VecDeque<(Option<String>, InvocationFrames)>>,
    submissions: Mutex<Vec<SendCommandInput>>,
    submit_failure: Mutex<Option<ClientError>>,
    list_delay: Mutex<Option<Duration>>,
}

fn to_frames(frames: Vec<Vec<(&str, DispatchStatus)>>) -> InvocationFrames {
    frames
        .into_iter()
        .map(|frame| {
            frame
                .into_iter()
                .map(|(target, status)| InvocationRecord::new(target, status))
                .collect()
        })
        .collect()
}

impl ScriptedDispatchService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dispatch directly and return its id
    pub fn seed_dispatch(&self, frames: Vec<Vec<(&str, DispatchStatus)>>) -> String {
        let id = format!("cmd-{}", Uuid::new_v4());
        self.insert(id.clone(), to_frames(frames));
        id
    }

    /// Script for the next submitted dispatch
    pub fn script_next_dispatch(&self, frames: Vec<Vec<(&str, DispatchStatus)>>) {
        self.queued_scripts.lock().push_back((None, to_frames(frames)));
    }

    /// Script for the next submitted dispatch, which will be assigned `id`
    pub fn script_dispatch_as(&self, id: &str, frames: Vec<Vec<(&str, DispatchStatus)>>) {
        self.queued_scripts
            .lock()
            .push_back((Some(id.to_string()), to_frames(frames)));
    }

    pub fn fail_submissions(&self, error: ClientError) {
        *self.submit_failure.lock() = Some(error);
    }

    /// Make every invocation listing take `delay`
    pub fn set_list_delay(&self, delay: Duration) {
        *self.list_delay.lock() = Some(delay);
    }

    pub fn submissions(&self) -> Vec<SendCommandInput> {
        self.submissions.lock().clone()
    }

    pub fn dispatch_ids(&self) -> Vec<String> {
        self.dispatches.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn list_calls(&self, dispatch_id: &str) -> usize {
        self.dispatches
            .get(dispatch_id)
            .map(|dispatch| dispatch.list_calls)
            .unwrap_or(0)
    }

    fn insert(&self, id: String, frames: InvocationFrames) {
        self.dispatches.insert(
            id,
            ScriptedDispatch {
                frames,
                list_calls: 0,
                last_observed: None,
                requested_at: Utc::now(),
            },
        );
    }
}

#[async_trait]
impl CommandDispatchService for ScriptedDispatchService {
    async fn submit(&self, input: &SendCommandInput) -> ClientResult<String> {
        self.submissions.lock().push(input.clone());

        if let Some(error) = self.submit_failure.lock().clone() {
            return Err(error);
        }

        let (id, frames) = self
            .queued_scripts
            .lock()
            .pop_front()
            .unwrap_or_else(|| (None, vec![vec![]]));
        let id = id.unwrap_or_else(|| format!("cmd-{}", Uuid::new_v4()));
        self.insert(id.clone(), frames);
        Ok(id)
    }

    async fn list_invocations(&self, dispatch_id: &str) -> ClientResult<Vec<InvocationRecord>> {
        let delay = *self.list_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut dispatch = self
            .dispatches
            .get_mut(dispatch_id)
            .ok_or_else(|| ClientError::NotFound(format!("command {dispatch_id}")))?;

        let frame = frame_at(&dispatch.frames, dispatch.list_calls).unwrap_or_default();
        dispatch.list_calls += 1;
        dispatch.last_observed = Some(frame.clone());
        Ok(frame)
    }

    async fn get_dispatch(&self, dispatch_id: &str) -> ClientResult<Option<DispatchRecord>> {
        Ok(self
            .dispatches
            .get(dispatch_id)
            .map(|dispatch| DispatchRecord {
                dispatch_id: dispatch_id.to_string(),
                status: dispatch.status(),
                requested_at: dispatch.requested_at,
            }))
    }
}

#[derive(Default)]
struct StoreState {
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
    failures: Mutex<HashMap<String, ClientError>>,
    region_failure: Mutex<Option<ClientError>>,
    listing_failure: Mutex<Option<ClientError>>,
    pinned_regions: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

/// Object store over an in-memory map; region-pinned clients share the same objects
#[derive(Clone)]
pub struct InMemoryObjectStore {
    bucket_region: String,
    state: Arc<StoreState>,
}

impl InMemoryObjectStore {
    /// Store whose buckets all live in `bucket_region`
    pub fn new(bucket_region: impl Into<String>) -> Self {
        Self {
            bucket_region: bucket_region.into(),
            state: Arc::new(StoreState::default()),
        }
    }

    pub fn put(&self, bucket: &str, key: &str, content: impl Into<Vec<u8>>) {
        self.state
            .objects
            .lock()
            .insert((bucket.to_string(), key.to_string()), content.into());
    }

    /// Make fetching `key` fail
    pub fn fail_key(&self, key: &str, error: ClientError) {
        self.state.failures.lock().insert(key.to_string(), error);
    }

    /// Make every bucket region lookup fail
    pub fn fail_region(&self, error: ClientError) {
        *self.state.region_failure.lock() = Some(error);
    }

    /// Make every listing fail
    pub fn fail_listing(&self, error: ClientError) {
        *self.state.listing_failure.lock() = Some(error);
    }

    /// Every store call, including region lookups
    pub fn call_count(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    pub fn pinned_regions(&self) -> Vec<String> {
        self.state.pinned_regions.lock().clone()
    }

    fn record_call(&self) {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn bucket_region(&self, _bucket: &str) -> ClientResult<String> {
        self.record_call();
        if let Some(error) = self.state.region_failure.lock().clone() {
            return Err(error);
        }
        Ok(self.bucket_region.clone())
    }

    async fn with_region(&self, region: &str) -> ClientResult<Arc<dyn ObjectStore>> {
        self.record_call();
        self.state.pinned_regions.lock().push(region.to_string());
        Ok(Arc::new(self.clone()))
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: u32,
    ) -> ClientResult<Vec<String>> {
        self.record_call();
        if let Some(error) = self.state.listing_failure.lock().clone() {
            return Err(error);
        }
        Ok(self
            .state
            .objects
            .lock()
            .keys()
            .filter(|(b, key)| b == bucket && key.starts_with(prefix))
            .map(|(_, key)| key.clone())
            .take(max_keys as usize)
            .collect())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> ClientResult<Vec<u8>> {
        self.record_call();
        if let Some(error) = self.state.failures.lock().get(key) {
            return Err(error.clone());
        }
        self.state
            .objects
            .lock()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("s3://{bucket}/{key}")))
    }
}

/// Output sink that keeps everything it receives
#[derive(Default)]
pub struct CollectingOutputSink {
    outputs: Mutex<Vec<CommandOutput>>,
}

impl CollectingOutputSink {
    pub fn outputs(&self) -> Vec<CommandOutput> {
        self.outputs.lock().clone()
    }
}

impl OutputSink for CollectingOutputSink {
    fn accept(&self, output: &CommandOutput) {
        self.outputs.lock().push(output.clone());
    }
}
