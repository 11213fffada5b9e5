//! # Collaborator Traits
//!
//! Capability-bound interfaces for the external services the orchestrator drives. Each
//! handle is stateless from the orchestrator's point of view and must be safe to share
//! between concurrent runs.

use crate::client::messages::{AgentHeartbeat, MemberGroup, SendCommandInput};
use crate::error::ClientResult;
use crate::models::{DispatchRecord, InvocationRecord, RegistryFilter};
use async_trait::async_trait;
use std::sync::Arc;

/// Authoritative registry of provisioned fleet members
#[async_trait]
pub trait ProvisioningRegistry: Send + Sync {
    /// Members matching every filter, grouped the way the registry reports them
    async fn describe_members(&self, filters: &[RegistryFilter]) -> ClientResult<Vec<MemberGroup>>;
}

/// Registry of agents currently reporting liveness
#[async_trait]
pub trait HeartbeatRegistry: Send + Sync {
    async fn describe_agents(&self, filters: &[RegistryFilter])
        -> ClientResult<Vec<AgentHeartbeat>>;
}

/// Remote command execution service
#[async_trait]
pub trait CommandDispatchService: Send + Sync {
    /// Submit a command and return its dispatch identifier
    async fn submit(&self, input: &SendCommandInput) -> ClientResult<String>;

    /// Current per-target invocation records for a dispatch
    async fn list_invocations(&self, dispatch_id: &str) -> ClientResult<Vec<InvocationRecord>>;

    /// Dispatch-level status, `None` when the identifier is unknown
    async fn get_dispatch(&self, dispatch_id: &str) -> ClientResult<Option<DispatchRecord>>;
}

/// Object storage holding captured invocation output
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Region the bucket lives in
    async fn bucket_region(&self, bucket: &str) -> ClientResult<String>;

    /// A client pinned to `region`
    async fn with_region(&self, region: &str) -> ClientResult<Arc<dyn ObjectStore>>;

    /// Up to `max_keys` object keys under `prefix`
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: u32,
    ) -> ClientResult<Vec<String>>;

    /// Full object contents
    async fn get_object(&self, bucket: &str, key: &str) -> ClientResult<Vec<u8>>;
}
