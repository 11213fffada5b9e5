//! # Command Resource
//!
//! Create/read/update/delete semantics over the orchestrator. Create and update both run the
//! primary command; delete runs the destroy command when one is configured and then forgets
//! the local state.

use crate::constants::DispatchStatus;
use crate::error::DispatchResult;
use crate::lifecycle::definition::ResourceDefinition;
use crate::models::DispatchRecord;
use crate::orchestration::CommandOrchestrator;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

/// Locally persisted view of a dispatched command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    pub id: String,
    pub status: DispatchStatus,
    /// RFC 3339, UTC
    pub requested_time: String,
}

impl From<DispatchRecord> for ResourceState {
    fn from(record: DispatchRecord) -> Self {
        let requested_time = record.requested_time();
        Self {
            id: record.dispatch_id,
            status: record.status,
            requested_time,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommandResource {
    orchestrator: CommandOrchestrator,
}

impl CommandResource {
    pub fn new(orchestrator: CommandOrchestrator) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &CommandOrchestrator {
        &self.orchestrator
    }

    fn default_execution_timeout(&self) -> u32 {
        self.orchestrator.config().default_execution_timeout_seconds
    }

    #[instrument(skip_all, fields(document = %definition.document_name))]
    pub async fn create(&self, definition: &ResourceDefinition) -> DispatchResult<ResourceState> {
        let request = definition.to_request(self.default_execution_timeout())?;
        let record = self.orchestrator.run_with_deadline(&request).await?;
        Ok(record.into())
    }

    pub async fn read(&self, id: &str) -> DispatchResult<ResourceState> {
        Ok(self.orchestrator.get_dispatch(id).await?.into())
    }

    /// Re-runs the primary command; the new dispatch replaces the stored id
    pub async fn update(&self, definition: &ResourceDefinition) -> DispatchResult<ResourceState> {
        self.create(definition).await
    }

    /// Runs the destroy command if configured, then clears `state`. On failure `state` is
    /// left untouched.
    #[instrument(skip_all, fields(document = %definition.document_name))]
    pub async fn delete(
        &self,
        definition: &ResourceDefinition,
        state: &mut Option<ResourceState>,
    ) -> DispatchResult<()> {
        if let Some(request) = definition.destroy_request(self.default_execution_timeout()) {
            let record = self.orchestrator.run_with_deadline(&request?).await?;
            info!(
                dispatch_id = %record.dispatch_id,
                status = %record.status,
                "Destroy command completed"
            );
        }

        state.take();
        Ok(())
    }

    /// Adopt an existing dispatch by id
    pub async fn import(&self, id: &str) -> DispatchResult<ResourceState> {
        self.read(id).await
    }
}
