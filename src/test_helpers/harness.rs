//! # Fleet Harness
//!
//! Wires the scripted collaborators into a [`CommandOrchestrator`].
//!
//! ```rust
//! use fleet_dispatch::constants::DispatchStatus;
//! use fleet_dispatch::test_helpers::FleetHarness;
//! use fleet_dispatch::{DispatchRequest, Target, TargetSelector};
//!
//! # tokio_test::block_on(async {
//! let harness = FleetHarness::ready(1);
//! harness
//!     .dispatch
//!     .script_next_dispatch(vec![vec![("i-1", DispatchStatus::Success)]]);
//!
//! let request = DispatchRequest::new(
//!     "AWS-RunShellScript",
//!     TargetSelector::new(vec![Target::new("tag:Role", ["web"])]),
//! );
//! let record = harness.orchestrator().run(&request).await.unwrap();
//! assert_eq!(record.status, DispatchStatus::Success);
//! # });
//! ```

use crate::client::FleetClients;
use crate::config::OrchestratorConfig;
use crate::constants::PingStatus;
use crate::orchestration::CommandOrchestrator;
use crate::test_helpers::scripted_clients::{
    CollectingOutputSink, InMemoryObjectStore, ScriptedDispatchService,
    ScriptedHeartbeatRegistry, ScriptedProvisioningRegistry,
};
use std::sync::Arc;

/// A scripted fleet plus handles for inspecting what the orchestrator did to it
pub struct FleetHarness {
    pub provisioning: Arc<ScriptedProvisioningRegistry>,
    pub heartbeat: Arc<ScriptedHeartbeatRegistry>,
    pub dispatch: Arc<ScriptedDispatchService>,
    pub object_store: Arc<InMemoryObjectStore>,
    pub sink: Arc<CollectingOutputSink>,
}

impl FleetHarness {
    /// `provisioned` members with heartbeat frames replayed per readiness poll
    pub fn new(provisioned: usize, heartbeat_frames: Vec<Vec<PingStatus>>) -> Self {
        Self {
            provisioning: Arc::new(ScriptedProvisioningRegistry::fixed(provisioned)),
            heartbeat: Arc::new(ScriptedHeartbeatRegistry::sequence(heartbeat_frames)),
            dispatch: Arc::new(ScriptedDispatchService::new()),
            object_store: Arc::new(InMemoryObjectStore::new("eu-west-1")),
            sink: Arc::new(CollectingOutputSink::default()),
        }
    }

    /// Every member online from the first poll
    pub fn ready(members: usize) -> Self {
        Self::new(members, vec![vec![PingStatus::Online; members]])
    }

    pub fn clients(&self) -> FleetClients {
        FleetClients::new(
            self.provisioning.clone(),
            self.heartbeat.clone(),
            self.dispatch.clone(),
            self.object_store.clone(),
        )
    }

    pub fn orchestrator(&self) -> CommandOrchestrator {
        self.orchestrator_with(OrchestratorConfig::default())
    }

    pub fn orchestrator_with(&self, config: OrchestratorConfig) -> CommandOrchestrator {
        CommandOrchestrator::new(self.clients(), config)
            .expect("harness configuration must be valid")
            .with_output_sink(self.sink.clone())
    }
}
