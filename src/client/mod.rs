//! # Collaborator Clients
//!
//! Contracts for the provisioning registry, heartbeat registry, command dispatch service and
//! object store. Concrete adapters live outside this crate; [`crate::test_helpers`] provides
//! scripted in-memory implementations.

pub mod messages;
pub mod traits;

pub use messages::{AgentHeartbeat, MemberGroup, SendCommandInput};
pub use traits::{CommandDispatchService, HeartbeatRegistry, ObjectStore, ProvisioningRegistry};

use std::sync::Arc;

/// Shared handles for every collaborator an orchestrator run touches
#[derive(Clone)]
pub struct FleetClients {
    pub provisioning: Arc<dyn ProvisioningRegistry>,
    pub heartbeat: Arc<dyn HeartbeatRegistry>,
    pub dispatch: Arc<dyn CommandDispatchService>,
    pub object_store: Arc<dyn ObjectStore>,
}

impl FleetClients {
    pub fn new(
        provisioning: Arc<dyn ProvisioningRegistry>,
        heartbeat: Arc<dyn HeartbeatRegistry>,
        dispatch: Arc<dyn CommandDispatchService>,
        object_store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            provisioning,
            heartbeat,
            dispatch,
            object_store,
        }
    }
}

impl std::fmt::Debug for FleetClients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetClients").finish_non_exhaustive()
    }
}
