// Test Helpers Module - Scripted Fleet Infrastructure
//
// In-memory collaborators for exercising the readiness waiter, invocation poller and
// orchestrator without real registries, dispatch services or object stores. Intended for
// use with paused tokio time so ten-second poll intervals complete instantly.

pub mod harness;
pub mod scripted_clients;

pub use harness::FleetHarness;
pub use scripted_clients::{
    CollectingOutputSink, InMemoryObjectStore, ScriptedDispatchService,
    ScriptedHeartbeatRegistry, ScriptedProvisioningRegistry,
};
