//! # Dispatch Orchestration
//!
//! Two bounded-time polling state machines and the orchestrator that sequences them.
//!
//! ## Core Components
//!
//! - **ReadinessWaiter**: waits until every provisioned member matching the selector has an
//!   Online agent in the heartbeat registry
//! - **InvocationPoller**: polls per-target invocations until all are terminal, stopping on
//!   the first hard failure
//! - **OutputRetriever**: lists and lazily fetches captured output, best effort
//! - **CommandOrchestrator**: readiness → submit → poll → output → final status lookup
//!
//! Both loops are sequential and sleep-based; the only suspension points are the fixed
//! sleeps between attempts and the collaborator calls themselves.

pub mod invocation_poller;
pub mod orchestrator;
pub mod output_retriever;
pub mod polling;
pub mod readiness;

pub use invocation_poller::{InvocationPoller, PollOutcome};
pub use orchestrator::CommandOrchestrator;
pub use output_retriever::{
    LoggingOutputSink, OutputListing, OutputRetriever, OutputSink, OutputSummary,
};
pub use polling::PollSchedule;
pub use readiness::ReadinessWaiter;
