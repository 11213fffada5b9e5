#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Fleet Dispatch
//!
//! Readiness-gated remote command dispatch across a dynamic fleet of managed hosts.
//!
//! ## Overview
//!
//! One orchestrator run waits until every provisioned fleet member matching a target selector
//! has an Online agent, submits a remote command, polls the per-target invocations until they
//! are all terminal (stopping at the first hard failure), retrieves captured output on a
//! best-effort basis and returns the final dispatch record.
//!
//! ## Module Organization
//!
//! - [`models`] - Requests, selectors and observed records
//! - [`client`] - Collaborator contracts (registries, dispatch service, object store)
//! - [`orchestration`] - Readiness waiter, invocation poller, output retriever, orchestrator
//! - [`lifecycle`] - Create/read/update/delete semantics over orchestrator runs
//! - [`config`] - Layered orchestrator configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//! - [`test_helpers`] - Scripted in-memory collaborators
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fleet_dispatch::client::FleetClients;
//! use fleet_dispatch::config::OrchestratorConfig;
//! use fleet_dispatch::models::{DispatchRequest, Target, TargetSelector};
//! use fleet_dispatch::orchestration::CommandOrchestrator;
//!
//! # async fn example(clients: FleetClients) -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = CommandOrchestrator::new(clients, OrchestratorConfig::default())?;
//!
//! let request = DispatchRequest::new(
//!     "AWS-RunShellScript",
//!     TargetSelector::new(vec![Target::new("tag:Role", ["web"])]),
//! )
//! .with_parameter("commands", ["systemctl restart app"]);
//!
//! let record = orchestrator.run(&request).await?;
//! println!("{} finished with {}", record.dispatch_id, record.status);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod test_helpers;

pub use config::{ConfigLoader, OrchestratorConfig, ReadinessFailurePolicy};
pub use constants::{DispatchStatus, PingStatus};
pub use error::{ClientError, DispatchError, DispatchResult, OutputError};
pub use lifecycle::{CommandResource, ResourceDefinition, ResourceState};
pub use models::{DispatchRecord, DispatchRequest, OutputDestination, Target, TargetSelector};
pub use orchestration::CommandOrchestrator;
