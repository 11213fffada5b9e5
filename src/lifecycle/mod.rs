//! # Resource Lifecycle
//!
//! Maps declarative resource operations onto orchestrator runs.

pub mod definition;
pub mod resource;

pub use definition::{DestroyCommand, OutputLocation, Parameter, ResourceDefinition};
pub use resource::{CommandResource, ResourceState};
