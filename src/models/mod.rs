//! # Data Model
//!
//! Requests, selectors and the records observed while a dispatch runs.

pub mod records;
pub mod request;
pub mod selector;

pub use records::{CommandOutput, DispatchRecord, FleetSnapshot, InvocationRecord};
pub use request::{DispatchRequest, OutputDestination};
pub use selector::{FleetFilters, RegistryFilter, Target, TargetSelector};
