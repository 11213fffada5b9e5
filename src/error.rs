//! Error types for fleet dispatch.
//!

use crate::constants::DispatchStatus;
use std::time::Duration;
use thiserror::Error;

/// Failure reported by a collaborator adapter (registry, dispatch service, object store)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    #[error("{service} error: {message}")]
    Service { service: String, message: String },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ClientError {
    pub fn service(service: impl Into<String>, message: impl Into<String>) -> Self {
        ClientError::Service {
            service: service.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced to callers of the orchestrator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("Fleet readiness: {registry} registry query failed: {source}")]
    RegistryQuery {
        registry: &'static str,
        source: ClientError,
    },
    #[error(
        "Fleet readiness: target members are not online ({live} of {provisioned} online after {attempts} attempts)"
    )]
    ReadinessTimeout {
        provisioned: usize,
        live: usize,
        attempts: u32,
    },
    #[error("Command submission failed: {source}")]
    Submission { source: ClientError },
    #[error("Command {dispatch_id}: invocation {status} on target {target_id}")]
    InvocationFailed {
        dispatch_id: String,
        target_id: String,
        status: DispatchStatus,
    },
    #[error("Command {dispatch_id}: invocations timed out after {attempts} polls")]
    PollTimeout { dispatch_id: String, attempts: u32 },
    #[error("Command {dispatch_id}: invocation listing failed: {source}")]
    InvocationQuery {
        dispatch_id: String,
        source: ClientError,
    },
    #[error("Command {dispatch_id}: status lookup failed: {source}")]
    StatusLookup {
        dispatch_id: String,
        source: ClientError,
    },
    #[error("Command {0} not found")]
    DispatchNotFound(String),
    /// `dispatch_id` is set when the command was submitted before the deadline hit
    #[error("Dispatch deadline of {deadline:?} exceeded{}", for_command(.dispatch_id))]
    DeadlineExceeded {
        dispatch_id: Option<String>,
        deadline: Duration,
    },
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
}

fn for_command(dispatch_id: &Option<String>) -> String {
    dispatch_id
        .as_deref()
        .map(|id| format!(" for command {id}"))
        .unwrap_or_default()
}

impl DispatchError {
    /// Stage of the run that produced this error
    pub fn stage(&self) -> &'static str {
        match self {
            DispatchError::RegistryQuery { .. } | DispatchError::ReadinessTimeout { .. } => {
                "fleet_readiness"
            }
            DispatchError::Submission { .. } => "submission",
            DispatchError::InvocationFailed { .. }
            | DispatchError::PollTimeout { .. }
            | DispatchError::InvocationQuery { .. } => "invocation_polling",
            DispatchError::StatusLookup { .. } | DispatchError::DispatchNotFound(_) => {
                "status_lookup"
            }
            DispatchError::DeadlineExceeded { .. } => "deadline",
            DispatchError::Validation(_) => "validation",
            DispatchError::Configuration(_) => "configuration",
        }
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(error: serde_json::Error) -> Self {
        DispatchError::Validation(format!("JSON deserialization error: {error}"))
    }
}

/// Output retrieval failure. Recovered locally and never converted into a [`DispatchError`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OutputError {
    #[error("Bucket {bucket} region lookup failed: {source}")]
    RegionLookup { bucket: String, source: ClientError },
    #[error("Listing s3://{bucket}/{prefix} failed: {source}")]
    Listing {
        bucket: String,
        prefix: String,
        source: ClientError,
    },
    #[error("Fetching s3://{bucket}/{key} failed: {source}")]
    Fetch {
        bucket: String,
        key: String,
        source: ClientError,
    },
}

pub type DispatchResult<T> = std::result::Result<T, DispatchError>;
pub type ClientResult<T> = std::result::Result<T, ClientError>;
