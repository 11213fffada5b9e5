use crate::constants::PingStatus;
use crate::models::{DispatchRequest, OutputDestination, TargetSelector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Members the provisioning registry reports together (e.g. one launch reservation)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberGroup {
    pub member_ids: Vec<String>,
}

impl MemberGroup {
    pub fn new<I, V>(member_ids: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            member_ids: member_ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// One agent's heartbeat entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentHeartbeat {
    pub member_id: String,
    pub ping_status: PingStatus,
}

impl AgentHeartbeat {
    pub fn new(member_id: impl Into<String>, ping_status: PingStatus) -> Self {
        Self {
            member_id: member_id.into(),
            ping_status,
        }
    }
}

/// Submission payload for [`CommandDispatchService::submit`](super::CommandDispatchService::submit)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendCommandInput {
    pub document_name: String,
    pub parameters: HashMap<String, Vec<String>>,
    pub targets: TargetSelector,
    pub comment: String,
    pub execution_timeout_seconds: u32,
    /// Time the service may spend delivering the command to a target
    pub delivery_timeout_seconds: u32,
    pub output: Option<OutputDestination>,
}

impl SendCommandInput {
    pub fn from_request(request: &DispatchRequest, delivery_timeout_seconds: u32) -> Self {
        Self {
            document_name: request.document_name.clone(),
            parameters: request.parameters.clone(),
            targets: request.targets.clone(),
            comment: request.comment.clone(),
            execution_timeout_seconds: request.execution_timeout_seconds,
            delivery_timeout_seconds,
            output: request.output.clone(),
        }
    }
}
