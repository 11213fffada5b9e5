use crate::constants::DispatchStatus;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A submitted dispatch as reported by the dispatch service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub dispatch_id: String,
    pub status: DispatchStatus,
    pub requested_at: DateTime<Utc>,
}

impl DispatchRecord {
    /// RFC 3339 UTC timestamp with second precision
    pub fn requested_time(&self) -> String {
        self.requested_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// One target's invocation within a dispatch. Re-fetched on every poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRecord {
    pub target_id: String,
    pub status: DispatchStatus,
}

impl InvocationRecord {
    pub fn new(target_id: impl Into<String>, status: DispatchStatus) -> Self {
        Self {
            target_id: target_id.into(),
            status,
        }
    }
}

/// Provisioned vs. live member counts observed on one readiness tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetSnapshot {
    pub provisioned: usize,
    pub live: usize,
    /// Number of heartbeat entries returned, online or not
    pub reporting: usize,
}

impl FleetSnapshot {
    /// Live count matches provisioned count. Only evaluated once agents report, unless the
    /// selector matched nothing at all.
    pub fn is_converged(&self) -> bool {
        (self.reporting > 0 || self.provisioned == 0) && self.live == self.provisioned
    }
}

/// One captured output blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub key: String,
    pub content: Vec<u8>,
}

impl CommandOutput {
    pub fn content_lossy(&self) -> String {
        String::from_utf8_lossy(&self.content).into_owned()
    }
}
