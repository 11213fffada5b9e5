//! # System Constants
//!
//! Registry vocabulary, operational defaults and the status enums shared by the
//! readiness waiter, the invocation poller and the lifecycle adapter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Filter names understood by the provisioning and heartbeat registries
pub mod filters {
    /// Selector key reserved for explicit member-id targeting (matched case-insensitively)
    pub const MEMBER_ID_SELECTOR_KEY: &str = "InstanceIds";

    /// Provisioning registry's native identity filter
    pub const PROVISIONING_MEMBER_ID_FILTER: &str = "instance-id";

    /// Provisioning registry's lifecycle state filter
    pub const PROVISIONING_LIFECYCLE_FILTER: &str = "instance-state-name";

    /// Lifecycle states that count as provisioned fleet members
    pub const ACTIVE_LIFECYCLE_STATES: [&str; 2] = ["pending", "running"];
}

/// Operational defaults applied when configuration does not override them
pub mod defaults {
    pub const POLL_INTERVAL_MS: u64 = 10_000;
    pub const READINESS_TIMEOUT_SECONDS: u64 = 600;
    pub const DELIVERY_TIMEOUT_SECONDS: u32 = 600;
    pub const EXECUTION_TIMEOUT_SECONDS: u32 = 3600;
    pub const MAX_OUTPUT_KEYS: u32 = 1000;
    pub const DEADLINE_GRACE_SECONDS: u64 = 60;
}

/// Status of a dispatch or of a single target's invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DispatchStatus {
    Pending,
    InProgress,
    Success,
    Cancelled,
    TimedOut,
    Failed,
}

impl DispatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchStatus::Pending => "Pending",
            DispatchStatus::InProgress => "InProgress",
            DispatchStatus::Success => "Success",
            DispatchStatus::Cancelled => "Cancelled",
            DispatchStatus::TimedOut => "TimedOut",
            DispatchStatus::Failed => "Failed",
        }
    }

    /// Invocation has not reached a terminal state yet
    pub fn is_pending(&self) -> bool {
        matches!(self, DispatchStatus::Pending | DispatchStatus::InProgress)
    }

    /// Terminal state that invalidates the whole dispatch
    pub fn is_hard_failure(&self) -> bool {
        matches!(
            self,
            DispatchStatus::Cancelled | DispatchStatus::TimedOut | DispatchStatus::Failed
        )
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }
}

impl fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DispatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(DispatchStatus::Pending),
            "InProgress" => Ok(DispatchStatus::InProgress),
            "Success" => Ok(DispatchStatus::Success),
            "Cancelled" => Ok(DispatchStatus::Cancelled),
            "TimedOut" => Ok(DispatchStatus::TimedOut),
            "Failed" => Ok(DispatchStatus::Failed),
            other => Err(format!("Unknown dispatch status: {other}")),
        }
    }
}

/// Agent connectivity as reported by the heartbeat registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PingStatus {
    Online,
    ConnectionLost,
    Inactive,
}

impl PingStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, PingStatus::Online)
    }
}
