//! # Orchestrator Configuration
//!
//! Poll cadence, timeouts and policies for one [`CommandOrchestrator`](crate::orchestration::CommandOrchestrator).
//! The value is handed to the orchestrator's constructor so tests can shrink intervals
//! without touching process-wide state.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fleet_dispatch::config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Layered load: defaults, config/fleet-dispatch.toml, environment overlay, FLEET_DISPATCH__* vars
//! let config = ConfigLoader::new("config").load()?;
//!
//! let interval = config.poll_interval();
//! let readiness = config.readiness_timeout();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

use crate::constants::defaults;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What to do when the fleet never converges before the readiness timeout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessFailurePolicy {
    /// Fail the run without dispatching
    #[default]
    Abort,
    /// Log the timeout and dispatch anyway
    Proceed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Sleep between polls of either loop
    pub poll_interval_ms: u64,
    /// Fleet-readiness bound, independent of the request's execution timeout
    pub readiness_timeout_seconds: u64,
    /// Delivery timeout sent with every submission
    pub delivery_timeout_seconds: u32,
    /// Execution timeout used when a resource definition leaves it unset
    pub default_execution_timeout_seconds: u32,
    /// Page size for output listing
    pub max_output_keys: u32,
    pub readiness_failure_policy: ReadinessFailurePolicy,
    /// Slack added on top of readiness + execution timeouts for the outer deadline
    pub deadline_grace_seconds: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: defaults::POLL_INTERVAL_MS,
            readiness_timeout_seconds: defaults::READINESS_TIMEOUT_SECONDS,
            delivery_timeout_seconds: defaults::DELIVERY_TIMEOUT_SECONDS,
            default_execution_timeout_seconds: defaults::EXECUTION_TIMEOUT_SECONDS,
            max_output_keys: defaults::MAX_OUTPUT_KEYS,
            readiness_failure_policy: ReadinessFailurePolicy::default(),
            deadline_grace_seconds: defaults::DEADLINE_GRACE_SECONDS,
        }
    }
}

impl OrchestratorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_secs(self.readiness_timeout_seconds)
    }

    pub fn deadline_grace(&self) -> Duration {
        Duration::from_secs(self.deadline_grace_seconds)
    }

    /// Outer bound for a whole run with the given execution timeout. Saturates at
    /// `Duration::MAX`.
    pub fn run_deadline(&self, execution_timeout: Duration) -> Duration {
        self.readiness_timeout()
            .saturating_add(execution_timeout)
            .saturating_add(self.deadline_grace())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "poll_interval_ms",
                "0",
                "poll interval must be greater than 0",
            ));
        }

        if self.readiness_timeout_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "readiness_timeout_seconds",
                "0",
                "readiness timeout must be greater than 0",
            ));
        }

        if self.delivery_timeout_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "delivery_timeout_seconds",
                "0",
                "delivery timeout must be greater than 0",
            ));
        }

        if self.default_execution_timeout_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "default_execution_timeout_seconds",
                "0",
                "execution timeout must be greater than 0",
            ));
        }

        if self.max_output_keys == 0 {
            return Err(ConfigurationError::invalid_value(
                "max_output_keys",
                "0",
                "listing page size must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();

        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.readiness_timeout(), Duration::from_secs(600));
        assert_eq!(config.delivery_timeout_seconds, 600);
        assert_eq!(config.default_execution_timeout_seconds, 3600);
        assert_eq!(config.max_output_keys, 1000);
        assert_eq!(config.readiness_failure_policy, ReadinessFailurePolicy::Abort);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_run_deadline_sums_bounds() {
        let config = OrchestratorConfig {
            readiness_timeout_seconds: 20,
            deadline_grace_seconds: 5,
            ..Default::default()
        };
        assert_eq!(
            config.run_deadline(Duration::from_secs(30)),
            Duration::from_secs(55)
        );
    }

    #[test]
    fn test_run_deadline_saturates_instead_of_overflowing() {
        let config = OrchestratorConfig {
            readiness_timeout_seconds: u64::MAX,
            deadline_grace_seconds: u64::MAX,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(
            config.run_deadline(Duration::from_secs(3600)),
            Duration::MAX
        );
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = OrchestratorConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("poll_interval_ms"));
    }
}
