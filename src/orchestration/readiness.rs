//! # Readiness Waiter
//!
//! Reconciles the provisioning registry with the heartbeat registry: the fleet is ready once
//! every provisioned member matching the selector reports an Online agent. Registry errors
//! fail fast; only non-convergence is retried.

use crate::client::{HeartbeatRegistry, ProvisioningRegistry};
use crate::error::{DispatchError, DispatchResult};
use crate::models::{FleetFilters, FleetSnapshot};
use crate::orchestration::polling::PollSchedule;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

#[derive(Clone)]
pub struct ReadinessWaiter {
    provisioning: Arc<dyn ProvisioningRegistry>,
    heartbeat: Arc<dyn HeartbeatRegistry>,
    poll_interval: Duration,
}

impl ReadinessWaiter {
    pub fn new(
        provisioning: Arc<dyn ProvisioningRegistry>,
        heartbeat: Arc<dyn HeartbeatRegistry>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            provisioning,
            heartbeat,
            poll_interval,
        }
    }

    /// Query both registries once
    pub async fn snapshot(&self, filters: &FleetFilters) -> DispatchResult<FleetSnapshot> {
        let groups = self
            .provisioning
            .describe_members(&filters.provisioning)
            .await
            .map_err(|source| DispatchError::RegistryQuery {
                registry: "provisioning",
                source,
            })?;

        let agents = self
            .heartbeat
            .describe_agents(&filters.heartbeat)
            .await
            .map_err(|source| DispatchError::RegistryQuery {
                registry: "heartbeat",
                source,
            })?;

        Ok(FleetSnapshot {
            provisioned: groups.iter().map(|group| group.member_ids.len()).sum(),
            live: agents
                .iter()
                .filter(|agent| agent.ping_status.is_online())
                .count(),
            reporting: agents.len(),
        })
    }

    /// Poll until the live count equals the provisioned count or `timeout` elapses
    #[instrument(skip(self, filters), fields(timeout_secs = timeout.as_secs()))]
    pub async fn wait_for_readiness(
        &self,
        filters: &FleetFilters,
        timeout: Duration,
    ) -> DispatchResult<FleetSnapshot> {
        let schedule = PollSchedule::new(timeout, self.poll_interval);
        let mut last = FleetSnapshot::default();

        for attempt in 1..=schedule.attempts {
            let snapshot = self.snapshot(filters).await.inspect_err(|e| {
                warn!(attempt, error = %e, "Fleet registry query failed");
            })?;

            if snapshot.reporting > 0 || snapshot.provisioned == 0 {
                info!(
                    attempt,
                    "{} of {} target members are online.", snapshot.live, snapshot.provisioned
                );
            } else {
                debug!(
                    attempt,
                    provisioned = snapshot.provisioned,
                    "No agents reporting yet"
                );
            }

            if snapshot.is_converged() {
                return Ok(snapshot);
            }

            last = snapshot;
            schedule.pause_after(attempt).await;
        }

        warn!(
            attempts = schedule.attempts,
            live = last.live,
            provisioned = last.provisioned,
            "Target members are not online"
        );

        Err(DispatchError::ReadinessTimeout {
            provisioned: last.provisioned,
            live: last.live,
            attempts: schedule.attempts,
        })
    }
}
