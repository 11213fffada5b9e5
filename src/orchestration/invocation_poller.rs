//! # Invocation Poller
//!
//! Tracks per-target invocation records until every target is terminal. The first hard
//! failure observed ends polling immediately; remaining targets are not awaited.

use crate::client::CommandDispatchService;
use crate::constants::DispatchStatus;
use crate::error::{DispatchError, DispatchResult};
use crate::orchestration::polling::PollSchedule;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// How polling a dispatch ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Every invocation reached a non-failure terminal state
    Succeeded { invocations: usize },
    /// First hard failure observed
    Failed {
        target_id: String,
        status: DispatchStatus,
    },
    /// Invocations did not settle within the execution timeout
    TimedOut { attempts: u32 },
}

impl PollOutcome {
    pub fn into_result(self, dispatch_id: &str) -> DispatchResult<usize> {
        match self {
            PollOutcome::Succeeded { invocations } => Ok(invocations),
            PollOutcome::Failed { target_id, status } => Err(DispatchError::InvocationFailed {
                dispatch_id: dispatch_id.to_string(),
                target_id,
                status,
            }),
            PollOutcome::TimedOut { attempts } => Err(DispatchError::PollTimeout {
                dispatch_id: dispatch_id.to_string(),
                attempts,
            }),
        }
    }
}

#[derive(Clone)]
pub struct InvocationPoller {
    dispatch: Arc<dyn CommandDispatchService>,
    poll_interval: Duration,
}

impl InvocationPoller {
    pub fn new(dispatch: Arc<dyn CommandDispatchService>, poll_interval: Duration) -> Self {
        Self {
            dispatch,
            poll_interval,
        }
    }

    #[instrument(skip(self), fields(timeout_secs = timeout.as_secs()))]
    pub async fn poll_to_completion(
        &self,
        dispatch_id: &str,
        timeout: Duration,
    ) -> DispatchResult<PollOutcome> {
        let schedule = PollSchedule::new(timeout, self.poll_interval);

        for attempt in 1..=schedule.attempts {
            let invocations = self
                .dispatch
                .list_invocations(dispatch_id)
                .await
                .map_err(|source| DispatchError::InvocationQuery {
                    dispatch_id: dispatch_id.to_string(),
                    source,
                })?;

            if invocations.is_empty() {
                debug!(attempt, "No invocations materialized yet");
                schedule.pause_after(attempt).await;
                continue;
            }

            let mut pending = 0;
            for invocation in &invocations {
                if invocation.status.is_pending() {
                    pending += 1;
                } else if invocation.status.is_hard_failure() {
                    info!(
                        target_id = %invocation.target_id,
                        status = %invocation.status,
                        "Command {} invocation {} on target {}.",
                        dispatch_id,
                        invocation.status,
                        invocation.target_id
                    );
                    return Ok(PollOutcome::Failed {
                        target_id: invocation.target_id.clone(),
                        status: invocation.status,
                    });
                }
            }

            if pending == 0 {
                return Ok(PollOutcome::Succeeded {
                    invocations: invocations.len(),
                });
            }

            debug!(
                attempt,
                pending,
                total = invocations.len(),
                "Invocations still running"
            );
            schedule.pause_after(attempt).await;
        }

        warn!(attempts = schedule.attempts, "Command invocations timed out");

        Ok(PollOutcome::TimedOut {
            attempts: schedule.attempts,
        })
    }
}
