//! # Command Orchestrator
//!
//! Sequences one dispatch: fleet readiness → submission → invocation polling → output
//! retrieval → final status lookup. Output retrieval runs whatever the poller reported and
//! never changes the result of the run.

use crate::client::{FleetClients, SendCommandInput};
use crate::config::{OrchestratorConfig, ReadinessFailurePolicy};
use crate::error::{DispatchError, DispatchResult};
use crate::logging::log_dispatch_operation;
use crate::models::{DispatchRecord, DispatchRequest, FleetFilters};
use crate::orchestration::invocation_poller::InvocationPoller;
use crate::orchestration::output_retriever::{LoggingOutputSink, OutputRetriever, OutputSink};
use crate::orchestration::readiness::ReadinessWaiter;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{error, info, instrument, warn, Span};

#[derive(Clone)]
pub struct CommandOrchestrator {
    clients: FleetClients,
    config: OrchestratorConfig,
    sink: Arc<dyn OutputSink>,
}

impl std::fmt::Debug for CommandOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandOrchestrator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CommandOrchestrator {
    pub fn new(clients: FleetClients, config: OrchestratorConfig) -> DispatchResult<Self> {
        config.validate()?;

        Ok(Self {
            clients,
            config,
            sink: Arc::new(LoggingOutputSink),
        })
    }

    /// Route retrieved output somewhere other than the log
    pub fn with_output_sink(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn readiness_waiter(&self) -> ReadinessWaiter {
        ReadinessWaiter::new(
            Arc::clone(&self.clients.provisioning),
            Arc::clone(&self.clients.heartbeat),
            self.config.poll_interval(),
        )
    }

    pub fn invocation_poller(&self) -> InvocationPoller {
        InvocationPoller::new(
            Arc::clone(&self.clients.dispatch),
            self.config.poll_interval(),
        )
    }

    pub fn output_retriever(&self) -> OutputRetriever {
        OutputRetriever::new(
            Arc::clone(&self.clients.object_store),
            self.config.max_output_keys,
        )
    }

    /// Wait for the fleet, dispatch the command and poll it to completion
    pub async fn run(&self, request: &DispatchRequest) -> DispatchResult<DispatchRecord> {
        self.run_tracked(request, &Mutex::new(None)).await
    }

    /// `run`, publishing the dispatch id into `submitted` as soon as the command is accepted
    #[instrument(
        name = "run",
        skip(self, request, submitted),
        fields(document = %request.document_name, dispatch_id = tracing::field::Empty)
    )]
    async fn run_tracked(
        &self,
        request: &DispatchRequest,
        submitted: &Mutex<Option<String>>,
    ) -> DispatchResult<DispatchRecord> {
        request.validate()?;

        let filters = FleetFilters::from_selector(&request.targets);
        match self
            .readiness_waiter()
            .wait_for_readiness(&filters, self.config.readiness_timeout())
            .await
        {
            Ok(snapshot) => {
                info!(
                    provisioned = snapshot.provisioned,
                    live = snapshot.live,
                    "Target fleet is ready"
                );
            }
            Err(e @ DispatchError::ReadinessTimeout { .. })
                if self.config.readiness_failure_policy == ReadinessFailurePolicy::Proceed =>
            {
                warn!(error = %e, "Fleet not ready, dispatching anyway");
            }
            Err(e) => {
                error!(error = %e, "Fleet readiness failed");
                log_dispatch_operation("readiness", None, "failed", Some(&e.to_string()));
                return Err(e);
            }
        }

        let input = SendCommandInput::from_request(request, self.config.delivery_timeout_seconds);
        let dispatch_id = self
            .clients
            .dispatch
            .submit(&input)
            .await
            .map_err(|source| DispatchError::Submission { source })
            .inspect_err(|e| error!(error = %e, "Command submission failed"))?;

        Span::current().record("dispatch_id", dispatch_id.as_str());
        *submitted.lock() = Some(dispatch_id.clone());
        log_dispatch_operation("submit", Some(&dispatch_id), "submitted", None);

        let polled = self
            .invocation_poller()
            .poll_to_completion(&dispatch_id, request.execution_timeout())
            .await;

        let summary = self
            .output_retriever()
            .collect_output(request.output.as_ref(), &dispatch_id, self.sink.as_ref())
            .await;
        info!(
            fetched = summary.fetched,
            failed = summary.failed,
            "Output retrieval finished"
        );

        let invocations = polled
            .and_then(|outcome| outcome.into_result(&dispatch_id))
            .inspect_err(|e| {
                error!(error = %e, "Command invocations did not succeed");
                log_dispatch_operation("poll", Some(&dispatch_id), "failed", Some(&e.to_string()));
            })?;

        log_dispatch_operation(
            "poll",
            Some(&dispatch_id),
            "completed",
            Some(&format!("{invocations} invocations")),
        );

        self.get_dispatch(&dispatch_id).await
    }

    /// `run` bounded by readiness timeout + execution timeout + grace. Expiry abandons the
    /// run without a partial record.
    pub async fn run_with_deadline(
        &self,
        request: &DispatchRequest,
    ) -> DispatchResult<DispatchRecord> {
        let deadline = self.config.run_deadline(request.execution_timeout());
        let submitted = Mutex::new(None);

        tokio::time::timeout(deadline, self.run_tracked(request, &submitted))
            .await
            .map_err(|_| {
                let dispatch_id = submitted.lock().take();
                error!(
                    deadline_secs = deadline.as_secs(),
                    dispatch_id = dispatch_id.as_deref().unwrap_or("<not submitted>"),
                    "Dispatch deadline exceeded"
                );
                DispatchError::DeadlineExceeded {
                    dispatch_id,
                    deadline,
                }
            })?
    }

    /// Current dispatch-level status
    pub async fn get_dispatch(&self, dispatch_id: &str) -> DispatchResult<DispatchRecord> {
        self.clients
            .dispatch
            .get_dispatch(dispatch_id)
            .await
            .map_err(|source| DispatchError::StatusLookup {
                dispatch_id: dispatch_id.to_string(),
                source,
            })?
            .ok_or_else(|| DispatchError::DispatchNotFound(dispatch_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DispatchStatus;
    use crate::constants::PingStatus;
    use crate::error::ClientError;
    use crate::models::{Target, TargetSelector};
    use crate::test_helpers::{FleetHarness, ScriptedProvisioningRegistry};
    use std::time::Duration;

    fn request() -> DispatchRequest {
        DispatchRequest::new(
            "AWS-RunShellScript",
            TargetSelector::new(vec![Target::member_ids(["i-1", "i-2"])]),
        )
        .with_parameter("commands", ["systemctl restart app"])
        .with_execution_timeout(60)
    }

    #[tokio::test(start_paused = true)]
    async fn test_submission_carries_request_and_delivery_timeout() {
        let harness = FleetHarness::ready(2);
        harness.dispatch.script_next_dispatch(vec![vec![
            ("i-1", DispatchStatus::Success),
            ("i-2", DispatchStatus::Success),
        ]]);

        let record = harness.orchestrator().run(&request()).await.unwrap();

        assert_eq!(record.status, DispatchStatus::Success);
        let submissions = harness.dispatch.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].document_name, "AWS-RunShellScript");
        assert_eq!(submissions[0].execution_timeout_seconds, 60);
        assert_eq!(submissions[0].delivery_timeout_seconds, 600);
        assert_eq!(harness.provisioning.last_filters()[0].name, "instance-id");
    }

    #[tokio::test(start_paused = true)]
    async fn test_submission_failure_is_propagated() {
        let harness = FleetHarness::ready(2);
        harness
            .dispatch
            .fail_submissions(ClientError::service("dispatch", "InvalidDocument"));

        let err = harness.orchestrator().run(&request()).await.unwrap_err();

        assert!(matches!(err, DispatchError::Submission { .. }));
        assert_eq!(harness.object_store.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_proceed_policy_dispatches_after_readiness_timeout() {
        let harness = FleetHarness::new(2, vec![vec![PingStatus::Online]]);
        harness
            .dispatch
            .script_next_dispatch(vec![vec![("i-1", DispatchStatus::Success)]]);
        let config = OrchestratorConfig {
            readiness_timeout_seconds: 20,
            readiness_failure_policy: ReadinessFailurePolicy::Proceed,
            ..Default::default()
        };

        let record = harness
            .orchestrator_with(config)
            .run(&request())
            .await
            .unwrap();

        assert_eq!(record.status, DispatchStatus::Success);
        assert_eq!(harness.dispatch.submissions().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_failure_is_never_dispatched_even_under_proceed() {
        let mut harness = FleetHarness::ready(2);
        harness.provisioning = Arc::new(ScriptedProvisioningRegistry::failing(
            ClientError::Transport("connection reset".to_string()),
        ));
        let config = OrchestratorConfig {
            readiness_failure_policy: ReadinessFailurePolicy::Proceed,
            ..Default::default()
        };

        let err = harness
            .orchestrator_with(config)
            .run(&request())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DispatchError::RegistryQuery {
                registry: "provisioning",
                ..
            }
        ));
        assert_eq!(err.stage(), "fleet_readiness");
        assert_eq!(harness.provisioning.calls(), 1);
        assert!(harness.dispatch.submissions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_request_is_rejected_before_any_call() {
        let harness = FleetHarness::ready(1);
        let invalid = request().with_execution_timeout(0);

        let err = harness.orchestrator().run(&invalid).await.unwrap_err();

        assert!(matches!(err, DispatchError::Validation(_)));
        assert_eq!(harness.provisioning.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_bounds_whole_run() {
        let harness = FleetHarness::ready(1);
        harness
            .dispatch
            .script_next_dispatch(vec![vec![("i-1", DispatchStatus::InProgress)]]);
        harness.dispatch.set_list_delay(Duration::from_secs(30));
        let config = OrchestratorConfig {
            deadline_grace_seconds: 0,
            readiness_timeout_seconds: 10,
            ..Default::default()
        };

        // 10s readiness + 25s execution; a slow listing service overruns it
        let err = harness
            .orchestrator_with(config)
            .run_with_deadline(&request().with_execution_timeout(25))
            .await
            .unwrap_err();

        match err {
            DispatchError::DeadlineExceeded {
                dispatch_id,
                deadline,
            } => {
                assert_eq!(dispatch_id, harness.dispatch.dispatch_ids().pop());
                assert!(dispatch_id.is_some());
                assert_eq!(deadline, Duration::from_secs(35));
            }
            other => panic!("expected deadline error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_dispatch_lookup() {
        let harness = FleetHarness::ready(1);

        let err = harness
            .orchestrator()
            .get_dispatch("missing")
            .await
            .unwrap_err();

        assert_eq!(err, DispatchError::DispatchNotFound("missing".to_string()));
    }
}
