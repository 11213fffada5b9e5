//! End-to-end orchestrator runs against a scripted fleet.
//!
//! All tests run on paused tokio time, so the ten-second poll interval costs nothing.

use fleet_dispatch::constants::DispatchStatus::{Failed, InProgress, Pending, Success};
use fleet_dispatch::constants::PingStatus::{ConnectionLost, Online};
use fleet_dispatch::test_helpers::FleetHarness;
use fleet_dispatch::ClientError;
use fleet_dispatch::{
    DispatchError, DispatchRequest, DispatchStatus, OrchestratorConfig, OutputDestination, Target,
    TargetSelector,
};

fn web_request() -> DispatchRequest {
    DispatchRequest::new(
        "AWS-RunShellScript",
        TargetSelector::new(vec![Target::new("tag:Role", ["web"])]),
    )
    .with_parameter("commands", ["/opt/app/bin/migrate"])
    .with_comment("schema migration")
    .with_execution_timeout(600)
}

#[tokio::test(start_paused = true)]
async fn three_members_come_online_and_succeed() {
    let harness = FleetHarness::new(
        3,
        vec![
            vec![Online, ConnectionLost],
            vec![Online, Online, Online],
        ],
    );
    harness.dispatch.script_next_dispatch(vec![
        vec![("i-1", Pending), ("i-2", Pending), ("i-3", Pending)],
        vec![("i-1", Success), ("i-2", InProgress), ("i-3", InProgress)],
        vec![("i-1", Success), ("i-2", Success), ("i-3", Success)],
    ]);

    let record = harness.orchestrator().run(&web_request()).await.unwrap();

    assert_eq!(record.status, DispatchStatus::Success);
    assert_eq!(harness.heartbeat.calls(), 2);
    assert_eq!(harness.dispatch.list_calls(&record.dispatch_id), 3);
    assert_eq!(harness.dispatch.submissions()[0].comment, "schema migration");
}

#[tokio::test(start_paused = true)]
async fn unready_fleet_is_never_dispatched_to() {
    let harness = FleetHarness::new(2, vec![vec![Online, ConnectionLost]]);
    let config = OrchestratorConfig {
        readiness_timeout_seconds: 20,
        ..Default::default()
    };

    let err = harness
        .orchestrator_with(config)
        .run(&web_request())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        DispatchError::ReadinessTimeout {
            provisioned: 2,
            live: 1,
            attempts: 2,
        }
    );
    assert!(harness.dispatch.submissions().is_empty());
    assert_eq!(harness.provisioning.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn failed_target_is_reported_after_output_retrieval() {
    let harness = FleetHarness::ready(2);
    harness.dispatch.script_dispatch_as(
        "cmd-0042",
        vec![vec![("i-1", InProgress), ("i-2", Failed)]],
    );
    harness
        .object_store
        .put("command-logs", "cmd-0042/i-2/stderr", "exit status 3");
    let request = web_request().with_output(OutputDestination::new("command-logs"));

    let err = harness.orchestrator().run(&request).await.unwrap_err();

    match &err {
        DispatchError::InvocationFailed {
            dispatch_id,
            target_id,
            status,
        } => {
            assert_eq!(dispatch_id, "cmd-0042");
            assert_eq!(target_id, "i-2");
            assert_eq!(*status, Failed);
        }
        other => panic!("expected invocation failure, got {other:?}"),
    }
    assert!(err.to_string().contains("i-2"));

    let outputs = harness.sink.outputs();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].key, "cmd-0042/i-2/stderr");
    assert_eq!(harness.object_store.pinned_regions(), vec!["eu-west-1"]);
}

#[tokio::test(start_paused = true)]
async fn captured_output_reaches_the_sink() {
    let harness = FleetHarness::ready(1);
    harness.dispatch.script_next_dispatch(vec![vec![("i-1", Success)]]);
    let request = web_request()
        .with_output(OutputDestination::new("command-logs").with_key_prefix("migrations"));

    let record = harness.orchestrator().run(&request).await.unwrap();

    // Nothing was stored under the new id, so the listing was empty
    assert!(harness.sink.outputs().is_empty());

    let prefix = format!("migrations/{}", record.dispatch_id);
    harness
        .object_store
        .put("command-logs", &format!("{prefix}/i-1/stdout"), "42 rows migrated");
    let summary = harness
        .orchestrator()
        .output_retriever()
        .collect_output(
            request.output.as_ref(),
            &record.dispatch_id,
            harness.sink.as_ref(),
        )
        .await;

    assert_eq!(summary.fetched, 1);
    assert_eq!(harness.sink.outputs()[0].content_lossy(), "42 rows migrated");
}

#[tokio::test(start_paused = true)]
async fn empty_selector_match_dispatches_and_times_out_without_invocations() {
    let harness = FleetHarness::ready(0);
    harness.dispatch.script_next_dispatch(vec![vec![]]);

    let err = harness
        .orchestrator()
        .run(&web_request().with_execution_timeout(30))
        .await
        .unwrap_err();

    assert_eq!(harness.heartbeat.calls(), 1);
    assert_eq!(harness.dispatch.submissions().len(), 1);
    assert!(matches!(err, DispatchError::PollTimeout { attempts: 3, .. }));
}

#[tokio::test(start_paused = true)]
async fn completed_dispatch_lookup_is_idempotent() {
    let harness = FleetHarness::ready(1);
    harness.dispatch.script_next_dispatch(vec![vec![("i-1", Success)]]);
    let orchestrator = harness.orchestrator();

    let record = orchestrator.run(&web_request()).await.unwrap();
    let first = orchestrator.get_dispatch(&record.dispatch_id).await.unwrap();
    let second = orchestrator.get_dispatch(&record.dispatch_id).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first, record);
}

#[tokio::test(start_paused = true)]
async fn unlistable_output_does_not_change_a_successful_run() {
    let harness = FleetHarness::ready(2);
    harness
        .dispatch
        .script_next_dispatch(vec![vec![("i-1", Success), ("i-2", Success)]]);
    harness
        .object_store
        .fail_listing(ClientError::service("s3", "AccessDenied"));
    let request = web_request().with_output(OutputDestination::new("command-logs"));

    let record = harness.orchestrator().run(&request).await.unwrap();

    assert_eq!(record.status, DispatchStatus::Success);
    assert!(harness.sink.outputs().is_empty());
}

#[tokio::test(start_paused = true)]
async fn unlistable_output_does_not_mask_a_failed_target() {
    let harness = FleetHarness::ready(2);
    harness
        .dispatch
        .script_next_dispatch(vec![vec![("i-1", Success), ("i-2", Failed)]]);
    harness
        .object_store
        .fail_listing(ClientError::service("s3", "AccessDenied"));
    let request = web_request().with_output(OutputDestination::new("command-logs"));

    let err = harness.orchestrator().run(&request).await.unwrap_err();

    assert!(matches!(
        err,
        DispatchError::InvocationFailed { ref target_id, status: Failed, .. } if target_id == "i-2"
    ));
}

#[tokio::test(start_paused = true)]
async fn unknown_bucket_region_does_not_change_a_successful_run() {
    let harness = FleetHarness::ready(1);
    harness.dispatch.script_next_dispatch(vec![vec![("i-1", Success)]]);
    harness
        .object_store
        .fail_region(ClientError::NotFound("command-logs".to_string()));
    let request = web_request().with_output(OutputDestination::new("command-logs"));

    let record = harness.orchestrator().run(&request).await.unwrap();

    assert_eq!(record.status, DispatchStatus::Success);
    assert!(harness.object_store.pinned_regions().is_empty());
}
