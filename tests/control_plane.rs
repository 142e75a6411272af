//! Workspace-level integration tests (§8): drive the Control Plane the way
//! a client of `perles-daemon` would, without reaching into any crate's
//! private state.

use std::collections::BTreeMap;
use std::time::Duration;

use perles_core::{
    EventFilter, EventType, FakeClock, HealthPolicy, Namespace, TemplateId, WorkflowState,
    WorktreeMode,
};
use perles_daemon::collaborators::fake::{FakeGitExecutor, FakeTrackerExecutor};
use perles_daemon::{Config, ControlPlane, CreateRequest, GitExecutor, StopRequest};
use perles_registry::EmbeddedRegistryService;
use perles_supervisor::FakeProcessSpawner;
use tempfile::tempdir;

async fn plane(
    health_policy: HealthPolicy,
) -> (
    ControlPlane<FakeClock>,
    tempfile::TempDir,
    std::sync::Arc<FakeTrackerExecutor>,
    FakeClock,
    std::sync::Arc<FakeProcessSpawner>,
) {
    let dir = tempdir().unwrap();
    let pool = perles_store::pool::open(&dir.path().join("perles.sqlite3")).await.unwrap();
    let store = perles_store::SessionStore::new(pool);
    let registry = std::sync::Arc::new(EmbeddedRegistryService::load().unwrap());
    let tracker = FakeTrackerExecutor::new();
    let spawner = FakeProcessSpawner::new();
    let clock = FakeClock::new();
    let config = Config {
        state_dir: dir.path().to_path_buf(),
        broker_capacity: 64,
        health_policy,
        health_check_interval: Duration::from_secs(10),
        drain_timeout: Duration::from_secs(5),
    };
    let plane = ControlPlane::new(config, clock.clone(), store, registry, tracker.clone(), spawner.clone());
    (plane, dir, tracker, clock, spawner)
}

fn create_request(template: &str) -> CreateRequest {
    let mut args = BTreeMap::new();
    args.insert("goal".to_string(), "ship the release".to_string());
    CreateRequest {
        spec: perles_core::WorkflowSpec {
            template_id: TemplateId::from_string(template),
            name: Some("release".to_string()),
            epic_id: None,
            initial_prompt: "ship the release".to_string(),
            worktree_mode: WorktreeMode::None,
        },
        project: "acme".to_string(),
        namespace: Namespace::Workflow,
        args,
    }
}

// §8(a): create -> start -> stop, epic materialized through the tracker,
// lifecycle events observed by a subscriber in order.
#[tokio::test]
async fn full_lifecycle_creates_an_epic_and_emits_events_in_order() {
    let (plane, _dir, tracker, _clock, _spawner) = plane(HealthPolicy::default()).await;
    let mut sub = plane.subscribe(EventFilter::default());

    let id = plane.create(create_request("tpl-cook")).await.unwrap();
    assert_eq!(tracker.created_epics().len(), 1);

    plane.start(&id).await.unwrap();
    plane
        .stop(
            &id,
            StopRequest { reason: "release shipped".to_string(), force: false, grace_period: Duration::from_secs(5) },
        )
        .await
        .unwrap();

    let seen: Vec<EventType> = [
        sub.receiver.recv().await.unwrap().event_type,
        sub.receiver.recv().await.unwrap().event_type,
        sub.receiver.recv().await.unwrap().event_type,
    ]
    .to_vec();
    assert_eq!(
        seen,
        vec![EventType::WorkflowCreated, EventType::WorkflowStarted, EventType::WorkflowStopped]
    );
}

// §8(b): an epic-driven template reuses the caller-supplied epic, never
// asking the tracker to create one.
#[tokio::test]
async fn epic_driven_creation_never_touches_the_tracker() {
    let (plane, _dir, tracker, _clock, _spawner) = plane(HealthPolicy::default()).await;
    let mut request = create_request("tpl-review");
    request.spec.epic_id = Some(perles_core::EpicId::from_string("epc-already-exists"));

    plane.create(request).await.unwrap();

    assert!(tracker.created_epics().is_empty());
}

// §8(c): a subscriber filtering on a single workflow never sees another
// workflow's events.
#[tokio::test]
async fn subscriber_filter_isolates_workflows() {
    let (plane, _dir, _tracker, _clock, _spawner) = plane(HealthPolicy::default()).await;
    let id_a = plane.create(create_request("tpl-cook")).await.unwrap();
    let id_b = plane.create(create_request("tpl-cook")).await.unwrap();

    let mut sub = plane.subscribe(EventFilter { workflow_ids: vec![id_a.clone()], ..Default::default() });
    plane.start(&id_a).await.unwrap();
    plane.start(&id_b).await.unwrap();

    let event = sub.receiver.recv().await.unwrap();
    assert_eq!(event.workflow_id, id_a);
    assert!(sub.receiver.try_recv().is_err());
}

// §8(d): starting a workflow begins health tracking; stopping it ends it.
#[tokio::test]
async fn start_tracks_health_and_stop_untracks_it() {
    let (plane, _dir, _tracker, _clock, _spawner) = plane(HealthPolicy::default()).await;
    let id = plane.create(create_request("tpl-cook")).await.unwrap();

    plane.start(&id).await.unwrap();
    let status = plane.health_status(&id).unwrap();
    assert_eq!(status.status, perles_core::HealthStatus::Healthy);

    plane
        .stop(&id, StopRequest { reason: "done".to_string(), force: false, grace_period: Duration::from_secs(5) })
        .await
        .unwrap();
    assert!(plane.health_status(&id).is_none());
}

// §8(e): a workflow whose coordinator stops heartbeating and then stops
// progressing walks the recovery ladder: StuckSuspected, then Nudge up to
// `max_nudges`, then ReplaceCoordinator.
#[tokio::test]
async fn stuck_workflow_walks_the_recovery_ladder() {
    let policy = HealthPolicy {
        heartbeat_timeout: Duration::from_secs(3600),
        progress_timeout: Duration::from_secs(30),
        check_interval: Duration::from_secs(5),
        max_nudges: 2,
        ..HealthPolicy::default()
    };
    let (plane, _dir, _tracker, clock, _spawner) = plane(policy).await;
    let id = plane.create(create_request("tpl-cook")).await.unwrap();
    plane.start(&id).await.unwrap();

    let monitor = plane.health();

    // No progress yet; still within the timeout.
    monitor.check();
    assert_eq!(monitor.status(&id).unwrap().status, perles_core::HealthStatus::Healthy);

    // Advance past progress_timeout without a progress event.
    clock.advance(Duration::from_secs(31));
    let outcomes = monitor.check();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].1, perles_daemon::CheckOutcome::StuckSuspected);

    let outcomes = monitor.check();
    assert_eq!(
        outcomes[0].1,
        perles_daemon::CheckOutcome::RecoveryDecision(perles_core::RecoveryAction::Nudge)
    );

    let outcomes = monitor.check();
    assert_eq!(
        outcomes[0].1,
        perles_daemon::CheckOutcome::RecoveryDecision(perles_core::RecoveryAction::Nudge)
    );

    let outcomes = monitor.check();
    assert_eq!(
        outcomes[0].1,
        perles_daemon::CheckOutcome::RecoveryDecision(perles_core::RecoveryAction::ReplaceCoordinator)
    );
}

// A `GitExecutor` collaborator rejects malformed branch names without
// touching the filesystem (grounds §4.9's "degrade, don't crash" rule).
#[tokio::test]
async fn git_executor_fake_rejects_malformed_branch_names() {
    let git = FakeGitExecutor::new();
    assert!(!git.validate_branch_name("has a space").await.unwrap());
    assert!(git.validate_branch_name("feature/ok-name").await.unwrap());
}

// §4.1 coordinator-exit failure policy: a `workflow-complete` exit reason
// moves the workflow to `completed`; any other exit reason moves it to
// `failed`. Drives the coordinator's own event stream with the fake
// spawner rather than asserting on `Stop`, since this path only fires when
// the child exits on its own.
#[tokio::test]
async fn coordinator_workflow_complete_exit_reaches_completed() {
    let (plane, _dir, _tracker, _clock, spawner) = plane(HealthPolicy::default()).await;
    let mut sub = plane.subscribe(EventFilter::default());

    let id = plane.create(create_request("tpl-cook")).await.unwrap();
    plane.start(&id).await.unwrap();

    let recorded = spawner.spawns().into_iter().find(|s| s.request.workflow_id == id).unwrap();
    let handle = perles_supervisor::ProcessHandle { process_id: recorded.process_id, role: recorded.request.role };

    let line = r#"{"process_id":"proc-x","role":"coordinator","type":"workflow-complete","timestamp":"2026-01-01T00:00:00Z"}"#;
    assert!(spawner.push_line(&handle, &id, line).await);

    spawner.set_exit_reason(handle.process_id.clone(), perles_supervisor::ExitReason::WorkflowComplete);
    spawner.close(&handle);

    // created, started, process-relayed workflow-complete, lifecycle completed
    let created = sub.receiver.recv().await.unwrap();
    let started = sub.receiver.recv().await.unwrap();
    let relayed = sub.receiver.recv().await.unwrap();
    assert_eq!(created.event_type, EventType::WorkflowCreated);
    assert_eq!(started.event_type, EventType::WorkflowStarted);
    assert_eq!(relayed.event_type, EventType::WorkflowCompleted);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if plane.get(&id).unwrap().state == WorkflowState::Completed {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "workflow never reached completed");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(plane.health_status(&id).is_none());
}

// The same coordinator-exit path, but the child exits without having
// emitted workflow-complete: the workflow fails instead.
#[tokio::test]
async fn coordinator_exit_without_workflow_complete_reaches_failed() {
    let (plane, _dir, _tracker, _clock, spawner) = plane(HealthPolicy::default()).await;
    let id = plane.create(create_request("tpl-cook")).await.unwrap();
    plane.start(&id).await.unwrap();

    let recorded = spawner.spawns().into_iter().find(|s| s.request.workflow_id == id).unwrap();
    let handle = perles_supervisor::ProcessHandle { process_id: recorded.process_id, role: recorded.request.role };

    spawner.set_exit_reason(handle.process_id.clone(), perles_supervisor::ExitReason::Exited { code: 1 });
    spawner.close(&handle);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if plane.get(&id).unwrap().state == WorkflowState::Failed {
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "workflow never reached failed");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
