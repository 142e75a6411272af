use chrono::Utc;
use parking_lot::Mutex;
use perles_core::{Namespace, ProcessId, Registration, TemplateId};
use perles_supervisor::coordinator_driver::RefreshState;
use perles_supervisor::worker_pool::WorkerPool;

use super::*;

fn registration() -> Registration {
    Registration {
        template_id: TemplateId::from_string("tpl-cook"),
        namespace: Namespace::Workflow,
        display_name: "Cook".to_string(),
        prompt_body: "go".to_string(),
        required_args: vec![],
    }
}

fn coordinator() -> Arc<Mutex<CoordinatorDriver>> {
    Arc::new(Mutex::new(CoordinatorDriver::new(ProcessId::new(), registration())))
}

#[test]
fn nudge_is_a_no_op_on_the_coordinator_state() {
    let executor = RecoveryExecutor::new();
    let coordinator = coordinator();
    let pool = WorkerPool::new("wf-1");
    let outcome = executor
        .execute(&RecoveryAction::Nudge, &coordinator, &pool, Utc::now())
        .unwrap();
    assert_eq!(outcome, RecoveryOutcome::Nudged);
    assert!(matches!(coordinator.lock().refresh_state(), RefreshState::Idle));
}

#[test]
fn replace_coordinator_requests_a_handoff() {
    let executor = RecoveryExecutor::new();
    let coordinator = coordinator();
    let pool = WorkerPool::new("wf-1");
    let outcome = executor
        .execute(&RecoveryAction::ReplaceCoordinator, &coordinator, &pool, Utc::now())
        .unwrap();
    assert_eq!(outcome, RecoveryOutcome::ReplacementRequested);
    assert!(matches!(
        coordinator.lock().refresh_state(),
        RefreshState::AwaitingHandoff { .. }
    ));
}

#[test]
fn repeated_replace_coordinator_calls_stay_idempotent() {
    let executor = RecoveryExecutor::new();
    let coordinator = coordinator();
    let pool = WorkerPool::new("wf-1");
    executor
        .execute(&RecoveryAction::ReplaceCoordinator, &coordinator, &pool, Utc::now())
        .unwrap();
    let second = executor
        .execute(&RecoveryAction::ReplaceCoordinator, &coordinator, &pool, Utc::now())
        .unwrap();
    assert_eq!(second, RecoveryOutcome::ReplacementRequested);
}

#[test]
fn pause_leaves_workers_and_coordinator_state_untouched() {
    let executor = RecoveryExecutor::new();
    let coordinator = coordinator();
    let pool = WorkerPool::new("wf-1");
    let worker = pool.spawn("reviewer");
    let outcome = executor.execute(&RecoveryAction::Pause, &coordinator, &pool, Utc::now()).unwrap();
    assert_eq!(outcome, RecoveryOutcome::Paused);
    assert!(matches!(coordinator.lock().refresh_state(), RefreshState::Idle));
    assert!(pool.get(&worker).is_some());
}

#[test]
fn fail_retires_every_worker_in_the_pool() {
    let executor = RecoveryExecutor::new();
    let coordinator = coordinator();
    let pool = WorkerPool::new("wf-1");
    let a = pool.spawn("reviewer");
    let b = pool.spawn("implementer");
    let outcome = executor.execute(&RecoveryAction::Fail, &coordinator, &pool, Utc::now()).unwrap();
    assert_eq!(outcome, RecoveryOutcome::Failed { retired_workers: 2 });
    assert!(pool.get(&a).is_none());
    assert!(pool.get(&b).is_none());
}
