use std::time::Duration;

use perles_core::FakeClock;

use super::*;

fn policy() -> HealthPolicy {
    HealthPolicy {
        heartbeat_timeout: Duration::from_secs(10),
        progress_timeout: Duration::from_secs(30),
        check_interval: Duration::from_secs(5),
        max_nudges: 2,
        max_recoveries: 3,
        recovery_backoff: Duration::from_secs(20),
        auto_nudge: true,
        auto_replace: true,
        auto_pause: true,
        auto_fail: true,
    }
}

#[test]
fn newly_tracked_workflow_is_healthy() {
    let clock = FakeClock::new();
    let monitor = HealthMonitor::new(clock, policy());
    let id = WorkflowId::new();
    monitor.track(id.clone());
    assert_eq!(monitor.status(&id).unwrap().status, HealthStatus::Healthy);
}

#[test]
fn heartbeat_timeout_elapses_into_heartbeat_missed() {
    let clock = FakeClock::new();
    let monitor = HealthMonitor::new(clock.clone(), policy());
    let id = WorkflowId::new();
    monitor.track(id.clone());
    clock.advance(Duration::from_secs(11));
    let outcomes = monitor.check();
    assert_eq!(outcomes[0].1, CheckOutcome::HeartbeatMissed);
}

#[test]
fn record_progress_resets_recovery_count() {
    let clock = FakeClock::new();
    let monitor = HealthMonitor::new(clock.clone(), policy());
    let id = WorkflowId::new();
    monitor.track(id.clone());
    clock.advance(Duration::from_secs(31));
    monitor.check();
    monitor.check();
    assert!(monitor.status(&id).unwrap().recovery_count > 0);
    monitor.record_progress(&id);
    assert_eq!(monitor.status(&id).unwrap().recovery_count, 0);
}

#[test]
fn stuck_workflow_first_reports_suspected_then_nudges() {
    let clock = FakeClock::new();
    let monitor = HealthMonitor::new(clock.clone(), policy());
    let id = WorkflowId::new();
    monitor.track(id.clone());
    clock.advance(Duration::from_secs(31));

    let first = monitor.check();
    assert_eq!(first[0].1, CheckOutcome::StuckSuspected);

    let second = monitor.check();
    assert_eq!(second[0].1, CheckOutcome::RecoveryDecision(RecoveryAction::Nudge));
}

#[test]
fn exhausted_nudges_escalate_to_replace_coordinator() {
    let clock = FakeClock::new();
    let monitor = HealthMonitor::new(clock.clone(), policy());
    let id = WorkflowId::new();
    monitor.track(id.clone());
    clock.advance(Duration::from_secs(31));

    monitor.check();
    monitor.check();
    monitor.check();
    let escalated = monitor.check();
    assert_eq!(
        escalated[0].1,
        CheckOutcome::RecoveryDecision(RecoveryAction::ReplaceCoordinator)
    );
}

#[test]
fn untrack_removes_workflow_from_future_checks() {
    let clock = FakeClock::new();
    let monitor = HealthMonitor::new(clock, policy());
    let id = WorkflowId::new();
    monitor.track(id.clone());
    monitor.untrack(&id);
    assert!(!monitor.is_tracked(&id));
    assert!(monitor.check().is_empty());
}
