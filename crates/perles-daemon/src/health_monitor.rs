// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health Monitor (§4.6): two cooperating loops over a shared per-workflow
//! status map — event-ingest (`record_heartbeat`/`record_progress`) and a
//! periodic check that classifies health and decides recovery actions.
//! The status-map lock is never held while calling outward (§9 design
//! note): callers take a snapshot, drop the lock, then act.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use perles_core::{Clock, HealthPolicy, HealthStatus, RecoveryAction, WorkflowId};

#[derive(Debug, Clone)]
struct TrackedWorkflow {
    status: HealthStatus,
    last_heartbeat_at: DateTime<Utc>,
    last_progress_at: DateTime<Utc>,
    recovery_count: u32,
    last_recovery_at: Option<DateTime<Utc>>,
    last_still_stuck_at: Option<DateTime<Utc>>,
}

/// Point-in-time view of a tracked workflow's health, returned from `status`.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthStatusView {
    pub status: HealthStatus,
    pub last_heartbeat_at: DateTime<Utc>,
    pub last_progress_at: DateTime<Utc>,
    pub recovery_count: u32,
}

/// What the check loop decided for one workflow on a given pass.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    Healthy,
    HeartbeatMissed,
    StuckSuspected,
    RecoveryDecision(RecoveryAction),
    /// Every ladder rung exhausted or disabled; emits `still-stuck`.
    StillStuck,
    /// A `StillStuck` was already emitted within `RecoveryBackoff`; suppressed.
    StillStuckRateLimited,
}

pub struct HealthMonitor<C: Clock> {
    clock: C,
    policy: HealthPolicy,
    tracked: Arc<RwLock<HashMap<WorkflowId, TrackedWorkflow>>>,
}

impl<C: Clock> HealthMonitor<C> {
    pub fn new(clock: C, policy: HealthPolicy) -> Self {
        Self {
            clock,
            policy,
            tracked: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Begin tracking a workflow that has just moved to `running`.
    pub fn track(&self, workflow_id: WorkflowId) {
        let now = self.clock.utc_now();
        self.tracked.write().insert(
            workflow_id,
            TrackedWorkflow {
                status: HealthStatus::Healthy,
                last_heartbeat_at: now,
                last_progress_at: now,
                recovery_count: 0,
                last_recovery_at: None,
                last_still_stuck_at: None,
            },
        );
    }

    /// Stop tracking, e.g. on workflow-complete or explicit `Untrack`.
    pub fn untrack(&self, workflow_id: &WorkflowId) {
        self.tracked.write().remove(workflow_id);
    }

    pub fn is_tracked(&self, workflow_id: &WorkflowId) -> bool {
        self.tracked.read().contains_key(workflow_id)
    }

    pub fn status(&self, workflow_id: &WorkflowId) -> Option<HealthStatusView> {
        self.tracked.read().get(workflow_id).map(|w| HealthStatusView {
            status: w.status,
            last_heartbeat_at: w.last_heartbeat_at,
            last_progress_at: w.last_progress_at,
            recovery_count: w.recovery_count,
        })
    }

    /// Any event carrying a `WorkflowID` counts as a heartbeat.
    pub fn record_heartbeat(&self, workflow_id: &WorkflowId) {
        let now = self.clock.utc_now();
        if let Some(w) = self.tracked.write().get_mut(workflow_id) {
            w.last_heartbeat_at = now;
        }
    }

    /// A progress-classified event resets `recovery_count` (invariant 4, §8).
    pub fn record_progress(&self, workflow_id: &WorkflowId) {
        let now = self.clock.utc_now();
        if let Some(w) = self.tracked.write().get_mut(workflow_id) {
            w.last_heartbeat_at = now;
            w.last_progress_at = now;
            w.recovery_count = 0;
        }
    }

    /// Run one pass of the check loop over every tracked workflow, returning
    /// the decision made for each so the caller can dispatch to the Recovery
    /// Executor without holding the status-map lock while it does.
    pub fn check(&self) -> Vec<(WorkflowId, CheckOutcome)> {
        let now = self.clock.utc_now();
        let snapshot: Vec<(WorkflowId, TrackedWorkflow)> = self
            .tracked
            .read()
            .iter()
            .map(|(id, w)| (id.clone(), w.clone()))
            .collect();

        let mut outcomes = Vec::with_capacity(snapshot.len());
        for (workflow_id, workflow) in snapshot {
            let outcome = self.classify(&workflow, now);
            self.apply(&workflow_id, &outcome, now);
            outcomes.push((workflow_id, outcome));
        }
        outcomes
    }

    fn classify(&self, workflow: &TrackedWorkflow, now: DateTime<Utc>) -> CheckOutcome {
        let heartbeat_elapsed = (now - workflow.last_heartbeat_at)
            .to_std()
            .unwrap_or_default();
        if workflow.status == HealthStatus::Healthy && heartbeat_elapsed > self.policy.heartbeat_timeout {
            return CheckOutcome::HeartbeatMissed;
        }

        let progress_elapsed = (now - workflow.last_progress_at).to_std().unwrap_or_default();
        if progress_elapsed <= self.policy.progress_timeout {
            return CheckOutcome::Healthy;
        }

        if workflow.recovery_count == 0 && workflow.status != HealthStatus::StuckSuspected {
            return CheckOutcome::StuckSuspected;
        }

        self.determine_recovery_action(workflow, now)
    }

    /// §4.6 recovery decision ladder.
    fn determine_recovery_action(&self, workflow: &TrackedWorkflow, now: DateTime<Utc>) -> CheckOutcome {
        if workflow.recovery_count < self.policy.max_nudges && self.policy.auto_nudge {
            return CheckOutcome::RecoveryDecision(RecoveryAction::Nudge);
        }
        if workflow.recovery_count >= self.policy.max_nudges && self.policy.auto_replace {
            return CheckOutcome::RecoveryDecision(RecoveryAction::ReplaceCoordinator);
        }
        if self.policy.auto_pause {
            return CheckOutcome::RecoveryDecision(RecoveryAction::Pause);
        }
        if self.policy.auto_fail && workflow.recovery_count >= self.policy.max_recoveries {
            return CheckOutcome::RecoveryDecision(RecoveryAction::Fail);
        }
        let rate_limited = workflow
            .last_still_stuck_at
            .map(|last| (now - last).to_std().unwrap_or_default() < self.policy.recovery_backoff)
            .unwrap_or(false);
        if rate_limited {
            CheckOutcome::StillStuckRateLimited
        } else {
            CheckOutcome::StillStuck
        }
    }

    fn apply(&self, workflow_id: &WorkflowId, outcome: &CheckOutcome, now: DateTime<Utc>) {
        let mut tracked = self.tracked.write();
        let Some(w) = tracked.get_mut(workflow_id) else {
            return;
        };
        match outcome {
            CheckOutcome::Healthy => w.status = HealthStatus::Healthy,
            CheckOutcome::HeartbeatMissed => w.status = HealthStatus::HeartbeatMissed,
            CheckOutcome::StuckSuspected => w.status = HealthStatus::StuckSuspected,
            CheckOutcome::RecoveryDecision(_) => {
                w.status = HealthStatus::RecoveryInFlight;
                w.recovery_count += 1;
                w.last_recovery_at = Some(now);
            }
            CheckOutcome::StillStuck => {
                w.status = HealthStatus::StillStuck;
                w.last_still_stuck_at = Some(now);
            }
            // Already `still-stuck`; suppressed within `RecoveryBackoff` (§4.6
            // invariant: "two observations within one RecoveryBackoff emit at
            // most one still-stuck event").
            CheckOutcome::StillStuckRateLimited => {}
        }
    }
}

#[cfg(test)]
#[path = "health_monitor_tests.rs"]
mod tests;
