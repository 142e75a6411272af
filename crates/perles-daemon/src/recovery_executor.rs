// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recovery Executor (§4.7): pure dispatch from a `RecoveryAction` decision
//! to the coordinator driver / worker pool. Every action is idempotent
//! enough that an immediately repeated call does not corrupt state.

use std::sync::Arc;

use perles_core::{RecoveryAction, WorkflowId};
use perles_supervisor::coordinator_driver::CoordinatorDriver;
use perles_supervisor::worker_pool::WorkerPool;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecoveryError {
    #[error("no coordinator driver registered for workflow {0}")]
    NoCoordinator(WorkflowId),
    #[error("handoff could not be requested: a replacement is already pending")]
    AlreadyPending,
}

/// One recovery attempt's outcome, used to drive `recovery-started` /
/// `-succeeded` / `-failed` events and the matching workflow-state
/// transition at the Control Plane layer.
#[derive(Debug, Clone, PartialEq)]
pub enum RecoveryOutcome {
    Nudged,
    ReplacementRequested,
    /// Ladder exhausted below replacement; caller should suspend new work
    /// assignment (transition to `paused`) without killing processes.
    Paused,
    /// Ladder exhausted entirely; caller should retire workers and
    /// transition to `failed`.
    Failed { retired_workers: usize },
}

pub struct RecoveryExecutor;

impl RecoveryExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Dispatches one decision onto the coordinator driver / worker pool.
    /// Never touches the store or broker (§9 domain/infrastructure split) —
    /// the caller turns the returned outcome into a persisted state
    /// transition and the matching `recovery-*` events.
    pub fn execute(
        &self,
        action: &RecoveryAction,
        coordinator: &Arc<parking_lot::Mutex<CoordinatorDriver>>,
        pool: &WorkerPool,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<RecoveryOutcome, RecoveryError> {
        match action {
            RecoveryAction::Nudge => Ok(RecoveryOutcome::Nudged),
            RecoveryAction::ReplaceCoordinator => {
                let mut driver = coordinator.lock();
                driver.request_refresh(now, std::time::Duration::from_secs(300));
                Ok(RecoveryOutcome::ReplacementRequested)
            }
            RecoveryAction::Pause => Ok(RecoveryOutcome::Paused),
            RecoveryAction::Fail => {
                let mut retired = 0;
                for worker in pool.list() {
                    if pool.mark_draining(&worker.id).is_ok() && pool.remove(&worker.id).is_ok() {
                        retired += 1;
                    }
                }
                Ok(RecoveryOutcome::Failed { retired_workers: retired })
            }
        }
    }
}

impl Default for RecoveryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "recovery_executor_tests.rs"]
mod tests;
