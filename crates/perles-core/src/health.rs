// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health Monitor domain types: heartbeat/progress timeouts and the
//! recovery decision ladder (§3, §4.6, §8).

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::process::ProcessId;
use crate::workflow::WorkflowId;

/// Per-workflow health classification the monitor assigns between checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    HeartbeatMissed,
    StuckSuspected,
    RecoveryInFlight,
    StillStuck,
}

crate::simple_display!(HealthStatus {
    Healthy => "healthy",
    HeartbeatMissed => "heartbeat-missed",
    StuckSuspected => "stuck-suspected",
    RecoveryInFlight => "recovery-in-flight",
    StillStuck => "still-stuck",
});

/// Timeout configuration for a single workflow's health checks (§4.6).
///
/// `heartbeat_timeout` fires when no event of any kind has been observed;
/// `progress_timeout` is the longer window allowed with heartbeats present
/// but no [`ProcessEvent::is_progress`](crate::process::ProcessEvent::is_progress) event.
/// `max_nudges`/`max_recoveries` and the `auto_*` toggles drive
/// `DetermineRecoveryAction`'s ladder (§4.6).
#[derive(Debug, Clone, Copy)]
pub struct HealthPolicy {
    pub heartbeat_timeout: Duration,
    pub progress_timeout: Duration,
    pub check_interval: Duration,
    pub max_nudges: u32,
    pub max_recoveries: u32,
    pub recovery_backoff: Duration,
    pub auto_nudge: bool,
    pub auto_replace: bool,
    pub auto_pause: bool,
    pub auto_fail: bool,
}

impl HealthPolicy {
    pub fn validate(&self) -> Result<(), crate::error::ValidationError> {
        if self.progress_timeout.is_zero() {
            return Err(crate::error::ValidationError::MalformedSpec(
                "progress_timeout must be greater than zero".into(),
            ));
        }
        if self.heartbeat_timeout.is_zero() {
            return Err(crate::error::ValidationError::MalformedSpec(
                "heartbeat_timeout must be greater than zero".into(),
            ));
        }
        if self.heartbeat_timeout >= self.progress_timeout {
            return Err(crate::error::ValidationError::MalformedSpec(
                "heartbeat_timeout must be shorter than progress_timeout".into(),
            ));
        }
        Ok(())
    }

    /// `RecoveryCount <= MaxRecoveries + 1` (invariant 5, §3).
    pub fn recovery_count_is_legal(&self, recovery_count: u32) -> bool {
        recovery_count <= self.max_recoveries + 1
    }
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            heartbeat_timeout: Duration::from_secs(60),
            progress_timeout: Duration::from_secs(300),
            check_interval: Duration::from_secs(15),
            max_nudges: 3,
            max_recoveries: 5,
            recovery_backoff: Duration::from_secs(60),
            auto_nudge: true,
            auto_replace: true,
            auto_pause: true,
            auto_fail: true,
        }
    }
}

/// A state-change notice the monitor publishes as it reclassifies a
/// workflow's health (§4.6).
#[derive(Debug, Clone)]
pub struct HealthEvent {
    pub workflow_id: WorkflowId,
    pub process_id: Option<ProcessId>,
    pub status: HealthStatus,
    pub last_event_at: Option<DateTime<Utc>>,
    pub last_progress_at: Option<DateTime<Utc>>,
    pub observed_at: DateTime<Utc>,
}

/// The action the Recovery Executor took or decided against (§4.7, §8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Nudge the coordinator with a status-request signal; no replacement.
    Nudge,
    /// Replace the coordinator process via the handoff protocol (§4.4).
    ReplaceCoordinator,
    /// Nudging and replacement are both exhausted or disabled; suspend new
    /// work assignment without killing processes.
    Pause,
    /// Recovery attempts exhausted; workflow marked `failed`, workers retired.
    Fail,
}

crate::simple_display!(RecoveryAction {
    Nudge => "nudge",
    ReplaceCoordinator => "replace-coordinator",
    Pause => "pause",
    Fail => "fail",
});

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
