// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator Driver & Context-Refresh Protocol (§4.4), modeled as an
//! explicit state machine rather than a hidden coroutine (§9 design note).

use std::time::Duration;

use chrono::{DateTime, Utc};
use perles_core::{ProcessId, Registration};

/// Where a workflow's context-refresh protocol currently stands (§4.4,
/// §4.4.1). Unlike a bare `pendingRefresh: bool`, this also carries the
/// deadline so the driver's check loop can detect a stuck refresh without a
/// separate timer map.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshState {
    /// No refresh in flight; a request may start one.
    Idle,
    /// A handoff request has been posted; waiting for the coordinator's
    /// handoff-typed response, or the deadline.
    AwaitingHandoff { deadline: DateTime<Utc> },
    /// A handoff summary (real or synthetic fallback) has been accepted;
    /// the old coordinator is being retired and a new one spawned.
    Replacing,
}

/// Default bound on how long a refresh may wait for a coordinator's handoff
/// response before the driver falls back to a synthetic one (§9 Open
/// Question: "single-digit minutes is consistent with the other timeouts").
pub const DEFAULT_REFRESH_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq)]
pub enum HandoffOutcome {
    /// Refresh was already in flight; the new request is a no-op (§4.4 tie-break).
    AlreadyPending,
    /// A handoff request was posted and the driver is now awaiting a response.
    Requested { deadline: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum HandoffReceived {
    /// Message arrived while `pendingRefresh == false`: logged and
    /// delivered to subscribers, but does not trigger replacement (§4.4 tie-break).
    Unsolicited,
    /// Message accepted; driver should retire the current coordinator and
    /// spawn its replacement with this summary in the continuation prompt.
    AcceptedForReplacement { summary: String },
}

/// One driver instance per workflow; owns the refresh protocol's state
/// transitions. Actually retiring/spawning the coordinator process is the
/// caller's job (this type has no I/O) — kept pure per §9's
/// domain/infrastructure split.
#[derive(Debug)]
pub struct CoordinatorDriver {
    pub coordinator_id: ProcessId,
    pub registration: Registration,
    refresh: RefreshState,
}

impl CoordinatorDriver {
    pub fn new(coordinator_id: ProcessId, registration: Registration) -> Self {
        Self { coordinator_id, registration, refresh: RefreshState::Idle }
    }

    pub fn refresh_state(&self) -> &RefreshState {
        &self.refresh
    }

    /// Step 1-2: request a context refresh. A request while one is already
    /// pending is idempotent (§4.4).
    pub fn request_refresh(&mut self, now: DateTime<Utc>, timeout: Duration) -> HandoffOutcome {
        if !matches!(self.refresh, RefreshState::Idle) {
            return HandoffOutcome::AlreadyPending;
        }
        let deadline = now + chrono::Duration::from_std(timeout).unwrap_or_else(|_| chrono::Duration::zero());
        self.refresh = RefreshState::AwaitingHandoff { deadline };
        HandoffOutcome::Requested { deadline }
    }

    /// Step 3-4: a handoff-typed message arrived from the coordinator.
    pub fn receive_handoff(&mut self, summary: String) -> HandoffReceived {
        match &self.refresh {
            RefreshState::AwaitingHandoff { .. } => {
                self.refresh = RefreshState::Replacing;
                HandoffReceived::AcceptedForReplacement { summary }
            }
            RefreshState::Idle | RefreshState::Replacing => HandoffReceived::Unsolicited,
        }
    }

    /// Step 5: the refresh timeout fired while still awaiting a handoff.
    /// Returns the synthetic fallback summary to use, or `None` if the
    /// refresh already resolved (handoff arrived, or no refresh pending).
    pub fn handle_timeout(&mut self, now: DateTime<Utc>) -> Option<String> {
        match &self.refresh {
            RefreshState::AwaitingHandoff { deadline } if now >= *deadline => {
                self.refresh = RefreshState::Replacing;
                Some("no coordinator response".to_string())
            }
            _ => None,
        }
    }

    /// Step 4c / end of replacement: clears `pendingRefresh`, ready for the
    /// next request.
    pub fn finish_replacement(&mut self, new_coordinator_id: ProcessId) {
        self.coordinator_id = new_coordinator_id;
        self.refresh = RefreshState::Idle;
    }
}

#[cfg(test)]
#[path = "coordinator_driver_tests.rs"]
mod tests;
