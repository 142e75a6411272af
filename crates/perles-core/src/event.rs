// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ControlPlaneEvent`: the envelope published on the broker (§3, §4.5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::process::{ProcessEventType, ProcessId};
use crate::workflow::{TemplateId, WorkflowId, WorkflowState};

/// Discriminant for `ControlPlaneEvent`, covering both workflow-lifecycle
/// events the Control Plane originates and the process events it relays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    WorkflowCreated,
    WorkflowStarted,
    WorkflowPaused,
    WorkflowResumed,
    WorkflowStopped,
    WorkflowCompleted,
    WorkflowFailed,
    ProcessSpawned,
    ProcessOutput,
    ProcessStatusChange,
    ProcessReady,
    ProcessWorking,
    ProcessTokenUsage,
    ProcessIncoming,
    ProcessError,
    ProcessUserNotification,
    ProcessHandoff,
    HealthHeartbeatMissed,
    HealthStuckSuspected,
    HealthRecoveryStarted,
    HealthRecoverySucceeded,
    HealthRecoveryFailed,
    HealthStillStuck,
    Unknown,
}

impl EventType {
    /// Events the broker may silently drop when a subscriber's channel is
    /// full (§4.5.1). Everything else is "critical" and uses the
    /// best-effort-then-drop send path instead of an unconditional
    /// try-send.
    pub fn is_droppable(self) -> bool {
        matches!(self, EventType::ProcessOutput | EventType::ProcessTokenUsage)
    }

    /// Map a child-process event type to its `ControlPlaneEvent` counterpart.
    pub fn from_process_event_type(t: &ProcessEventType) -> Self {
        match t {
            ProcessEventType::Spawned => EventType::ProcessSpawned,
            ProcessEventType::Output => EventType::ProcessOutput,
            ProcessEventType::StatusChange => EventType::ProcessStatusChange,
            ProcessEventType::Ready => EventType::ProcessReady,
            ProcessEventType::Working => EventType::ProcessWorking,
            ProcessEventType::TokenUsage => EventType::ProcessTokenUsage,
            ProcessEventType::Incoming => EventType::ProcessIncoming,
            ProcessEventType::Error => EventType::ProcessError,
            ProcessEventType::UserNotification => EventType::ProcessUserNotification,
            ProcessEventType::WorkflowComplete => EventType::WorkflowCompleted,
            ProcessEventType::Handoff => EventType::ProcessHandoff,
            ProcessEventType::Unknown(_) => EventType::Unknown,
        }
    }
}

/// The envelope published to broker subscribers (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlPlaneEvent {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    pub workflow_id: WorkflowId,
    pub template_id: Option<TemplateId>,
    pub name: Option<String>,
    pub state: Option<WorkflowState>,
    pub process_id: Option<ProcessId>,
    pub task_id: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

impl ControlPlaneEvent {
    pub fn lifecycle(
        event_type: EventType,
        workflow_id: WorkflowId,
        template_id: TemplateId,
        name: Option<String>,
        state: WorkflowState,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            event_type,
            timestamp: now,
            workflow_id,
            template_id: Some(template_id),
            name,
            state: Some(state),
            process_id: None,
            task_id: None,
            payload: Value::Null,
        }
    }

    /// A child-process event relayed onto the broker (§4.1, §4.5).
    pub fn process(
        event_type: EventType,
        workflow_id: WorkflowId,
        process_id: ProcessId,
        payload: Value,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            event_type,
            timestamp: now,
            workflow_id,
            template_id: None,
            name: None,
            state: None,
            process_id: Some(process_id),
            task_id: None,
            payload,
        }
    }

    /// A Health Monitor status-change notice (§4.6).
    pub fn health(event_type: EventType, workflow_id: WorkflowId, now: DateTime<Utc>) -> Self {
        Self {
            event_type,
            timestamp: now,
            workflow_id,
            template_id: None,
            name: None,
            state: None,
            process_id: None,
            task_id: None,
            payload: Value::Null,
        }
    }
}

/// Subscriber filter (§4.5): AND of include-types, include-workflows, with
/// exclude-types applied after the include check.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub types: Vec<EventType>,
    pub workflow_ids: Vec<WorkflowId>,
    pub exclude_types: Vec<EventType>,
}

impl EventFilter {
    pub fn matches(&self, event: &ControlPlaneEvent) -> bool {
        if !self.types.is_empty() && !self.types.contains(&event.event_type) {
            return false;
        }
        if !self.workflow_ids.is_empty() && !self.workflow_ids.contains(&event.workflow_id) {
            return false;
        }
        if self.exclude_types.contains(&event.event_type) {
            return false;
        }
        true
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
