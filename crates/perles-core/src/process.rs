// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ProcessEvent`: the parsed form of a line a coordinator or worker child
//! writes to stdout (§3, §6.2).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::workflow::WorkflowId;

crate::define_id!(
    /// Identity of a coordinator or worker child process, stable for its
    /// lifetime even across a handoff replacement (the new coordinator gets
    /// a new id; the workflow does not).
    pub struct ProcessId("proc-")
);

crate::define_id!(
    /// Identity of a worker within a workflow's pool. Never reused once
    /// retired (§3 invariant 3).
    pub struct WorkerId("wkr-")
);

/// Which kind of child process emitted an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessRole {
    Coordinator,
    Worker,
}

crate::simple_display!(ProcessRole {
    Coordinator => "coordinator",
    Worker => "worker",
});

/// The `type` field of a child-process wire line (§6.2).
///
/// Unknown `type` values pass through as `Unknown(original)` rather than
/// failing to parse the line (§6.2: "Unknown type values are passed through
/// as EventUnknown").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEventType {
    Spawned,
    Output,
    StatusChange,
    Ready,
    Working,
    TokenUsage,
    Incoming,
    Error,
    UserNotification,
    WorkflowComplete,
    Handoff,
    Unknown(String),
}

impl ProcessEventType {
    /// Whether the supervisor's bounded per-child channel may drop this
    /// event under backpressure (§4.2: only `output` is droppable there;
    /// the broker's separate droppable set, §4.5.1, also includes
    /// `token-usage`).
    pub fn is_droppable_under_process_backpressure(&self) -> bool {
        matches!(self, ProcessEventType::Output)
    }

    fn as_wire_str(&self) -> &str {
        match self {
            Self::Spawned => "spawned",
            Self::Output => "output",
            Self::StatusChange => "status-change",
            Self::Ready => "ready",
            Self::Working => "working",
            Self::TokenUsage => "token-usage",
            Self::Incoming => "incoming",
            Self::Error => "error",
            Self::UserNotification => "user-notification",
            Self::WorkflowComplete => "workflow-complete",
            Self::Handoff => "handoff",
            Self::Unknown(raw) => raw,
        }
    }

    fn from_wire_str(s: &str) -> Self {
        match s {
            "spawned" => Self::Spawned,
            "output" => Self::Output,
            "status-change" => Self::StatusChange,
            "ready" => Self::Ready,
            "working" => Self::Working,
            "token-usage" => Self::TokenUsage,
            "incoming" => Self::Incoming,
            "error" => Self::Error,
            "user-notification" => Self::UserNotification,
            "workflow-complete" => Self::WorkflowComplete,
            "handoff" => Self::Handoff,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl Serialize for ProcessEventType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_wire_str())
    }
}

impl<'de> Deserialize<'de> for ProcessEventType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_wire_str(&s))
    }
}

/// A parsed line from a child process's stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessEvent {
    pub process_id: ProcessId,
    pub role: ProcessRole,
    #[serde(rename = "type")]
    pub event_type: ProcessEventType,
    pub status: Option<String>,
    pub phase: Option<String>,
    #[serde(default = "default_payload")]
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

fn default_payload() -> Value {
    Value::Null
}

impl ProcessEvent {
    /// Classify this event as evidence of forward movement for the Health
    /// Monitor (§4.6, glossary "Progress event"): a phase transition, or a
    /// status change to `working`/`ready`, or workflow-complete.
    pub fn is_progress(&self) -> bool {
        match &self.event_type {
            ProcessEventType::WorkflowComplete => true,
            ProcessEventType::Ready | ProcessEventType::Working => true,
            ProcessEventType::StatusChange => {
                matches!(self.status.as_deref(), Some("working") | Some("ready"))
            }
            _ => self.phase.is_some(),
        }
    }
}

/// Context a `ProcessEvent` is observed under — which workflow it belongs
/// to, attached by the Process Supervisor before handing the event to the
/// Control Plane.
#[derive(Debug, Clone)]
pub struct ScopedProcessEvent {
    pub workflow_id: WorkflowId,
    pub event: ProcessEvent,
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
