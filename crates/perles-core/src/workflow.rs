// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow identity, specification, and state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_id!(
    /// Opaque identity for a workflow. Globally unique within one host
    /// install and stable across restarts.
    pub struct WorkflowId("wf-")
);

crate::define_id!(
    /// Identity of a registered coordinator/worker template.
    pub struct TemplateId("tpl-")
);

crate::define_id!(
    /// Identity of an epic in the external issue tracker.
    pub struct EpicId("epc-")
);

/// How a workflow's working directory is provisioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WorktreeMode {
    /// Run in the host's current working directory.
    None,
    /// Create a new git worktree from `base_branch`, naming it `branch_name`.
    New { base_branch: String, branch_name: String },
    /// Attach to an already-existing worktree path.
    Existing { path: String },
}

/// Inbound request to create a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSpec {
    pub template_id: TemplateId,
    pub name: Option<String>,
    pub epic_id: Option<EpicId>,
    pub initial_prompt: String,
    #[serde(default = "WorktreeMode::default_none")]
    pub worktree_mode: WorktreeMode,
}

impl WorktreeMode {
    fn default_none() -> Self {
        WorktreeMode::None
    }
}

impl WorkflowSpec {
    /// Validate the spec per §7 (Validation errors are surfaced unchanged).
    pub fn validate(&self) -> Result<(), crate::error::ValidationError> {
        if self.initial_prompt.trim().is_empty() {
            return Err(crate::error::ValidationError::MissingRequiredArgument {
                field: "initial_prompt".into(),
            });
        }
        if let WorktreeMode::New { base_branch, branch_name } = &self.worktree_mode {
            if base_branch.trim().is_empty() || branch_name.trim().is_empty() {
                return Err(crate::error::ValidationError::InvalidBranchName {
                    name: branch_name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Workflow lifecycle state (§4.1).
///
/// Transitions: `pending -> running -> {paused, completed, failed,
/// timed_out, stopped}`; `paused -> running`. The terminal states have no
/// outbound transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
    TimedOut,
    Stopped,
}

crate::simple_display!(WorkflowState {
    Pending => "pending",
    Running => "running",
    Paused => "paused",
    Completed => "completed",
    Failed => "failed",
    TimedOut => "timed_out",
    Stopped => "stopped",
});

impl WorkflowState {
    /// Whether this state has no outbound transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::TimedOut | Self::Stopped)
    }

    /// Whether `Start` may be called from this state.
    pub fn can_start(self) -> bool {
        matches!(self, Self::Pending | Self::Paused)
    }

    /// Whether `Pause` may be called from this state.
    pub fn can_pause(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Whether `Resume` may be called from this state.
    pub fn can_resume(self) -> bool {
        matches!(self, Self::Paused)
    }
}

/// Lifecycle timestamps recorded as a workflow transitions through states.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowTimestamps {
    pub created_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// The durable-projection-independent fields of a workflow, i.e. everything
/// about a `WorkflowInstance` that is not a live process handle. Kept as a
/// plain value type so it can be persisted, compared, and cloned freely
/// (per §9: "domain entities... plain value types with pure methods").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDescriptor {
    pub id: WorkflowId,
    pub template_id: TemplateId,
    pub name: Option<String>,
    pub epic_id: Option<EpicId>,
    pub state: WorkflowState,
    pub mcp_port: Option<u16>,
    pub worktree_path: Option<String>,
    pub initial_goal: String,
    pub timestamps: WorkflowTimestamps,
}

impl WorkflowDescriptor {
    pub fn new(id: WorkflowId, spec: &WorkflowSpec, now: DateTime<Utc>) -> Self {
        Self {
            id,
            template_id: spec.template_id.clone(),
            name: spec.name.clone(),
            epic_id: spec.epic_id.clone(),
            state: WorkflowState::Pending,
            mcp_port: None,
            worktree_path: None,
            initial_goal: spec.initial_prompt.clone(),
            timestamps: WorkflowTimestamps { created_at: Some(now), updated_at: Some(now), ..Default::default() },
        }
    }

    /// Attempt a state transition, stamping the relevant timestamp.
    ///
    /// Returns the prior state so callers can roll back on a downstream
    /// store-write failure (§4.1: "the core never reports a state change it
    /// did not durably persist").
    pub fn transition(&mut self, to: WorkflowState, now: DateTime<Utc>) -> Result<WorkflowState, TransitionError> {
        if self.state.is_terminal() {
            return Err(TransitionError { from: self.state, to });
        }
        let legal = match (self.state, to) {
            (WorkflowState::Pending, WorkflowState::Running) => true,
            (WorkflowState::Pending, WorkflowState::Failed) => true,
            (WorkflowState::Running, WorkflowState::Paused) => true,
            (WorkflowState::Running, WorkflowState::Completed) => true,
            (WorkflowState::Running, WorkflowState::Failed) => true,
            (WorkflowState::Running, WorkflowState::TimedOut) => true,
            (WorkflowState::Running, WorkflowState::Stopped) => true,
            (WorkflowState::Paused, WorkflowState::Running) => true,
            (WorkflowState::Paused, WorkflowState::Stopped) => true,
            (from, t) if from == t => true,
            _ => false,
        };
        if !legal {
            return Err(TransitionError { from: self.state, to });
        }
        let prior = self.state;
        self.state = to;
        self.timestamps.updated_at = Some(now);
        match to {
            WorkflowState::Running if prior == WorkflowState::Pending => self.timestamps.started_at = Some(now),
            WorkflowState::Paused => self.timestamps.paused_at = Some(now),
            WorkflowState::Completed => self.timestamps.completed_at = Some(now),
            _ => {}
        }
        Ok(prior)
    }
}

#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("illegal transition from {from} to {to}")]
pub struct TransitionError {
    pub from: WorkflowState,
    pub to: WorkflowState,
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
