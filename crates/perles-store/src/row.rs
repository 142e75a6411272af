// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `SessionRow`: the persisted shape of a [`perles_core::Session`].
//!
//! Kept separate from the domain type per §9 ("domain vs infrastructure"
//! split) so the domain crate never depends on sqlx.

use chrono::{DateTime, Utc};
use perles_core::{ProcessId, Session, SessionGuid, WorkflowId, WorkflowState};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub workflow_id: String,
    pub guid: String,
    pub project: String,
    pub work_dir: String,
    pub worktree_path: Option<String>,
    pub worktree_branch: Option<String>,
    pub state: String,
    pub creator_process_id: Option<String>,
    pub current_owner_process_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<&Session> for SessionRow {
    fn from(s: &Session) -> Self {
        Self {
            workflow_id: s.workflow_id.to_string(),
            guid: s.guid.to_string(),
            project: s.project.clone(),
            work_dir: s.work_dir.clone(),
            worktree_path: s.worktree_path.clone(),
            worktree_branch: s.worktree_branch.clone(),
            state: state_to_wire(s.state).to_string(),
            creator_process_id: s.creator_process_id.as_ref().map(ToString::to_string),
            current_owner_process_id: s.current_owner_process_id.as_ref().map(ToString::to_string),
            created_at: s.created_at,
            started_at: s.started_at,
            paused_at: s.paused_at,
            updated_at: s.updated_at,
            archived_at: s.archived_at,
            deleted_at: s.deleted_at,
        }
    }
}

impl TryFrom<SessionRow> for Session {
    type Error = crate::error::StoreError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(Session {
            workflow_id: WorkflowId::from_string(row.workflow_id),
            guid: SessionGuid::from_string(row.guid),
            project: row.project,
            work_dir: row.work_dir,
            worktree_path: row.worktree_path,
            worktree_branch: row.worktree_branch,
            state: state_from_wire(&row.state),
            creator_process_id: row.creator_process_id.map(ProcessId::from_string),
            current_owner_process_id: row.current_owner_process_id.map(ProcessId::from_string),
            created_at: row.created_at,
            started_at: row.started_at,
            paused_at: row.paused_at,
            updated_at: row.updated_at,
            archived_at: row.archived_at,
            deleted_at: row.deleted_at,
        })
    }
}

pub(crate) fn state_to_wire(state: WorkflowState) -> &'static str {
    match state {
        WorkflowState::Pending => "pending",
        WorkflowState::Running => "running",
        WorkflowState::Paused => "paused",
        WorkflowState::Completed => "completed",
        WorkflowState::Failed => "failed",
        WorkflowState::TimedOut => "timed_out",
        WorkflowState::Stopped => "stopped",
    }
}

fn state_from_wire(s: &str) -> WorkflowState {
    match s {
        "running" => WorkflowState::Running,
        "paused" => WorkflowState::Paused,
        "completed" => WorkflowState::Completed,
        "failed" => WorkflowState::Failed,
        "timed_out" => WorkflowState::TimedOut,
        "stopped" => WorkflowState::Stopped,
        _ => WorkflowState::Pending,
    }
}
