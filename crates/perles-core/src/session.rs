// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Session`: the persisted projection of a workflow sufficient to re-attach
//! across restarts (§3, §4.8, glossary "Session row").
//!
//! This is a plain domain value type. The store's row model lives in
//! `perles-store` and converts at the boundary, keeping `perles-core` free
//! of any storage-engine dependency (§9 design note, "domain vs
//! infrastructure" split).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::process::ProcessId;
use crate::workflow::{WorkflowId, WorkflowState};

crate::define_id!(
    /// Collision-free identifier for a session row, stable across process
    /// restarts and distinct from the in-memory [`WorkflowId`] (§3).
    pub struct SessionGuid("ses-")
);

/// The persisted-1:1-with-a-workflow session row (§3, §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub workflow_id: WorkflowId,
    pub guid: SessionGuid,
    pub project: String,
    pub work_dir: String,
    pub worktree_path: Option<String>,
    pub worktree_branch: Option<String>,
    pub state: WorkflowState,
    pub creator_process_id: Option<ProcessId>,
    pub current_owner_process_id: Option<ProcessId>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(workflow_id: WorkflowId, project: impl Into<String>, work_dir: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            workflow_id,
            guid: SessionGuid::new(),
            project: project.into(),
            work_dir: work_dir.into(),
            worktree_path: None,
            worktree_branch: None,
            state: WorkflowState::Pending,
            creator_process_id: None,
            current_owner_process_id: None,
            created_at: now,
            started_at: None,
            paused_at: None,
            updated_at: now,
            archived_at: None,
            deleted_at: None,
        }
    }

    /// Soft delete (§3: "soft delete via `deleted_at`"); the row remains
    /// physically present but is excluded from queries unless
    /// `IncludeDeleted` is requested (§4.8).
    pub fn mark_deleted(&mut self, now: DateTime<Utc>) {
        self.deleted_at = Some(now);
        self.updated_at = now;
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// A row is eligible as "the" active session for its project only while
    /// undeleted and in the `running` state (§4.8: `GetActiveSession` is
    /// "at-most-one running per project").
    pub fn is_active(&self) -> bool {
        !self.is_deleted() && self.state == WorkflowState::Running
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
