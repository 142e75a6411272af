// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON request/response DTOs for the HTTP API (§6.1).
//!
//! This crate defines wire shapes only; no server lives here. The daemon
//! crate maps these to and from `perles-core` domain types at the boundary.

use chrono::{DateTime, Utc};
use perles_core::{EpicId, TemplateId, WorkflowId, WorkflowState};
use serde::{Deserialize, Serialize};

/// `POST /workflows` request body.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkflowRequest {
    pub template_id: TemplateId,
    pub goal: String,
    pub name: Option<String>,
    pub epic_id: Option<EpicId>,
    pub worktree_mode: Option<String>,
    pub worktree_base_branch: Option<String>,
    pub worktree_branch_name: Option<String>,
    pub worktree_path: Option<String>,
}

/// `POST /workflows` 201 response body.
#[derive(Debug, Clone, Serialize)]
pub struct CreateWorkflowResponse {
    pub id: WorkflowId,
}

/// `GET /workflows/{id}` 200 response body.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowView {
    pub id: WorkflowId,
    pub template_id: TemplateId,
    pub name: Option<String>,
    pub state: WorkflowState,
    pub port: Option<u16>,
    pub is_healthy: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `GET /workflows` 200 response body.
#[derive(Debug, Clone, Serialize)]
pub struct ListWorkflowsResponse {
    pub workflows: Vec<WorkflowView>,
    pub total: usize,
}

/// `POST /workflows/{id}/stop` request body.
#[derive(Debug, Clone, Deserialize)]
pub struct StopWorkflowRequest {
    pub reason: Option<String>,
    #[serde(default)]
    pub force: bool,
}

/// `GET /health` 200 response body: one entry per tracked workflow.
#[derive(Debug, Clone, Serialize)]
pub struct HealthView {
    pub workflows: Vec<WorkflowHealthEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowHealthEntry {
    pub workflow_id: WorkflowId,
    pub status: String,
    pub last_event_at: Option<DateTime<Utc>>,
}

/// `{code, message}` error envelope (§6.1, §7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
}

impl ErrorEnvelope {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into() }
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
