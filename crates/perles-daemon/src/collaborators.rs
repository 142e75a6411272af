// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External collaborator interfaces (§4.9, §6.5): `TrackerExecutor` and
//! `GitExecutor`. Each is a "capability record" — passed to the Control
//! Plane constructor as `Arc<dyn Trait>`, never held as global state.

use async_trait::async_trait;
use perles_core::error::ExternalError;
use serde_json::Value;

/// Issue-tracker operations the Workflow Creator and coordinator prompts
/// depend on. Failures are surfaced as-is, an `ExternalError::Tracker`.
#[async_trait]
pub trait TrackerExecutor: Send + Sync {
    async fn create_epic(&self, title: &str, description: &str) -> Result<String, ExternalError>;
    async fn create_task(&self, epic_id: &str, title: &str, description: &str) -> Result<String, ExternalError>;
    async fn add_dependency(&self, task_id: &str, depends_on: &str) -> Result<(), ExternalError>;
    async fn update_status(&self, task_id: &str, status: &str) -> Result<(), ExternalError>;
    async fn update_priority(&self, task_id: &str, priority: &str) -> Result<(), ExternalError>;
    async fn set_labels(&self, task_id: &str, labels: &[String]) -> Result<(), ExternalError>;
    async fn get_comments(&self, task_id: &str) -> Result<Vec<String>, ExternalError>;
    async fn execute(&self, query: &str) -> Result<Value, ExternalError>;
}

/// Git/worktree operations. A failure here degrades worktree features
/// rather than crashing the core (§4.9): callers treat `Err` as "worktree
/// unavailable", never propagate it as a fatal error.
#[async_trait]
pub trait GitExecutor: Send + Sync {
    async fn list_branches(&self, repo_path: &str) -> Result<Vec<String>, ExternalError>;
    async fn list_worktrees(&self, repo_path: &str) -> Result<Vec<String>, ExternalError>;
    async fn validate_branch_name(&self, name: &str) -> Result<bool, ExternalError>;
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake;
