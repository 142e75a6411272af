use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use perles_core::error::ExternalError;
use serde_json::Value;

use super::{GitExecutor, TrackerExecutor};

/// Records every call it receives; epic/task ids are sequential so tests
/// can assert on creation order without depending on real tracker state.
#[derive(Default)]
pub struct FakeTrackerExecutor {
    next_id: Mutex<u64>,
    created_epics: Mutex<Vec<(String, String)>>,
    created_tasks: Mutex<Vec<(String, String, String)>>,
}

impl FakeTrackerExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn fresh_id(&self, prefix: &str) -> String {
        let mut next = self.next_id.lock();
        *next += 1;
        format!("{prefix}-{next}")
    }

    pub fn created_epics(&self) -> Vec<(String, String)> {
        self.created_epics.lock().clone()
    }

    pub fn created_tasks(&self) -> Vec<(String, String, String)> {
        self.created_tasks.lock().clone()
    }
}

#[async_trait]
impl TrackerExecutor for FakeTrackerExecutor {
    async fn create_epic(&self, title: &str, description: &str) -> Result<String, ExternalError> {
        let id = self.fresh_id("epic");
        self.created_epics.lock().push((title.to_string(), description.to_string()));
        Ok(id)
    }

    async fn create_task(&self, epic_id: &str, title: &str, description: &str) -> Result<String, ExternalError> {
        let id = self.fresh_id("task");
        self.created_tasks
            .lock()
            .push((epic_id.to_string(), title.to_string(), description.to_string()));
        Ok(id)
    }

    async fn add_dependency(&self, _task_id: &str, _depends_on: &str) -> Result<(), ExternalError> {
        Ok(())
    }

    async fn update_status(&self, _task_id: &str, _status: &str) -> Result<(), ExternalError> {
        Ok(())
    }

    async fn update_priority(&self, _task_id: &str, _priority: &str) -> Result<(), ExternalError> {
        Ok(())
    }

    async fn set_labels(&self, _task_id: &str, _labels: &[String]) -> Result<(), ExternalError> {
        Ok(())
    }

    async fn get_comments(&self, _task_id: &str) -> Result<Vec<String>, ExternalError> {
        Ok(Vec::new())
    }

    async fn execute(&self, _query: &str) -> Result<Value, ExternalError> {
        Ok(Value::Null)
    }
}

/// Reports an empty, always-degraded worktree surface unless seeded.
#[derive(Default)]
pub struct FakeGitExecutor {
    branches: Mutex<Vec<String>>,
}

impl FakeGitExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed_branches(&self, branches: Vec<String>) {
        *self.branches.lock() = branches;
    }
}

#[async_trait]
impl GitExecutor for FakeGitExecutor {
    async fn list_branches(&self, _repo_path: &str) -> Result<Vec<String>, ExternalError> {
        Ok(self.branches.lock().clone())
    }

    async fn list_worktrees(&self, _repo_path: &str) -> Result<Vec<String>, ExternalError> {
        Ok(Vec::new())
    }

    async fn validate_branch_name(&self, name: &str) -> Result<bool, ExternalError> {
        Ok(!name.is_empty() && !name.contains(' '))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
