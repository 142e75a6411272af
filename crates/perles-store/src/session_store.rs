// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session Store (§4.8): `Save`, `FindByGUID`, `FindByID`,
//! `GetActiveSession`, `Delete`, `DeleteAllForProject`, `ListWithFilter`.

use chrono::Utc;
use perles_core::{Session, WorkflowId, WorkflowState};
use sqlx::SqlitePool;

use crate::error::StoreError;
use crate::row::{state_to_wire, SessionRow};

/// Filter accepted by `ListWithFilter` (§4.8).
#[derive(Debug, Clone, Default)]
pub struct SessionListFilter {
    pub state: Option<WorkflowState>,
    pub limit: Option<i64>,
    pub include_deleted: bool,
}

#[derive(Clone)]
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert by `workflow_id` (the store's natural key, taking the place
    /// of the `ID == 0` sentinel the source used for its integer primary
    /// key — §9 Open Question).
    pub async fn save(&self, session: &Session) -> Result<(), StoreError> {
        let row = SessionRow::from(session);
        sqlx::query(
            r#"
            INSERT INTO sessions (
                workflow_id, guid, project, work_dir, worktree_path, worktree_branch,
                state, creator_process_id, current_owner_process_id,
                created_at, started_at, paused_at, updated_at, archived_at, deleted_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(workflow_id) DO UPDATE SET
                guid = excluded.guid,
                project = excluded.project,
                work_dir = excluded.work_dir,
                worktree_path = excluded.worktree_path,
                worktree_branch = excluded.worktree_branch,
                state = excluded.state,
                creator_process_id = excluded.creator_process_id,
                current_owner_process_id = excluded.current_owner_process_id,
                started_at = excluded.started_at,
                paused_at = excluded.paused_at,
                updated_at = excluded.updated_at,
                archived_at = excluded.archived_at,
                deleted_at = excluded.deleted_at
            "#,
        )
        .bind(&row.workflow_id)
        .bind(&row.guid)
        .bind(&row.project)
        .bind(&row.work_dir)
        .bind(&row.worktree_path)
        .bind(&row.worktree_branch)
        .bind(&row.state)
        .bind(&row.creator_process_id)
        .bind(&row.current_owner_process_id)
        .bind(row.created_at)
        .bind(row.started_at)
        .bind(row.paused_at)
        .bind(row.updated_at)
        .bind(row.archived_at)
        .bind(row.deleted_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_guid(&self, project: &str, guid: &str) -> Result<Session, StoreError> {
        let row: Option<SessionRow> = sqlx::query_as(
            "SELECT * FROM sessions WHERE project = ? AND guid = ? AND deleted_at IS NULL",
        )
        .bind(project)
        .bind(guid)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or_else(|| StoreError::SessionNotFound { project: project.to_string(), guid: guid.to_string() })?
            .try_into()
    }

    pub async fn find_by_id(&self, workflow_id: &WorkflowId) -> Result<Session, StoreError> {
        let row: Option<SessionRow> =
            sqlx::query_as("SELECT * FROM sessions WHERE workflow_id = ? AND deleted_at IS NULL")
                .bind(workflow_id.as_str())
                .fetch_optional(&self.pool)
                .await?;
        row.ok_or_else(|| StoreError::SessionNotFound {
            project: String::new(),
            guid: workflow_id.to_string(),
        })?
        .try_into()
    }

    pub async fn get_active_session(&self, project: &str) -> Result<Session, StoreError> {
        let row: Option<SessionRow> = sqlx::query_as(
            "SELECT * FROM sessions WHERE project = ? AND state = 'running' AND deleted_at IS NULL LIMIT 1",
        )
        .bind(project)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or_else(|| StoreError::NoActiveSession(project.to_string()))?.try_into()
    }

    /// Soft delete: stamps `deleted_at`, never removes the row (§4.8).
    pub async fn delete(&self, project: &str, guid: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE sessions SET deleted_at = ?, updated_at = ? WHERE project = ? AND guid = ?")
            .bind(Utc::now())
            .bind(Utc::now())
            .bind(project)
            .bind(guid)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Hard delete every row for `project`, soft-deleted or not (§4.8).
    pub async fn delete_all_for_project(&self, project: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE project = ?").bind(project).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn list_with_filter(
        &self,
        project: &str,
        filter: &SessionListFilter,
    ) -> Result<Vec<Session>, StoreError> {
        let mut sql = String::from("SELECT * FROM sessions WHERE project = ?");
        if !filter.include_deleted {
            sql.push_str(" AND deleted_at IS NULL");
        }
        if filter.state.is_some() {
            sql.push_str(" AND state = ?");
        }
        sql.push_str(" ORDER BY created_at DESC");
        if filter.limit.is_some() {
            sql.push_str(" LIMIT ?");
        }

        let mut query = sqlx::query_as::<_, SessionRow>(&sql).bind(project);
        if let Some(state) = filter.state {
            query = query.bind(state_to_wire(state));
        }
        if let Some(limit) = filter.limit {
            query = query.bind(limit);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }
}

#[cfg(test)]
#[path = "session_store_tests.rs"]
mod tests;

