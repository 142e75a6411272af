// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::pool;
use chrono::Utc;
use perles_core::WorkflowId;

async fn store() -> (SessionStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.sqlite3");
    let pool = pool::open(&path).await.unwrap();
    (SessionStore::new(pool), dir)
}

#[tokio::test]
async fn save_then_find_by_guid_round_trips() {
    let (store, _dir) = store().await;
    let now = Utc::now();
    let session = Session::new(WorkflowId::new(), "acme", "/work/acme", now);
    store.save(&session).await.unwrap();

    let found = store.find_by_guid("acme", session.guid.as_str()).await.unwrap();
    assert_eq!(found.workflow_id, session.workflow_id);
    assert_eq!(found.project, "acme");
}

#[tokio::test]
async fn find_by_guid_excludes_soft_deleted() {
    let (store, _dir) = store().await;
    let now = Utc::now();
    let session = Session::new(WorkflowId::new(), "acme", "/work/acme", now);
    store.save(&session).await.unwrap();
    store.delete("acme", session.guid.as_str()).await.unwrap();

    assert!(matches!(
        store.find_by_guid("acme", session.guid.as_str()).await,
        Err(StoreError::SessionNotFound { .. })
    ));
}

#[tokio::test]
async fn get_active_session_requires_running_state() {
    let (store, _dir) = store().await;
    let now = Utc::now();
    let mut session = Session::new(WorkflowId::new(), "acme", "/work/acme", now);
    store.save(&session).await.unwrap();
    assert!(matches!(
        store.get_active_session("acme").await,
        Err(StoreError::NoActiveSession(_))
    ));

    session.state = WorkflowState::Running;
    store.save(&session).await.unwrap();
    let active = store.get_active_session("acme").await.unwrap();
    assert_eq!(active.workflow_id, session.workflow_id);
}

#[tokio::test]
async fn save_upserts_by_workflow_id() {
    let (store, _dir) = store().await;
    let now = Utc::now();
    let mut session = Session::new(WorkflowId::new(), "acme", "/work/acme", now);
    store.save(&session).await.unwrap();

    session.state = WorkflowState::Completed;
    session.updated_at = now + chrono::Duration::seconds(5);
    store.save(&session).await.unwrap();

    let found = store.find_by_id(&session.workflow_id).await.unwrap();
    assert_eq!(found.state, WorkflowState::Completed);
}

#[tokio::test]
async fn delete_all_for_project_hard_deletes() {
    let (store, _dir) = store().await;
    let now = Utc::now();
    let session = Session::new(WorkflowId::new(), "acme", "/work/acme", now);
    store.save(&session).await.unwrap();
    store.delete_all_for_project("acme").await.unwrap();

    let filter = SessionListFilter { include_deleted: true, ..Default::default() };
    let rows = store.list_with_filter("acme", &filter).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn list_with_filter_orders_by_created_at_desc() {
    let (store, _dir) = store().await;
    let now = Utc::now();
    let first = Session::new(WorkflowId::new(), "acme", "/work/acme", now);
    let second = Session::new(WorkflowId::new(), "acme", "/work/acme", now + chrono::Duration::seconds(1));
    store.save(&first).await.unwrap();
    store.save(&second).await.unwrap();

    let rows = store.list_with_filter("acme", &SessionListFilter::default()).await.unwrap();
    assert_eq!(rows[0].workflow_id, second.workflow_id);
    assert_eq!(rows[1].workflow_id, first.workflow_id);
}
