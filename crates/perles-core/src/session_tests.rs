// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Utc;

#[test]
fn new_session_starts_pending_and_undeleted() {
    let now = Utc::now();
    let s = Session::new(WorkflowId::new(), "proj", "/work/proj", now);
    assert_eq!(s.state, WorkflowState::Pending);
    assert!(!s.is_deleted());
    assert!(!s.is_active());
}

#[test]
fn running_undeleted_session_is_active() {
    let now = Utc::now();
    let mut s = Session::new(WorkflowId::new(), "proj", "/work/proj", now);
    s.state = WorkflowState::Running;
    assert!(s.is_active());
}

#[test]
fn mark_deleted_excludes_from_active_even_if_running() {
    let now = Utc::now();
    let mut s = Session::new(WorkflowId::new(), "proj", "/work/proj", now);
    s.state = WorkflowState::Running;
    let later = now + chrono::Duration::seconds(10);
    s.mark_deleted(later);
    assert!(s.is_deleted());
    assert!(!s.is_active());
    assert_eq!(s.updated_at, later);
}
