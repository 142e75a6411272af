// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn spawn_then_get_returns_running_worker() {
    let pool = WorkerPool::new("wf-1");
    let id = pool.spawn("planner");
    let worker = pool.get(&id).unwrap();
    assert_eq!(worker.status, WorkerStatus::Running);
}

#[test]
fn remove_unknown_worker_fails() {
    let pool = WorkerPool::new("wf-1");
    assert!(matches!(pool.remove(&WorkerId::new()), Err(WorkerPoolError::NotFound(_))));
}

#[test]
fn mark_draining_then_remove_drops_from_list() {
    let pool = WorkerPool::new("wf-1");
    let id = pool.spawn("planner");
    pool.mark_draining(&id).unwrap();
    assert_eq!(pool.get(&id).unwrap().status, WorkerStatus::Draining);
    pool.remove(&id).unwrap();
    assert!(pool.list().is_empty());
}

#[tokio::test]
async fn barrier_closes_once_expected_confirmations_land() {
    let barrier = ConfirmationBarrier::new(2);
    let a = WorkerId::new();
    let b = WorkerId::new();
    assert!(!barrier.is_done());
    barrier.confirm(a);
    assert!(!barrier.is_done());
    barrier.confirm(b);
    assert!(barrier.is_done());
    barrier.done().await;
}

#[tokio::test]
async fn duplicate_confirmation_is_a_no_op() {
    let barrier = ConfirmationBarrier::new(2);
    let a = WorkerId::new();
    barrier.confirm(a.clone());
    barrier.confirm(a);
    assert!(!barrier.is_done());
}

#[tokio::test]
async fn multiple_waiters_all_unblock() {
    let barrier = ConfirmationBarrier::new(1);
    let b1 = barrier.clone();
    let b2 = barrier.clone();
    let w1 = tokio::spawn(async move { b1.done().await });
    let w2 = tokio::spawn(async move { b2.done().await });
    tokio::task::yield_now().await;
    barrier.confirm(WorkerId::new());
    w1.await.unwrap();
    w2.await.unwrap();
}
