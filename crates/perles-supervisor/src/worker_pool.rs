// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker Pool (§4.3): `Spawn`, `Retire`, `StartReplacement`, `List`, `Get`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use perles_core::WorkerId;
use thiserror::Error;
use tokio::sync::Notify;

#[derive(Debug, Error)]
pub enum WorkerPoolError {
    #[error("worker not found: {0}")]
    NotFound(WorkerId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Running,
    Draining,
}

#[derive(Debug, Clone)]
pub struct WorkerState {
    pub id: WorkerId,
    pub kind: String,
    pub status: WorkerStatus,
}

/// Idempotent, monotonic confirmation barrier for `StartReplacement` (§4.3):
/// duplicate confirmations are no-ops, and once `count >= expected` every
/// waiter on `done()` unblocks exactly once.
pub struct ConfirmationBarrier {
    expected: usize,
    confirmed: Mutex<Vec<WorkerId>>,
    count: AtomicUsize,
    notify: Notify,
}

impl ConfirmationBarrier {
    pub fn new(expected: usize) -> Arc<Self> {
        Arc::new(Self { expected, confirmed: Mutex::new(Vec::new()), count: AtomicUsize::new(0), notify: Notify::new() })
    }

    /// Record a worker's confirmation. A worker id already confirmed is a
    /// no-op. Notifies waiters once the barrier closes.
    pub fn confirm(&self, worker_id: WorkerId) {
        let mut confirmed = self.confirmed.lock();
        if confirmed.contains(&worker_id) {
            return;
        }
        confirmed.push(worker_id);
        let count = confirmed.len();
        drop(confirmed);
        self.count.store(count, Ordering::SeqCst);
        if count >= self.expected {
            self.notify.notify_waiters();
        }
    }

    pub fn is_done(&self) -> bool {
        self.count.load(Ordering::SeqCst) >= self.expected
    }

    /// Wait until the barrier closes. Multiple callers may await this
    /// concurrently; all unblock once `expected` confirmations land.
    pub async fn done(&self) {
        if self.is_done() {
            return;
        }
        loop {
            let notified = self.notify.notified();
            if self.is_done() {
                return;
            }
            notified.await;
            if self.is_done() {
                return;
            }
        }
    }
}

pub struct WorkerPool {
    workflow_label: String,
    workers: Mutex<HashMap<WorkerId, WorkerState>>,
}

impl WorkerPool {
    pub fn new(workflow_label: impl Into<String>) -> Self {
        Self { workflow_label: workflow_label.into(), workers: Mutex::new(HashMap::new()) }
    }

    pub fn spawn(&self, kind: impl Into<String>) -> WorkerId {
        let id = WorkerId::new();
        self.workers.lock().insert(
            id.clone(),
            WorkerState { id: id.clone(), kind: kind.into(), status: WorkerStatus::Running },
        );
        tracing::info!(workflow = %self.workflow_label, worker = %id, "spawned worker");
        id
    }

    /// Mark a worker draining. The supervisor's caller is responsible for
    /// actually sending the drain signal and waiting for the worker's final
    /// event before calling `remove`.
    pub fn mark_draining(&self, worker_id: &WorkerId) -> Result<(), WorkerPoolError> {
        let mut workers = self.workers.lock();
        let worker = workers.get_mut(worker_id).ok_or_else(|| WorkerPoolError::NotFound(worker_id.clone()))?;
        worker.status = WorkerStatus::Draining;
        Ok(())
    }

    pub fn remove(&self, worker_id: &WorkerId) -> Result<(), WorkerPoolError> {
        self.workers.lock().remove(worker_id).map(|_| ()).ok_or_else(|| WorkerPoolError::NotFound(worker_id.clone()))
    }

    pub fn start_replacement(&self, expected_count: usize) -> Arc<ConfirmationBarrier> {
        ConfirmationBarrier::new(expected_count)
    }

    pub fn list(&self) -> Vec<WorkerState> {
        self.workers.lock().values().cloned().collect()
    }

    pub fn get(&self, worker_id: &WorkerId) -> Option<WorkerState> {
        self.workers.lock().get(worker_id).cloned()
    }
}

#[cfg(test)]
#[path = "worker_pool_tests.rs"]
mod tests;
