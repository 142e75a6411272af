// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory `ProcessSpawner` for tests: records spawn calls and lets the
//! test script push lines onto the returned handle's stream.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use perles_core::ProcessId;
use tokio::sync::mpsc;

use super::{ExitReason, ProcessHandle, SignalKind, SpawnError, SpawnRequest};
use crate::read_loop::{feed_line, SupervisedLine};

#[derive(Debug, Clone)]
pub struct RecordedSpawn {
    pub process_id: ProcessId,
    pub request: SpawnRequest,
}

#[derive(Default)]
pub struct FakeProcessSpawner {
    spawns: Mutex<Vec<RecordedSpawn>>,
    exit_reasons: Mutex<HashMap<ProcessId, ExitReason>>,
    // Held open past `spawn()` returning so a test can simulate a
    // long-running child; dropping (via `close`) is what lets a consumer's
    // `line_rx.recv()` observe the stream end, the same way the real
    // `TokioProcessSpawner`'s reaper task drops its sender on process exit.
    senders: Mutex<HashMap<ProcessId, mpsc::Sender<SupervisedLine>>>,
}

impl FakeProcessSpawner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn spawns(&self) -> Vec<RecordedSpawn> {
        self.spawns.lock().clone()
    }

    /// Queue the `ExitReason` a subsequent `wait()` on this process should return.
    pub fn set_exit_reason(&self, process_id: ProcessId, reason: ExitReason) {
        self.exit_reasons.lock().insert(process_id, reason);
    }

    /// Feed a raw NDJSON line onto a spawned process's own event stream, as
    /// if the fake child wrote it to stdout. Returns `false` if the handle's
    /// stream was already closed.
    pub async fn push_line(&self, handle: &ProcessHandle, workflow_id: &perles_core::WorkflowId, line: &str) -> bool {
        let tx = self.senders.lock().get(&handle.process_id).cloned();
        match tx {
            Some(tx) => feed_line(workflow_id, line, &tx).await,
            None => false,
        }
    }

    /// Close a process's event stream, simulating stdout reaching EOF. Any
    /// consumer looping on `line_rx.recv()` observes `None` next and may
    /// then call `wait()` for the exit reason.
    pub fn close(&self, handle: &ProcessHandle) {
        self.senders.lock().remove(&handle.process_id);
    }
}

#[async_trait]
impl super::ProcessSpawner for FakeProcessSpawner {
    async fn spawn(
        &self,
        request: SpawnRequest,
        line_tx: mpsc::Sender<SupervisedLine>,
    ) -> Result<ProcessHandle, SpawnError> {
        let process_id = ProcessId::new();
        let role = request.role;
        self.senders.lock().insert(process_id.clone(), line_tx);
        self.spawns.lock().push(RecordedSpawn { process_id: process_id.clone(), request });
        Ok(ProcessHandle { process_id, role })
    }

    async fn signal(&self, _handle: &ProcessHandle, _kind: SignalKind) -> Result<(), SpawnError> {
        Ok(())
    }

    async fn wait(&self, handle: &ProcessHandle) -> Result<ExitReason, SpawnError> {
        Ok(self
            .exit_reasons
            .lock()
            .remove(&handle.process_id)
            .unwrap_or(ExitReason::Exited { code: 0 }))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
