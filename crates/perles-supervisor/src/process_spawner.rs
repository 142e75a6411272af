// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ProcessSpawner`: the Process Supervisor's contract for owning OS child
//! processes (§4.2).

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use perles_core::{ProcessId, ProcessRole, WorkflowId};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::read_loop::SupervisedLine;

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("failed to spawn process: {0}")]
    Spawn(String),
    #[error("process not found: {0}")]
    NotFound(ProcessId),
    #[error("signal delivery failed: {0}")]
    Signal(String),
}

/// Kind of signal the supervisor may deliver (§4.2: `{interrupt, kill}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Interrupt,
    Kill,
}

/// Why a child process stopped running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    WorkflowComplete,
    Exited { code: i32 },
    Signaled { kind: SignalKind },
    SpawnFailed(String),
}

/// Arguments for spawning a coordinator or worker child.
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub workflow_id: WorkflowId,
    pub role: ProcessRole,
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub workdir: PathBuf,
}

/// A live handle to a spawned child, returned alongside its event stream.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    pub process_id: ProcessId,
    pub role: ProcessRole,
}

/// Owns OS child processes and turns their structured stdout into
/// `ProcessEvent`s (§4.2). Implementations are responsible for starting the
/// non-blocking read-loop task tied to the returned handle.
#[async_trait]
pub trait ProcessSpawner: Send + Sync + 'static {
    /// Spawn a child and start its supervised read loop. `line_tx` receives
    /// every well-formed `ProcessEvent` plus sideband parse errors; malformed
    /// lines never terminate the supervisor (§4.2).
    async fn spawn(
        &self,
        request: SpawnRequest,
        line_tx: mpsc::Sender<SupervisedLine>,
    ) -> Result<ProcessHandle, SpawnError>;

    async fn signal(&self, handle: &ProcessHandle, kind: SignalKind) -> Result<(), SpawnError>;

    async fn wait(&self, handle: &ProcessHandle) -> Result<ExitReason, SpawnError>;
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub mod tokio_spawner;
