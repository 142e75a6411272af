// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `TokioProcessSpawner`: owns real OS child processes via
//! `tokio::process::Command`, feeding stdout through the shared read-loop
//! (§4.2). One reaper task per child pumps lines into `feed_line` and
//! records the exit reason for a later `wait()`.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use perles_core::ProcessId;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};

use super::{ExitReason, ProcessHandle, SignalKind, SpawnError, SpawnRequest};
use crate::read_loop::{feed_line, SupervisedLine};

struct RunningChild {
    pid: Option<i32>,
    exit_rx: oneshot::Receiver<ExitReason>,
}

/// Spawns children with `tokio::process::Command`, reading their stdout as
/// newline-delimited JSON (§6.2) and delivering signals with `nix`.
#[derive(Default)]
pub struct TokioProcessSpawner {
    children: Mutex<HashMap<ProcessId, RunningChild>>,
}

impl TokioProcessSpawner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl super::ProcessSpawner for TokioProcessSpawner {
    async fn spawn(
        &self,
        request: SpawnRequest,
        line_tx: mpsc::Sender<SupervisedLine>,
    ) -> Result<ProcessHandle, SpawnError> {
        let process_id = ProcessId::new();
        let role = request.role;

        let mut command = Command::new(&request.command);
        command
            .args(&request.args)
            .current_dir(&request.workdir)
            .envs(&request.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|e| SpawnError::Spawn(e.to_string()))?;
        let pid = child.id().map(|p| p as i32);
        let stdout = child.stdout.take().ok_or_else(|| SpawnError::Spawn("child stdout not piped".to_string()))?;

        let (exit_tx, exit_rx) = oneshot::channel();
        let workflow_id = request.workflow_id.clone();
        let reaper_process_id = process_id.clone();

        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) if line.trim().is_empty() => continue,
                    Ok(Some(line)) => {
                        if !feed_line(&workflow_id, &line, &line_tx).await {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(err) => {
                        tracing::warn!(process_id = %reaper_process_id, error = %err, "stdout read error");
                        break;
                    }
                }
            }

            let reason = match child.wait().await {
                Ok(status) if status.success() => ExitReason::WorkflowComplete,
                Ok(status) => ExitReason::Exited { code: status.code().unwrap_or(-1) },
                Err(err) => ExitReason::SpawnFailed(err.to_string()),
            };
            tracing::info!(process_id = %reaper_process_id, ?reason, "child process exited");
            let _ = exit_tx.send(reason);
        });

        self.children.lock().insert(process_id.clone(), RunningChild { pid, exit_rx });
        Ok(ProcessHandle { process_id, role })
    }

    async fn signal(&self, handle: &ProcessHandle, kind: SignalKind) -> Result<(), SpawnError> {
        let pid = {
            let children = self.children.lock();
            children
                .get(&handle.process_id)
                .and_then(|c| c.pid)
                .ok_or_else(|| SpawnError::NotFound(handle.process_id.clone()))?
        };
        let signal = match kind {
            SignalKind::Interrupt => Signal::SIGINT,
            SignalKind::Kill => Signal::SIGKILL,
        };
        signal::kill(Pid::from_raw(pid), signal).map_err(|e| SpawnError::Signal(e.to_string()))
    }

    async fn wait(&self, handle: &ProcessHandle) -> Result<ExitReason, SpawnError> {
        let exit_rx = {
            let mut children = self.children.lock();
            let child = children.remove(&handle.process_id).ok_or_else(|| SpawnError::NotFound(handle.process_id.clone()))?;
            child.exit_rx
        };
        exit_rx.await.map_err(|_| SpawnError::NotFound(handle.process_id.clone()))
    }
}

#[cfg(test)]
#[path = "tokio_spawner_tests.rs"]
mod tests;
