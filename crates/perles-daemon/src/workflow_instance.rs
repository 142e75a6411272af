// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `WorkflowInstance`: the in-memory aggregate the Control Plane owns for
//! one running workflow (§3, §4.1) — a `WorkflowDescriptor` plus handles to
//! its supervisor collaborators. Owned exclusively by the Control Plane.

use std::sync::Arc;

use parking_lot::Mutex;
use perles_core::WorkflowDescriptor;
use perles_supervisor::coordinator_driver::CoordinatorDriver;
use perles_supervisor::process_spawner::ProcessHandle;
use perles_supervisor::worker_pool::WorkerPool;

pub struct WorkflowInstance {
    pub descriptor: Mutex<WorkflowDescriptor>,
    pub coordinator: Arc<Mutex<CoordinatorDriver>>,
    pub pool: WorkerPool,
    /// The coordinator's live process handle, set once `Start` spawns it and
    /// read by `Stop`/exit handling to signal or wait on the child. `None`
    /// before the first successful spawn and after the process has exited.
    pub coordinator_handle: Mutex<Option<ProcessHandle>>,
}

impl WorkflowInstance {
    pub fn new(descriptor: WorkflowDescriptor, coordinator: CoordinatorDriver, pool: WorkerPool) -> Self {
        Self {
            descriptor: Mutex::new(descriptor),
            coordinator: Arc::new(Mutex::new(coordinator)),
            pool,
            coordinator_handle: Mutex::new(None),
        }
    }
}
