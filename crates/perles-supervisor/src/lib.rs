// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! perles-supervisor: Process Supervisor, Worker Pool, and Coordinator
//! Driver (§4.2, §4.3, §4.4).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod coordinator_driver;
pub mod error;
pub mod process_spawner;
pub mod read_loop;
pub mod worker_pool;

pub use coordinator_driver::{CoordinatorDriver, HandoffOutcome, HandoffReceived, RefreshState};
pub use error::SupervisorError;
pub use process_spawner::{ExitReason, ProcessHandle, ProcessSpawner, SignalKind, SpawnError, SpawnRequest};
pub use process_spawner::tokio_spawner::TokioProcessSpawner;
pub use read_loop::SupervisedLine;
pub use worker_pool::{ConfirmationBarrier, WorkerPool, WorkerPoolError, WorkerState, WorkerStatus};

#[cfg(any(test, feature = "test-support"))]
pub use process_spawner::fake::FakeProcessSpawner;
