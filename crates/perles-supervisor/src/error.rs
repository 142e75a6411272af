// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::process_spawner::SpawnError;
use crate::worker_pool::WorkerPoolError;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Spawn(#[from] SpawnError),
    #[error(transparent)]
    WorkerPool(#[from] WorkerPoolError),
}

impl From<SupervisorError> for perles_core::error::ExternalError {
    fn from(err: SupervisorError) -> Self {
        perles_core::error::ExternalError::Spawn(err.to_string())
    }
}
