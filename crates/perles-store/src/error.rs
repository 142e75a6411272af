// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("session not found: project={project} guid={guid}")]
    SessionNotFound { project: String, guid: String },
    #[error("no active session for project {0}")]
    NoActiveSession(String),
}

impl From<StoreError> for perles_core::error::InternalError {
    fn from(err: StoreError) -> Self {
        perles_core::error::InternalError::Store(err.to_string())
    }
}
