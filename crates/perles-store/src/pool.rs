// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection pool construction with the pragma setup SQLite needs to
//! behave under concurrent readers and a single writer (§4.8.1).

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error::StoreError;

const DEFAULT_POOL_SIZE: u32 = 5;
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Open (creating if absent) the session database at `path`, applying the
/// pragma set every connection in the pool needs (§4.8.1) and running
/// embedded migrations (§6.3: "pre-migration backup copied to `.bak`" is
/// the daemon's responsibility, not the pool's).
pub async fn open(path: &Path) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new().max_connections(DEFAULT_POOL_SIZE).connect_with(options).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
