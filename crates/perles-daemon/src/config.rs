// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control Plane configuration: explicit fields, validated at construction,
//! no hidden global state (§2.1).

use std::path::PathBuf;
use std::time::Duration;

use perles_core::HealthPolicy;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PERLES_STATE_DIR is unset and $HOME could not be resolved")]
    NoStateDir,
    #[error(transparent)]
    InvalidHealthPolicy(#[from] perles_core::ValidationError),
}

/// Host-level configuration for one Control Plane instance.
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub broker_capacity: usize,
    pub health_policy: HealthPolicy,
    pub health_check_interval: Duration,
    pub drain_timeout: Duration,
}

impl Config {
    /// Resolve from the process environment: `PERLES_STATE_DIR` >
    /// `XDG_STATE_HOME/perles` > `~/.local/state/perles`.
    pub fn load() -> Result<Self, ConfigError> {
        let state_dir = if let Ok(dir) = std::env::var("PERLES_STATE_DIR") {
            PathBuf::from(dir)
        } else if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
            PathBuf::from(xdg).join("perles")
        } else {
            let home = std::env::var("HOME").map_err(|_| ConfigError::NoStateDir)?;
            PathBuf::from(home).join(".local/state/perles")
        };

        let config = Self {
            state_dir,
            broker_capacity: 64,
            health_policy: HealthPolicy::default(),
            health_check_interval: Duration::from_secs(10),
            drain_timeout: Duration::from_secs(5),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.health_policy.validate()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
