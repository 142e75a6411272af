// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("template not found: {0}")]
    TemplateNotFound(String),
    #[error("malformed template {path}: {reason}")]
    MalformedTemplate { path: String, reason: String },
}

impl From<RegistryError> for perles_core::error::ValidationError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::TemplateNotFound(id) => perles_core::error::ValidationError::UnknownTemplate(id),
            RegistryError::MalformedTemplate { path, reason } => {
                perles_core::error::ValidationError::MalformedSpec(format!("{path}: {reason}"))
            }
        }
    }
}
