// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow Creator (§3, §4.1): turns an inbound `WorkflowSpec` plus its
//! template registration into an epic in the tracker and a rendered
//! coordinator prompt. Standard templates delegate epic creation to the
//! tracker; epic-driven templates use the caller-supplied `EpicID` verbatim.

use std::collections::BTreeMap;

use perles_core::error::{ExternalError, ValidationError};
use perles_core::{EpicId, Registration, WorkflowSpec};
use thiserror::Error;

use crate::collaborators::TrackerExecutor;

#[derive(Debug, Error)]
pub enum WorkflowCreationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Tracker(#[from] ExternalError),
}

#[derive(Debug)]
pub struct CreatedWorkflow {
    pub epic_id: EpicId,
    pub initial_prompt: String,
}

pub struct WorkflowCreator<'a> {
    tracker: &'a dyn TrackerExecutor,
}

impl<'a> WorkflowCreator<'a> {
    pub fn new(tracker: &'a dyn TrackerExecutor) -> Self {
        Self { tracker }
    }

    /// Materialize the epic (or reuse the caller-supplied one) and render
    /// the coordinator's initial prompt from `registration`.
    pub async fn create(
        &self,
        spec: &WorkflowSpec,
        registration: &Registration,
        args: &BTreeMap<String, String>,
    ) -> Result<CreatedWorkflow, WorkflowCreationError> {
        spec.validate()?;
        let initial_prompt = registration.render(args)?;

        let epic_id = match &spec.epic_id {
            Some(id) => id.clone(),
            None => {
                let title = spec.name.clone().unwrap_or_else(|| registration.display_name.clone());
                let id = self.tracker.create_epic(&title, &spec.initial_prompt).await?;
                EpicId::from_string(id)
            }
        };

        Ok(CreatedWorkflow { epic_id, initial_prompt })
    }
}

#[cfg(test)]
#[path = "workflow_creator_tests.rs"]
mod tests;
