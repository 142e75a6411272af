// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error taxonomy (§7).
//!
//! Every crate in the workspace maps its own failures into one of these
//! categories at its boundary, preserving distinct error *variants* rather
//! than collapsing to string comparison (§9 design notes).

use thiserror::Error;

use crate::workflow::WorkflowId;

/// Validation errors: malformed spec, unknown template, missing required
/// argument, invalid branch name.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("unknown template: {0}")]
    UnknownTemplate(String),
    #[error("missing required argument: {field}")]
    MissingRequiredArgument { field: String },
    #[error("invalid branch name: {name}")]
    InvalidBranchName { name: String },
    #[error("malformed workflow spec: {0}")]
    MalformedSpec(String),
}

/// Not-found errors.
#[derive(Debug, Clone, Error)]
pub enum NotFoundError {
    #[error("workflow not found: {0}")]
    Workflow(WorkflowId),
    #[error("session not found: project={project} guid={guid}")]
    Session { project: String, guid: String },
    #[error("no active session for project {0}")]
    NoActiveSession(String),
}

/// Conflict errors: illegal state transitions, duplicate active sessions.
#[derive(Debug, Clone, Error)]
pub enum ConflictError {
    #[error("project {0} already has an active session")]
    ActiveSessionExists(String),
    #[error("workflow {id} is in state {state}, which does not permit this operation")]
    IllegalState { id: WorkflowId, state: String },
}

/// External collaborator errors: tracker, git, process-spawn failure.
#[derive(Debug, Error)]
pub enum ExternalError {
    #[error("issue tracker error: {0}")]
    Tracker(String),
    #[error("git executor error: {0}")]
    Git(String),
    #[error("failed to spawn process: {0}")]
    Spawn(String),
}

/// Internal errors: store I/O, unexpected unmarshalling.
#[derive(Debug, Error)]
pub enum InternalError {
    #[error("store I/O error: {0}")]
    Store(String),
    #[error("unexpected unmarshalling error: {0}")]
    Unmarshal(String),
}

/// Top-level Control Plane error, unifying the taxonomy above.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error(transparent)]
    Conflict(#[from] ConflictError),
    #[error(transparent)]
    External(#[from] ExternalError),
    #[error(transparent)]
    Internal(#[from] InternalError),
}
