// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! perles-wire: JSON wire shapes for the HTTP API and the child-process
//! NDJSON protocol (§6.1, §6.2). No transport or server logic lives here.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod http;
mod ndjson;

pub use http::{
    CreateWorkflowRequest, CreateWorkflowResponse, ErrorEnvelope, HealthView, ListWorkflowsResponse,
    StopWorkflowRequest, WorkflowHealthEntry, WorkflowView,
};
pub use ndjson::{encode_line, parse_line, NdjsonError};
