// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child-process wire format: one `ProcessEvent` per newline on stdout
//! (§6.2). Parsing and classification live on `perles_core::ProcessEvent`
//! itself; this module only frames lines.

use perles_core::ProcessEvent;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NdjsonError {
    #[error("malformed NDJSON line: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Parse a single line of child-process stdout into a `ProcessEvent`.
///
/// Blank lines (trailing newline, inter-line padding) are not events and
/// are the caller's responsibility to skip before calling this.
pub fn parse_line(line: &str) -> Result<ProcessEvent, NdjsonError> {
    Ok(serde_json::from_str(line)?)
}

/// Serialize a `ProcessEvent` back to its single-line wire form, for test
/// fakes that emulate a child process.
pub fn encode_line(event: &ProcessEvent) -> Result<String, NdjsonError> {
    Ok(serde_json::to_string(event)?)
}

#[cfg(test)]
#[path = "ndjson_tests.rs"]
mod tests;
