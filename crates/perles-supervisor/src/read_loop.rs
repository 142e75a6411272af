// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-child read loop: turns a line of stdout into a `SupervisedLine` and
//! applies the supervisor's backpressure policy (§4.2).
//!
//! Malformed JSON is routed to a sideband rather than dropped silently or
//! treated as fatal — the supervisor keeps running.

use perles_core::{ProcessEvent, ScopedProcessEvent, WorkflowId};
use perles_wire::NdjsonError;
use tokio::sync::mpsc;

/// What the read loop hands to its consumer for each line of stdout.
#[derive(Debug, Clone)]
pub enum SupervisedLine {
    Event(ScopedProcessEvent),
    ParseError { workflow_id: WorkflowId, raw: String, error: String },
}

/// Feed one raw stdout line into the channel, applying backpressure
/// semantics (§4.2): a parsed `Output` event may be dropped if the channel
/// is full; every other event type blocks until the consumer catches up.
///
/// Returns `true` if the line was delivered (or intentionally dropped under
/// backpressure), `false` if the channel is closed and the read loop should
/// stop.
pub async fn feed_line(
    workflow_id: &WorkflowId,
    raw_line: &str,
    tx: &mpsc::Sender<SupervisedLine>,
) -> bool {
    let message = match perles_wire::parse_line(raw_line) {
        Ok(event) => SupervisedLine::Event(ScopedProcessEvent { workflow_id: workflow_id.clone(), event }),
        Err(NdjsonError::Malformed(err)) => {
            SupervisedLine::ParseError { workflow_id: workflow_id.clone(), raw: raw_line.to_string(), error: err.to_string() }
        }
    };

    if let SupervisedLine::Event(scoped) = &message {
        if is_droppable(&scoped.event) {
            return match tx.try_send(message) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => true,
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            };
        }
    }

    tx.send(message).await.is_ok()
}

fn is_droppable(event: &ProcessEvent) -> bool {
    event.event_type.is_droppable_under_process_backpressure()
}

#[cfg(test)]
#[path = "read_loop_tests.rs"]
mod tests;
