// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! perles-core: domain types for the Perles control plane.
//!
//! Pure value types and state machines only — no I/O, no storage engine, no
//! process spawning. Collaborators that need those live in their own
//! crates and depend on this one (§9 design note, "domain vs
//! infrastructure" split).

pub mod macros;

pub mod clock;
pub mod error;
pub mod event;
pub mod health;
pub mod process;
pub mod registration;
pub mod session;
pub mod workflow;

pub use clock::{Clock, FakeClock, SystemClock};
pub use error::{ConflictError, ExternalError, InternalError, NotFoundError, ValidationError, WorkflowError};
pub use event::{ControlPlaneEvent, EventFilter, EventType};
pub use health::{HealthEvent, HealthPolicy, HealthStatus, RecoveryAction};
pub use process::{ProcessEvent, ProcessEventType, ProcessId, ProcessRole, ScopedProcessEvent, WorkerId};
pub use registration::{Namespace, Registration};
pub use session::{Session, SessionGuid};
pub use workflow::{
    EpicId, TemplateId, TransitionError, WorkflowDescriptor, WorkflowId, WorkflowSpec, WorkflowState,
    WorktreeMode,
};
