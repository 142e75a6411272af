// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::workflow::WorkflowId;

fn sample(event_type: EventType, workflow_id: WorkflowId) -> ControlPlaneEvent {
    ControlPlaneEvent {
        event_type,
        timestamp: Utc::now(),
        workflow_id,
        template_id: None,
        name: None,
        state: None,
        process_id: None,
        task_id: None,
        payload: Value::Null,
    }
}

#[test]
fn output_and_token_usage_are_droppable() {
    assert!(EventType::ProcessOutput.is_droppable());
    assert!(EventType::ProcessTokenUsage.is_droppable());
    assert!(!EventType::ProcessError.is_droppable());
    assert!(!EventType::WorkflowCompleted.is_droppable());
}

#[test]
fn process_event_type_maps_to_control_plane_event_type() {
    assert_eq!(
        EventType::from_process_event_type(&ProcessEventType::WorkflowComplete),
        EventType::WorkflowCompleted
    );
    assert_eq!(
        EventType::from_process_event_type(&ProcessEventType::Unknown("x".into())),
        EventType::Unknown
    );
}

#[test]
fn process_constructor_carries_the_process_id_and_payload() {
    let wf = WorkflowId::new();
    let process_id = crate::process::ProcessId::new();
    let event = ControlPlaneEvent::process(
        EventType::ProcessReady,
        wf.clone(),
        process_id.clone(),
        serde_json::json!({"phase": "plan"}),
        Utc::now(),
    );
    assert_eq!(event.workflow_id, wf);
    assert_eq!(event.process_id, Some(process_id));
    assert!(event.template_id.is_none());
    assert_eq!(event.payload["phase"], "plan");
}

#[test]
fn health_constructor_carries_no_process_or_template_identity() {
    let wf = WorkflowId::new();
    let event = ControlPlaneEvent::health(EventType::HealthStuckSuspected, wf.clone(), Utc::now());
    assert_eq!(event.workflow_id, wf);
    assert!(event.process_id.is_none());
    assert!(event.template_id.is_none());
    assert_eq!(event.payload, Value::Null);
}

#[test]
fn empty_filter_matches_everything() {
    let filter = EventFilter::default();
    let event = sample(EventType::ProcessOutput, WorkflowId::new());
    assert!(filter.matches(&event));
}

#[test]
fn type_filter_excludes_non_matching_types() {
    let filter = EventFilter {
        types: vec![EventType::WorkflowCompleted],
        ..Default::default()
    };
    assert!(!filter.matches(&sample(EventType::ProcessOutput, WorkflowId::new())));
    assert!(filter.matches(&sample(EventType::WorkflowCompleted, WorkflowId::new())));
}

#[test]
fn workflow_filter_excludes_other_workflows() {
    let wf = WorkflowId::new();
    let filter = EventFilter {
        workflow_ids: vec![wf.clone()],
        ..Default::default()
    };
    assert!(filter.matches(&sample(EventType::ProcessOutput, wf)));
    assert!(!filter.matches(&sample(EventType::ProcessOutput, WorkflowId::new())));
}

#[test]
fn exclude_types_applied_after_include_check() {
    let wf = WorkflowId::new();
    let filter = EventFilter {
        exclude_types: vec![EventType::ProcessOutput],
        ..Default::default()
    };
    assert!(!filter.matches(&sample(EventType::ProcessOutput, wf.clone())));
    assert!(filter.matches(&sample(EventType::ProcessError, wf)));
}
