use perles_core::{Namespace, TemplateId, WorktreeMode};

use super::*;
use crate::collaborators::fake::FakeTrackerExecutor;

fn spec(epic_id: Option<EpicId>) -> WorkflowSpec {
    WorkflowSpec {
        template_id: TemplateId::from_string("tpl-cook"),
        name: Some("my workflow".to_string()),
        epic_id,
        initial_prompt: "ship the feature".to_string(),
        worktree_mode: WorktreeMode::None,
    }
}

fn registration() -> Registration {
    Registration {
        template_id: TemplateId::from_string("tpl-cook"),
        namespace: Namespace::Workflow,
        display_name: "Cook".to_string(),
        prompt_body: "Goal: {{goal}}".to_string(),
        required_args: vec!["goal".to_string()],
    }
}

#[tokio::test]
async fn standard_template_delegates_epic_creation_to_tracker() {
    let tracker = FakeTrackerExecutor::new();
    let creator = WorkflowCreator::new(tracker.as_ref());
    let mut args = BTreeMap::new();
    args.insert("goal".to_string(), "ship the feature".to_string());

    let created = creator.create(&spec(None), &registration(), &args).await.unwrap();

    assert_eq!(tracker.created_epics().len(), 1);
    assert!(created.initial_prompt.contains("ship the feature"));
}

#[tokio::test]
async fn epic_driven_template_uses_supplied_epic_id_verbatim() {
    let tracker = FakeTrackerExecutor::new();
    let creator = WorkflowCreator::new(tracker.as_ref());
    let supplied = EpicId::from_string("epc-existing");
    let mut args = BTreeMap::new();
    args.insert("goal".to_string(), "ship the feature".to_string());

    let created = creator
        .create(&spec(Some(supplied.clone())), &registration(), &args)
        .await
        .unwrap();

    assert_eq!(created.epic_id, supplied);
    assert!(tracker.created_epics().is_empty());
}

#[tokio::test]
async fn missing_required_arg_fails_fast_without_touching_the_tracker() {
    let tracker = FakeTrackerExecutor::new();
    let creator = WorkflowCreator::new(tracker.as_ref());
    let args = BTreeMap::new();

    let err = creator.create(&spec(None), &registration(), &args).await.unwrap_err();

    assert!(matches!(err, WorkflowCreationError::Validation(_)));
}
