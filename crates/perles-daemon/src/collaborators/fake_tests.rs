use super::*;

#[tokio::test]
async fn tracker_creates_sequential_epic_ids() {
    let tracker = FakeTrackerExecutor::new();
    let first = tracker.create_epic("a", "desc").await.unwrap();
    let second = tracker.create_epic("b", "desc").await.unwrap();
    assert_ne!(first, second);
    assert_eq!(tracker.created_epics().len(), 2);
}

#[tokio::test]
async fn tracker_records_task_creation_against_its_epic() {
    let tracker = FakeTrackerExecutor::new();
    let epic_id = tracker.create_epic("epic", "desc").await.unwrap();
    tracker.create_task(&epic_id, "task", "desc").await.unwrap();
    let tasks = tracker.created_tasks();
    assert_eq!(tasks[0].0, epic_id);
}

#[tokio::test]
async fn git_executor_defaults_to_no_branches() {
    let git = FakeGitExecutor::new();
    assert!(git.list_branches("/repo").await.unwrap().is_empty());
}

#[tokio::test]
async fn git_executor_rejects_branch_names_with_spaces() {
    let git = FakeGitExecutor::new();
    assert!(!git.validate_branch_name("bad name").await.unwrap());
    assert!(git.validate_branch_name("good-name").await.unwrap());
}
