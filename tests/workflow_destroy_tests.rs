//! Tests for staging workflow teardown (src/staging/manager.rs)
//! Testing library/framework: Rust built-in test framework with Tokio async runtime (#[tokio::test]).
//! Destroy deletes the selected sub-projects, demotes the rest to ordinary
//! sub-projects of the base, then drops the workflow record itself.

use std::sync::Arc;

use stagekeeper::{
    Actor, GroupRef, InMemoryWorkflowRepository, ProjectId, ProjectRecord,
    RecordingGroupDirectory, RecordingProjectHierarchy, Workflow, WorkflowError, WorkflowId,
    WorkflowLifecycleManager,
};

struct World {
    manager: WorkflowLifecycleManager,
    hierarchy: Arc<RecordingProjectHierarchy>,
    repository: Arc<InMemoryWorkflowRepository>,
    actor: Actor,
    base: ProjectRecord,
    workflow: Workflow,
    group: GroupRef,
}

async fn world_with_workflow() -> World {
    let groups = Arc::new(RecordingGroupDirectory::new());
    let hierarchy = Arc::new(RecordingProjectHierarchy::new());
    let repository = Arc::new(InMemoryWorkflowRepository::new());
    let base = hierarchy.seed_project("home:tom").await;
    hierarchy.add_maintainer("tom", base.id).await;
    let actor = Actor::new("tom");
    let group = groups.add_group("factory-staging").await;
    let manager = WorkflowLifecycleManager::new(
        groups.clone(),
        hierarchy.clone(),
        repository.clone(),
    );
    let workflow = manager
        .create(&actor, base.id, "factory-staging", None)
        .await
        .expect("create");
    World {
        manager,
        hierarchy,
        repository,
        actor,
        base,
        workflow,
        group,
    }
}

#[tokio::test]
async fn destroying_everything_leaves_the_base_project_without_subprojects() {
    let w = world_with_workflow().await;

    w.manager
        .destroy(&w.actor, w.workflow.id, &w.workflow.staging_projects)
        .await
        .expect("destroy");

    assert!(w.repository.is_empty().await);
    assert!(w.hierarchy.subprojects(w.base.id).await.is_empty());
    assert_eq!(w.hierarchy.project_count().await, 1);
}

#[tokio::test]
async fn selective_destroy_demotes_the_remainder_to_a_plain_subproject() {
    let w = world_with_workflow().await;
    let selected = vec![w.workflow.staging_projects[0]];
    let kept = w.workflow.staging_projects[1];

    w.manager
        .destroy(&w.actor, w.workflow.id, &selected)
        .await
        .expect("destroy");

    assert!(w.repository.is_empty().await);
    assert!(w.hierarchy.project(selected[0]).await.is_none());

    let survivor = w.hierarchy.project(kept).await.expect("kept project");
    assert_eq!(survivor.parent, Some(w.base.id));
    assert!(!survivor.staging);
    // Teardown does not revoke the managers grant on demoted projects
    assert!(survivor.access_groups.contains(&w.group.id));

    let subprojects = w.hierarchy.subprojects(w.base.id).await;
    assert_eq!(subprojects.len(), 1);
    assert_eq!(subprojects[0].name, "home:tom:Staging:B");
}

#[tokio::test]
async fn failed_workflow_delete_keeps_the_partial_teardown_state() {
    let w = world_with_workflow().await;
    let selected = vec![w.workflow.staging_projects[0]];
    let kept = w.workflow.staging_projects[1];
    w.repository.set_fail_writes(true);

    let err = w
        .manager
        .destroy(&w.actor, w.workflow.id, &selected)
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::WorkflowDestroyFailed { .. }));
    // The sub-project work is not rolled back: the selected project is gone,
    // the remainder is already demoted, and the workflow row still exists.
    assert!(w.hierarchy.project(selected[0]).await.is_none());
    let survivor = w.hierarchy.project(kept).await.expect("kept project");
    assert!(!survivor.staging);
    assert_eq!(w.repository.len().await, 1);
}

#[tokio::test]
async fn selected_ids_not_attached_to_the_workflow_are_ignored() {
    let w = world_with_workflow().await;
    let unrelated = w.hierarchy.seed_project("home:alice").await;
    let selected = vec![unrelated.id, ProjectId::new()];

    w.manager
        .destroy(&w.actor, w.workflow.id, &selected)
        .await
        .expect("destroy");

    assert!(w.repository.is_empty().await);
    // Nothing was selected that belongs to the workflow, so both sandboxes
    // survive as demoted sub-projects and the unrelated project is untouched
    assert_eq!(w.hierarchy.subprojects(w.base.id).await.len(), 2);
    assert!(w.hierarchy.project(unrelated.id).await.is_some());
}

#[tokio::test]
async fn destroy_against_an_unknown_workflow_fails() {
    let w = world_with_workflow().await;

    let err = w
        .manager
        .destroy(&w.actor, WorkflowId::new(), &[])
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::WorkflowNotFound { .. }));
    assert_eq!(w.repository.len().await, 1);
}

#[tokio::test]
async fn destroy_requires_maintainer_rights() {
    let w = world_with_workflow().await;

    let err = w
        .manager
        .destroy(&Actor::new("eve"), w.workflow.id, &w.workflow.staging_projects)
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::Unauthorized { .. }));
    assert_eq!(w.repository.len().await, 1);
    assert_eq!(w.hierarchy.subprojects(w.base.id).await.len(), 2);
}
