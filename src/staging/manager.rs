// Staging workflow lifecycle orchestration: create, update, destroy as
// atomic multi-entity mutations over the injected collaborators

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn, Instrument};

use crate::config::StagekeeperConfig;
use crate::staging::errors::WorkflowError;
use crate::staging::traits::{GroupDirectory, ProjectHierarchy, WorkflowRepository};
use crate::staging::types::{
    staging_project_name, Actor, GroupRef, ProjectId, Workflow, WorkflowId,
    DEFAULT_STAGING_LABELS,
};
use crate::telemetry::{generate_correlation_id, lifecycle_span};

/// Orchestrates the staging workflow lifecycle over the group directory, the
/// project hierarchy store and the workflow repository.
///
/// Create and update are transactional: on any failure a compensating
/// rollback restores the pre-call state before the error is returned.
/// Destroy keeps its documented partial-failure contract - a failed workflow
/// row delete leaves the already-processed sub-projects as they are.
pub struct WorkflowLifecycleManager {
    groups: Arc<dyn GroupDirectory>,
    hierarchy: Arc<dyn ProjectHierarchy>,
    repository: Arc<dyn WorkflowRepository>,
    default_labels: Vec<String>,
    // Conflicting operations against the same base project serialize here.
    // Entries are never evicted: removing one while a waiter still holds its
    // Arc would let a second lock be minted for the same project. The table
    // is bounded by the number of base projects ever touched.
    project_locks: Mutex<HashMap<ProjectId, Arc<Mutex<()>>>>,
}

impl WorkflowLifecycleManager {
    pub fn new(
        groups: Arc<dyn GroupDirectory>,
        hierarchy: Arc<dyn ProjectHierarchy>,
        repository: Arc<dyn WorkflowRepository>,
    ) -> Self {
        Self {
            groups,
            hierarchy,
            repository,
            default_labels: DEFAULT_STAGING_LABELS
                .iter()
                .map(|label| label.to_string())
                .collect(),
            project_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Build a manager whose default labels come from configuration
    pub fn from_config(
        config: &StagekeeperConfig,
        groups: Arc<dyn GroupDirectory>,
        hierarchy: Arc<dyn ProjectHierarchy>,
        repository: Arc<dyn WorkflowRepository>,
    ) -> Self {
        Self::new(groups, hierarchy, repository)
            .with_default_labels(config.staging.default_labels.clone())
    }

    /// Override the labels used when create is called without explicit ones
    pub fn with_default_labels(mut self, labels: Vec<String>) -> Self {
        self.default_labels = labels;
        self
    }

    /// Create a staging workflow for the base project: resolve the managers
    /// group, retrieve-or-create one staging sub-project per label, grant the
    /// group on each, then persist the workflow record. If the base project
    /// already has a live workflow it is returned unchanged.
    pub async fn create(
        &self,
        actor: &Actor,
        base_project: ProjectId,
        managers_group_title: &str,
        labels: Option<&[String]>,
    ) -> Result<Workflow, WorkflowError> {
        let correlation_id = generate_correlation_id();
        let span = lifecycle_span("create", None, Some(&correlation_id));
        self.create_inner(actor, base_project, managers_group_title, labels)
            .instrument(span)
            .await
    }

    async fn create_inner(
        &self,
        actor: &Actor,
        base_project: ProjectId,
        managers_group_title: &str,
        labels: Option<&[String]>,
    ) -> Result<Workflow, WorkflowError> {
        let base = self
            .hierarchy
            .find_project(base_project)
            .await?
            .ok_or(WorkflowError::ProjectNotFound {
                project: base_project,
            })?;
        self.authorize(actor, base_project).await?;

        let lock = self.project_lock(base_project).await;
        let _guard = lock.lock().await;

        if let Some(existing) = self.repository.find_for_project(base_project).await? {
            info!(
                workflow = %existing.id,
                project = %base.name,
                "staging workflow already exists, returning it"
            );
            return Ok(existing);
        }

        let group = self.resolve_group(managers_group_title).await?;
        let labels = labels.unwrap_or(&self.default_labels);

        let mut attached = Vec::new();
        let mut created = Vec::new();
        let mut reused = Vec::new();
        for label in labels {
            let name = staging_project_name(&base.name, label);
            let (record, was_created) =
                match self.hierarchy.find_or_create_project(base_project, &name).await {
                    Ok(result) => result,
                    Err(err) => {
                        self.undo_create(&group, &created, &reused).await;
                        return Err(WorkflowError::Backend(err));
                    }
                };
            if was_created {
                created.push(record.id);
            } else {
                reused.push(record.id);
            }
            if let Err(err) = self.hierarchy.grant(group.id, record.id).await {
                self.undo_create(&group, &created, &reused).await;
                return Err(WorkflowError::Backend(err));
            }
            attached.push(record.id);
        }

        let mut workflow = Workflow::new(base_project, group.clone());
        workflow.staging_projects = attached;

        if let Err(err) = self.repository.insert(&workflow).await {
            warn!(
                project = %base.name,
                error = %err,
                "workflow insert failed, rolling back staging projects and grants"
            );
            self.undo_create(&group, &created, &reused).await;
            return Err(WorkflowError::WorkflowPersistenceFailed {
                project: base_project,
            });
        }

        info!(
            workflow = %workflow.id,
            project = %base.name,
            managers_group = %group.title,
            staging_projects = workflow.staging_projects.len(),
            "staging workflow created"
        );
        Ok(workflow)
    }

    /// Look up a workflow by identifier. Absence is a value, not an error.
    pub async fn get(&self, workflow: WorkflowId) -> Result<Option<Workflow>, WorkflowError> {
        Ok(self.repository.find(workflow).await?)
    }

    /// Look up the workflow attached to a base project, if any
    pub async fn find_for_project(
        &self,
        project: ProjectId,
    ) -> Result<Option<Workflow>, WorkflowError> {
        Ok(self.repository.find_for_project(project).await?)
    }

    /// Reassign the managers group: revoke the old grant and install the new
    /// one on every staging sub-project, then persist the new reference. On a
    /// persistence failure the grants are restored so every sub-project still
    /// shows exactly the old group.
    pub async fn update_managers(
        &self,
        actor: &Actor,
        workflow_id: WorkflowId,
        new_group_title: &str,
    ) -> Result<Workflow, WorkflowError> {
        let correlation_id = generate_correlation_id();
        let workflow_field = workflow_id.to_string();
        let span = lifecycle_span("update_managers", Some(&workflow_field), Some(&correlation_id));
        self.update_managers_inner(actor, workflow_id, new_group_title)
            .instrument(span)
            .await
    }

    async fn update_managers_inner(
        &self,
        actor: &Actor,
        workflow_id: WorkflowId,
        new_group_title: &str,
    ) -> Result<Workflow, WorkflowError> {
        let workflow = self
            .repository
            .find(workflow_id)
            .await?
            .ok_or(WorkflowError::WorkflowNotFound {
                workflow: workflow_id,
            })?;
        self.authorize(actor, workflow.project).await?;

        let lock = self.project_lock(workflow.project).await;
        let _guard = lock.lock().await;

        // Reload under the lock so a concurrent update cannot interleave
        let workflow = self
            .repository
            .find(workflow_id)
            .await?
            .ok_or(WorkflowError::WorkflowNotFound {
                workflow: workflow_id,
            })?;

        let new_group = self.resolve_group(new_group_title).await?;
        let old_group = workflow.managers_group.clone();

        for project in &workflow.staging_projects {
            let step = self.reassign_grant(&old_group, &new_group, *project).await;
            if let Err(err) = step {
                self.undo_update(&workflow, &old_group, &new_group).await;
                return Err(WorkflowError::Backend(err));
            }
        }

        let mut updated = workflow.clone();
        updated.managers_group = new_group.clone();

        if let Err(err) = self.repository.update(&updated).await {
            warn!(
                workflow = %workflow.id,
                error = %err,
                "workflow update failed, restoring the previous managers group"
            );
            self.undo_update(&workflow, &old_group, &new_group).await;
            return Err(WorkflowError::WorkflowPersistenceFailed {
                project: workflow.project,
            });
        }

        info!(
            workflow = %updated.id,
            old_group = %old_group.title,
            new_group = %new_group.title,
            "managers group reassigned"
        );
        Ok(updated)
    }

    /// Tear the workflow down. Selected sub-projects are deleted from the
    /// hierarchy store; the remainder are demoted to ordinary sub-projects of
    /// the base (their grants are left untouched). The workflow record is
    /// deleted last - if that delete fails the sub-project work done before
    /// it is not rolled back.
    pub async fn destroy(
        &self,
        actor: &Actor,
        workflow_id: WorkflowId,
        selected: &[ProjectId],
    ) -> Result<(), WorkflowError> {
        let correlation_id = generate_correlation_id();
        let workflow_field = workflow_id.to_string();
        let span = lifecycle_span("destroy", Some(&workflow_field), Some(&correlation_id));
        self.destroy_inner(actor, workflow_id, selected)
            .instrument(span)
            .await
    }

    async fn destroy_inner(
        &self,
        actor: &Actor,
        workflow_id: WorkflowId,
        selected: &[ProjectId],
    ) -> Result<(), WorkflowError> {
        let workflow = self
            .repository
            .find(workflow_id)
            .await?
            .ok_or(WorkflowError::WorkflowNotFound {
                workflow: workflow_id,
            })?;
        self.authorize(actor, workflow.project).await?;

        let lock = self.project_lock(workflow.project).await;
        let _guard = lock.lock().await;

        let workflow = self
            .repository
            .find(workflow_id)
            .await?
            .ok_or(WorkflowError::WorkflowNotFound {
                workflow: workflow_id,
            })?;

        // Selected ids that are not attached to this workflow are ignored
        let selected: HashSet<ProjectId> = selected.iter().copied().collect();
        let mut deleted = 0usize;
        let mut demoted = 0usize;
        for project in &workflow.staging_projects {
            if selected.contains(project) {
                self.hierarchy.delete_project(*project).await?;
                deleted += 1;
            } else {
                self.hierarchy.demote_to_subproject(*project).await?;
                demoted += 1;
            }
        }

        if let Err(err) = self.repository.delete(workflow.id).await {
            warn!(
                workflow = %workflow.id,
                error = %err,
                deleted,
                demoted,
                "workflow delete failed after sub-projects were processed"
            );
            return Err(WorkflowError::WorkflowDestroyFailed {
                workflow: workflow.id,
            });
        }

        info!(
            workflow = %workflow.id,
            deleted,
            demoted,
            "staging workflow destroyed"
        );
        Ok(())
    }

    async fn authorize(&self, actor: &Actor, project: ProjectId) -> Result<(), WorkflowError> {
        if actor.admin || self.hierarchy.is_maintainer(actor, project).await? {
            Ok(())
        } else {
            Err(WorkflowError::Unauthorized {
                login: actor.login.clone(),
            })
        }
    }

    async fn resolve_group(&self, title: &str) -> Result<GroupRef, WorkflowError> {
        self.groups
            .resolve_group(title)
            .await?
            .ok_or_else(|| WorkflowError::GroupNotFound {
                title: title.to_string(),
            })
    }

    async fn reassign_grant(
        &self,
        old_group: &GroupRef,
        new_group: &GroupRef,
        project: ProjectId,
    ) -> anyhow::Result<()> {
        self.hierarchy.revoke(old_group.id, project).await?;
        self.hierarchy.grant(new_group.id, project).await?;
        Ok(())
    }

    // Compensation for a failed create: drop every grant made by this call,
    // delete the sub-projects it created and demote the ones it merely
    // reused back to ordinary sub-projects. Secondary failures are logged,
    // not surfaced - the primary error already describes the operation.
    async fn undo_create(&self, group: &GroupRef, created: &[ProjectId], reused: &[ProjectId]) {
        for project in created.iter().chain(reused) {
            if let Err(err) = self.hierarchy.revoke(group.id, *project).await {
                warn!(project = %project, error = %err, "rollback revoke failed");
            }
        }
        for project in created {
            if let Err(err) = self.hierarchy.delete_project(*project).await {
                warn!(project = %project, error = %err, "rollback delete failed");
            }
        }
        for project in reused {
            if let Err(err) = self.hierarchy.demote_to_subproject(*project).await {
                warn!(project = %project, error = %err, "rollback demote failed");
            }
        }
    }

    // Compensation for a failed update: normalize every staging sub-project
    // back to exactly the old grant. Grants are sets, so re-granting on a
    // project the loop never reached is harmless.
    async fn undo_update(&self, workflow: &Workflow, old_group: &GroupRef, new_group: &GroupRef) {
        for project in &workflow.staging_projects {
            if let Err(err) = self.hierarchy.revoke(new_group.id, *project).await {
                warn!(project = %project, error = %err, "rollback revoke failed");
            }
            if let Err(err) = self.hierarchy.grant(old_group.id, *project).await {
                warn!(project = %project, error = %err, "rollback grant failed");
            }
        }
    }

    async fn project_lock(&self, project: ProjectId) -> Arc<Mutex<()>> {
        let mut locks = self.project_locks.lock().await;
        locks
            .entry(project)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
