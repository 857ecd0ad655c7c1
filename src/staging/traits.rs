// Capability interfaces for the lifecycle manager's collaborators -
// separating concerns for testability

use anyhow::Result;
use async_trait::async_trait;

use crate::staging::types::{Actor, GroupId, GroupRef, ProjectId, ProjectRecord, Workflow, WorkflowId};

/// Resolves human-readable group titles to group identities
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    /// Look up a group by title. `None` means the directory has no such group.
    async fn resolve_group(&self, title: &str) -> Result<Option<GroupRef>>;
}

/// The project hierarchy store: creates, nests, deletes and permissions
/// project entities. The manager never owns these entities, it orchestrates
/// them through this interface.
#[async_trait]
pub trait ProjectHierarchy: Send + Sync {
    /// Fetch a project by identifier
    async fn find_project(&self, project: ProjectId) -> Result<Option<ProjectRecord>>;

    /// Retrieve the project with this name, or create it nested under
    /// `parent` as a staging sandbox. The flag reports whether the project
    /// was created by this call.
    async fn find_or_create_project(
        &self,
        parent: ProjectId,
        name: &str,
    ) -> Result<(ProjectRecord, bool)>;

    /// Delete a project entirely; it ceases to exist
    async fn delete_project(&self, project: ProjectId) -> Result<()>;

    /// Clear a project's staging status. It survives as an ordinary
    /// sub-project of its parent; existing grants are left in place.
    async fn demote_to_subproject(&self, project: ProjectId) -> Result<()>;

    /// Grant a group access on a project
    async fn grant(&self, group: GroupId, project: ProjectId) -> Result<()>;

    /// Revoke a group's access on a project
    async fn revoke(&self, group: GroupId, project: ProjectId) -> Result<()>;

    /// Whether the actor holds maintainer rights on the project
    async fn is_maintainer(&self, actor: &Actor, project: ProjectId) -> Result<bool>;
}

/// Persists workflow records keyed by base project, enforcing the
/// one-workflow-per-project invariant
#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    async fn find(&self, workflow: WorkflowId) -> Result<Option<Workflow>>;

    async fn find_for_project(&self, project: ProjectId) -> Result<Option<Workflow>>;

    /// Insert a new workflow. Fails if the base project already has one.
    async fn insert(&self, workflow: &Workflow) -> Result<()>;

    /// Persist changes to an existing workflow
    async fn update(&self, workflow: &Workflow) -> Result<()>;

    /// Delete a workflow record
    async fn delete(&self, workflow: WorkflowId) -> Result<()>;
}
