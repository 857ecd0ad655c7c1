use thiserror::Error;

use crate::staging::types::{ProjectId, WorkflowId};

/// Typed failures surfaced by the lifecycle manager. Every failure is a
/// terminal result for the invocation; the manager never retries.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The group directory has no group with this title. Nothing was changed.
    #[error("managers group {title} couldn't be found")]
    GroupNotFound { title: String },

    /// The hierarchy store has no project with this identifier.
    #[error("project {project} couldn't be found")]
    ProjectNotFound { project: ProjectId },

    /// No workflow exists for the given identifier (update/destroy paths).
    #[error("staging workflow {workflow} couldn't be found")]
    WorkflowNotFound { workflow: WorkflowId },

    /// Persisting the workflow record failed; the compensating rollback ran
    /// and the system state matches the state before the call.
    #[error("staging workflow for project {project} couldn't be saved")]
    WorkflowPersistenceFailed { project: ProjectId },

    /// Deleting the workflow record failed. Sub-project deletions and
    /// demotions performed earlier in the same call are not rolled back.
    #[error("staging workflow {workflow} couldn't be deleted")]
    WorkflowDestroyFailed { workflow: WorkflowId },

    /// The actor may not manage staging for this project.
    #[error("{login} is not allowed to manage staging workflows here")]
    Unauthorized { login: String },

    /// A collaborator call failed (group directory, hierarchy store or
    /// repository I/O).
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}
