// Staging workflow lifecycle management

pub mod errors;
pub mod fakes;
pub mod manager;
pub mod repository;
pub mod traits;
pub mod types;

pub use errors::WorkflowError;
pub use fakes::{HierarchyOp, RecordingGroupDirectory, RecordingProjectHierarchy};
pub use manager::WorkflowLifecycleManager;
pub use repository::InMemoryWorkflowRepository;
pub use traits::{GroupDirectory, ProjectHierarchy, WorkflowRepository};
pub use types::{
    staging_label, staging_project_name, Actor, GroupId, GroupRef, ProjectId, ProjectRecord,
    Workflow, WorkflowId, DEFAULT_STAGING_LABELS,
};
