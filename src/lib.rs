// Stagekeeper - staging workflow lifecycle management
// This exposes the core components for testing and integration

pub mod config;
pub mod staging;
pub mod telemetry;

// Re-export key types for easy access
pub use crate::config::{config, init_config, StagekeeperConfig};
pub use staging::{
    Actor, GroupDirectory, GroupId, GroupRef, HierarchyOp, InMemoryWorkflowRepository, ProjectHierarchy,
    ProjectId, ProjectRecord, RecordingGroupDirectory, RecordingProjectHierarchy, Workflow,
    WorkflowError, WorkflowId, WorkflowLifecycleManager, WorkflowRepository,
};
pub use telemetry::{generate_correlation_id, init_telemetry, lifecycle_span};
