// Core types for the staging workflow lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Identifier of a staging workflow record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkflowId(Uuid);

/// Identifier of a project in the hierarchy store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId(Uuid);

/// Identifier of a group in the group directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(Uuid);

macro_rules! impl_id {
    ($name:ident) => {
        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

impl_id!(WorkflowId);
impl_id!(ProjectId);
impl_id!(GroupId);

/// Labels used when a caller does not name the staging sandboxes explicitly
pub const DEFAULT_STAGING_LABELS: [&str; 2] = ["A", "B"];

/// Staging sub-projects follow the `<base>:Staging:<label>` convention
pub fn staging_project_name(base: &str, label: &str) -> String {
    format!("{base}:Staging:{label}")
}

/// Extract the label from a staging sub-project name, if it follows the
/// convention under the given base project
pub fn staging_label<'a>(base: &str, name: &'a str) -> Option<&'a str> {
    let rest = name.strip_prefix(base)?;
    let label = rest.strip_prefix(":Staging:")?;
    if label.is_empty() {
        None
    } else {
        Some(label)
    }
}

/// Resolved group identity returned by the group directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: GroupId,
    pub title: String,
}

/// The caller on whose behalf a lifecycle operation runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub login: String,
    pub admin: bool,
}

impl Actor {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            admin: false,
        }
    }

    pub fn admin(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            admin: true,
        }
    }
}

/// The coordination record binding a base project, a managers group and a set
/// of staging sub-projects. At most one live workflow exists per base project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: WorkflowId,
    pub project: ProjectId,
    pub managers_group: GroupRef,
    /// Attached staging sub-projects, in attachment order. Every entry is
    /// nested under `project` in the hierarchy store.
    pub staging_projects: Vec<ProjectId>,
    pub created_at: DateTime<Utc>,
}

impl Workflow {
    pub fn new(project: ProjectId, managers_group: GroupRef) -> Self {
        Self {
            id: WorkflowId::new(),
            project,
            managers_group,
            staging_projects: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// The hierarchy store's view of a project entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRecord {
    pub id: ProjectId,
    pub name: String,
    pub parent: Option<ProjectId>,
    /// Whether the project is currently tracked as a staging sandbox
    pub staging: bool,
    /// Groups with a grant on this project
    pub access_groups: BTreeSet<GroupId>,
}
