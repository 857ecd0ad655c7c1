// Fake collaborators for testing - no real backends, every call is recorded

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use tokio::sync::Mutex;

use crate::staging::traits::{GroupDirectory, ProjectHierarchy};
use crate::staging::types::{Actor, GroupId, GroupRef, ProjectId, ProjectRecord};

/// Calls performed against the fake hierarchy, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HierarchyOp {
    FindOrCreate { name: String },
    Delete { project: ProjectId },
    Demote { project: ProjectId },
    Grant { group: GroupId, project: ProjectId },
    Revoke { group: GroupId, project: ProjectId },
}

/// Group directory fake seeded with known groups
#[derive(Debug, Default)]
pub struct RecordingGroupDirectory {
    groups: Mutex<HashMap<String, GroupRef>>,
    lookups: Mutex<Vec<String>>,
}

impl RecordingGroupDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group and return its reference
    pub async fn add_group(&self, title: &str) -> GroupRef {
        let group = GroupRef {
            id: GroupId::new(),
            title: title.to_string(),
        };
        self.groups
            .lock()
            .await
            .insert(title.to_string(), group.clone());
        group
    }

    pub async fn lookups(&self) -> Vec<String> {
        self.lookups.lock().await.clone()
    }
}

#[async_trait]
impl GroupDirectory for RecordingGroupDirectory {
    async fn resolve_group(&self, title: &str) -> Result<Option<GroupRef>> {
        self.lookups.lock().await.push(title.to_string());
        Ok(self.groups.lock().await.get(title).cloned())
    }
}

/// Project hierarchy fake: projects live in a map, grants are plain sets,
/// maintainer rights are seeded per project
#[derive(Debug, Default)]
pub struct RecordingProjectHierarchy {
    projects: Mutex<HashMap<ProjectId, ProjectRecord>>,
    maintainers: Mutex<HashSet<(String, ProjectId)>>,
    ops: Mutex<Vec<HierarchyOp>>,
}

impl RecordingProjectHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a top-level project and return its record
    pub async fn seed_project(&self, name: &str) -> ProjectRecord {
        self.seed_nested_project(name, None).await
    }

    /// Seed a project nested under an existing parent
    pub async fn seed_subproject(&self, name: &str, parent: ProjectId) -> ProjectRecord {
        self.seed_nested_project(name, Some(parent)).await
    }

    async fn seed_nested_project(&self, name: &str, parent: Option<ProjectId>) -> ProjectRecord {
        let record = ProjectRecord {
            id: ProjectId::new(),
            name: name.to_string(),
            parent,
            staging: false,
            access_groups: BTreeSet::new(),
        };
        self.projects
            .lock()
            .await
            .insert(record.id, record.clone());
        record
    }

    /// Grant the actor maintainer rights on a project
    pub async fn add_maintainer(&self, login: &str, project: ProjectId) {
        self.maintainers
            .lock()
            .await
            .insert((login.to_string(), project));
    }

    pub async fn project(&self, project: ProjectId) -> Option<ProjectRecord> {
        self.projects.lock().await.get(&project).cloned()
    }

    pub async fn project_by_name(&self, name: &str) -> Option<ProjectRecord> {
        self.projects
            .lock()
            .await
            .values()
            .find(|record| record.name == name)
            .cloned()
    }

    /// Projects nested under the given parent, sorted by name
    pub async fn subprojects(&self, parent: ProjectId) -> Vec<ProjectRecord> {
        let mut records: Vec<ProjectRecord> = self
            .projects
            .lock()
            .await
            .values()
            .filter(|record| record.parent == Some(parent))
            .cloned()
            .collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records
    }

    pub async fn project_count(&self) -> usize {
        self.projects.lock().await.len()
    }

    pub async fn recorded_ops(&self) -> Vec<HierarchyOp> {
        self.ops.lock().await.clone()
    }

    pub async fn clear_recorded_ops(&self) {
        self.ops.lock().await.clear();
    }

    async fn record(&self, op: HierarchyOp) {
        self.ops.lock().await.push(op);
    }
}

#[async_trait]
impl ProjectHierarchy for RecordingProjectHierarchy {
    async fn find_project(&self, project: ProjectId) -> Result<Option<ProjectRecord>> {
        Ok(self.projects.lock().await.get(&project).cloned())
    }

    async fn find_or_create_project(
        &self,
        parent: ProjectId,
        name: &str,
    ) -> Result<(ProjectRecord, bool)> {
        self.record(HierarchyOp::FindOrCreate {
            name: name.to_string(),
        })
        .await;

        let mut projects = self.projects.lock().await;
        if !projects.contains_key(&parent) {
            return Err(anyhow!("parent project {parent} does not exist"));
        }

        if let Some(existing) = projects.values_mut().find(|record| record.name == name) {
            existing.staging = true;
            return Ok((existing.clone(), false));
        }

        let record = ProjectRecord {
            id: ProjectId::new(),
            name: name.to_string(),
            parent: Some(parent),
            staging: true,
            access_groups: BTreeSet::new(),
        };
        projects.insert(record.id, record.clone());
        Ok((record, true))
    }

    async fn delete_project(&self, project: ProjectId) -> Result<()> {
        self.record(HierarchyOp::Delete { project }).await;
        match self.projects.lock().await.remove(&project) {
            Some(_) => Ok(()),
            None => Err(anyhow!("project {project} does not exist")),
        }
    }

    async fn demote_to_subproject(&self, project: ProjectId) -> Result<()> {
        self.record(HierarchyOp::Demote { project }).await;
        match self.projects.lock().await.get_mut(&project) {
            Some(record) => {
                record.staging = false;
                Ok(())
            }
            None => Err(anyhow!("project {project} does not exist")),
        }
    }

    async fn grant(&self, group: GroupId, project: ProjectId) -> Result<()> {
        self.record(HierarchyOp::Grant { group, project }).await;
        match self.projects.lock().await.get_mut(&project) {
            Some(record) => {
                record.access_groups.insert(group);
                Ok(())
            }
            None => Err(anyhow!("project {project} does not exist")),
        }
    }

    async fn revoke(&self, group: GroupId, project: ProjectId) -> Result<()> {
        self.record(HierarchyOp::Revoke { group, project }).await;
        match self.projects.lock().await.get_mut(&project) {
            Some(record) => {
                record.access_groups.remove(&group);
                Ok(())
            }
            None => Err(anyhow!("project {project} does not exist")),
        }
    }

    async fn is_maintainer(&self, actor: &Actor, project: ProjectId) -> Result<bool> {
        Ok(self
            .maintainers
            .lock()
            .await
            .contains(&(actor.login.clone(), project)))
    }
}
