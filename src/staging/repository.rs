// In-memory workflow repository - the reference store used by tests and by
// embedders that do not bring their own persistence

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use crate::staging::traits::WorkflowRepository;
use crate::staging::types::{ProjectId, Workflow, WorkflowId};

/// Workflow store backed by a map, enforcing at most one live workflow per
/// base project. Writes can be made to fail on demand so callers can exercise
/// the persistence-failure paths.
#[derive(Debug, Default)]
pub struct InMemoryWorkflowRepository {
    workflows: Mutex<HashMap<WorkflowId, Workflow>>,
    fail_writes: AtomicBool,
}

impl InMemoryWorkflowRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every subsequent insert/update/delete fails
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.workflows.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.workflows.lock().await.is_empty()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(anyhow!("workflow store rejected the write"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl WorkflowRepository for InMemoryWorkflowRepository {
    async fn find(&self, workflow: WorkflowId) -> Result<Option<Workflow>> {
        Ok(self.workflows.lock().await.get(&workflow).cloned())
    }

    async fn find_for_project(&self, project: ProjectId) -> Result<Option<Workflow>> {
        Ok(self
            .workflows
            .lock()
            .await
            .values()
            .find(|workflow| workflow.project == project)
            .cloned())
    }

    async fn insert(&self, workflow: &Workflow) -> Result<()> {
        self.check_writable()?;
        let mut workflows = self.workflows.lock().await;
        if workflows.values().any(|existing| existing.project == workflow.project) {
            return Err(anyhow!(
                "project {} already has a staging workflow",
                workflow.project
            ));
        }
        workflows.insert(workflow.id, workflow.clone());
        Ok(())
    }

    async fn update(&self, workflow: &Workflow) -> Result<()> {
        self.check_writable()?;
        let mut workflows = self.workflows.lock().await;
        match workflows.get_mut(&workflow.id) {
            Some(stored) => {
                *stored = workflow.clone();
                Ok(())
            }
            None => Err(anyhow!("workflow {} is not stored", workflow.id)),
        }
    }

    async fn delete(&self, workflow: WorkflowId) -> Result<()> {
        self.check_writable()?;
        match self.workflows.lock().await.remove(&workflow) {
            Some(_) => Ok(()),
            None => Err(anyhow!("workflow {} is not stored", workflow)),
        }
    }
}
