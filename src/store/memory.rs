use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{DefinitionFilter, DefinitionRepository, ExecutionRepository, StoreError};
use crate::execution::Execution;
use crate::model::Definition;

/// In-memory definition store.
#[derive(Default)]
pub struct MemoryDefinitionStore {
    data: RwLock<HashMap<String, Definition>>,
}

impl MemoryDefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or replace a definition. Definitions are immutable templates;
    /// replacing one models publishing a new version.
    pub async fn insert(&self, definition: Definition) {
        self.data
            .write()
            .await
            .insert(definition.id.clone(), definition);
    }
}

#[async_trait]
impl DefinitionRepository for MemoryDefinitionStore {
    async fn get_by_id(&self, id: &str) -> Result<Option<Definition>, StoreError> {
        Ok(self.data.read().await.get(id).cloned())
    }

    async fn list(&self, filter: DefinitionFilter) -> Result<Vec<Definition>, StoreError> {
        let data = self.data.read().await;
        let mut definitions: Vec<Definition> = data
            .values()
            .filter(|definition| {
                filter
                    .status
                    .map(|status| definition.status == status)
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        definitions.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(definitions)
    }
}

/// In-memory execution store. The write lock makes each replace atomic.
#[derive(Default)]
pub struct MemoryExecutionStore {
    data: RwLock<HashMap<String, Execution>>,
}

impl MemoryExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutionRepository for MemoryExecutionStore {
    async fn create(&self, execution: Execution) -> Result<(), StoreError> {
        let mut data = self.data.write().await;
        if data.contains_key(&execution.id) {
            return Err(StoreError::Conflict(execution.id));
        }
        data.insert(execution.id.clone(), execution);
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Execution>, StoreError> {
        Ok(self.data.read().await.get(id).cloned())
    }

    async fn update(&self, execution: Execution) -> Result<(), StoreError> {
        let mut data = self.data.write().await;
        if !data.contains_key(&execution.id) {
            return Err(StoreError::NotFound(execution.id));
        }
        data.insert(execution.id.clone(), execution);
        Ok(())
    }

    async fn list_by_definition(&self, definition_id: &str) -> Result<Vec<Execution>, StoreError> {
        let data = self.data.read().await;
        let mut executions: Vec<Execution> = data
            .values()
            .filter(|execution| execution.definition_id == definition_id)
            .cloned()
            .collect();
        executions.sort_by(|a, b| a.started_at.cmp(&b.started_at).then(a.id.cmp(&b.id)));
        Ok(executions)
    }

    async fn list_by_subject(&self, subject_id: &str) -> Result<Vec<Execution>, StoreError> {
        let data = self.data.read().await;
        let mut executions: Vec<Execution> = data
            .values()
            .filter(|execution| execution.subject_id == subject_id)
            .cloned()
            .collect();
        executions.sort_by(|a, b| a.started_at.cmp(&b.started_at).then(a.id.cmp(&b.id)));
        Ok(executions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::ExecutionStatus;
    use crate::model::DefinitionStatus;
    use serde_json::json;

    fn sample_definition(id: &str, status: &str) -> Definition {
        serde_json::from_value(json!({
            "id": id,
            "name": "sample",
            "version": 1,
            "status": status,
            "steps": []
        }))
        .unwrap()
    }

    fn sample_execution(id: &str, definition_id: &str, subject_id: &str) -> Execution {
        serde_json::from_value(json!({
            "id": id,
            "definition_id": definition_id,
            "definition_version": 1,
            "subject_id": subject_id,
            "status": "in_progress",
            "started_by": "dr-lin",
            "started_at": 100
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_definition_store_get_and_list() {
        let store = MemoryDefinitionStore::new();
        store.insert(sample_definition("d1", "active")).await;
        store.insert(sample_definition("d2", "draft")).await;

        assert!(store.get_by_id("d1").await.unwrap().is_some());
        assert!(store.get_by_id("dx").await.unwrap().is_none());

        let active = store
            .list(DefinitionFilter {
                status: Some(DefinitionStatus::Active),
            })
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "d1");

        let all = store.list(DefinitionFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_execution_store_create_conflict() {
        let store = MemoryExecutionStore::new();
        store
            .create(sample_execution("e1", "d1", "p1"))
            .await
            .unwrap();
        let err = store
            .create(sample_execution("e1", "d1", "p1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_execution_store_update_missing() {
        let store = MemoryExecutionStore::new();
        let err = store
            .update(sample_execution("ghost", "d1", "p1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_execution_store_listings() {
        let store = MemoryExecutionStore::new();
        store.create(sample_execution("e1", "d1", "p1")).await.unwrap();
        store.create(sample_execution("e2", "d1", "p2")).await.unwrap();
        store.create(sample_execution("e3", "d2", "p1")).await.unwrap();

        let by_definition = store.list_by_definition("d1").await.unwrap();
        assert_eq!(by_definition.len(), 2);

        let by_subject = store.list_by_subject("p1").await.unwrap();
        assert_eq!(by_subject.len(), 2);

        let mut updated = by_subject[0].clone();
        updated.status = ExecutionStatus::Paused;
        store.update(updated).await.unwrap();
        let reloaded = store.get_by_id("e1").await.unwrap().unwrap();
        assert_eq!(reloaded.status, ExecutionStatus::Paused);
    }
}
