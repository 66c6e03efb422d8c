//! Repository traits and in-memory reference stores.
//!
//! The engine holds no state of its own: definitions and executions live
//! behind these traits, and the in-memory implementations exist for tests
//! and embedding without an external database. Mutators go through
//! [`ExecutionRepository::update`], a whole-record replace; serializing
//! concurrent mutators on one execution id is owned by the caller or the
//! backing store.

mod memory;

pub use memory::{MemoryDefinitionStore, MemoryExecutionStore};

use async_trait::async_trait;
use thiserror::Error;

use crate::execution::Execution;
use crate::model::{Definition, DefinitionStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Record already exists: {0}")]
    Conflict(String),
}

/// Filter for definition listings.
#[derive(Debug, Clone, Default)]
pub struct DefinitionFilter {
    pub status: Option<DefinitionStatus>,
}

#[async_trait]
pub trait DefinitionRepository: Send + Sync {
    async fn get_by_id(&self, id: &str) -> Result<Option<Definition>, StoreError>;
    async fn list(&self, filter: DefinitionFilter) -> Result<Vec<Definition>, StoreError>;
}

#[async_trait]
pub trait ExecutionRepository: Send + Sync {
    /// Insert a new execution; an existing id is a conflict.
    async fn create(&self, execution: Execution) -> Result<(), StoreError>;
    async fn get_by_id(&self, id: &str) -> Result<Option<Execution>, StoreError>;
    /// Replace the stored record. The replace itself must be atomic.
    async fn update(&self, execution: Execution) -> Result<(), StoreError>;
    async fn list_by_definition(&self, definition_id: &str) -> Result<Vec<Execution>, StoreError>;
    async fn list_by_subject(&self, subject_id: &str) -> Result<Vec<Execution>, StoreError>;
}
