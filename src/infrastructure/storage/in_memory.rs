//! In-memory storage implementation

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::storage::{
    check_batch_size, BatchItemOutcome, Storage, StorageEntity, StorageKey, DEFAULT_MAX_BATCH_SIZE,
};
use crate::domain::DomainError;

/// Thread-safe in-memory storage implementation
///
/// Useful for testing and development. Data is lost when the process terminates.
#[derive(Debug)]
pub struct InMemoryStorage<E>
where
    E: StorageEntity,
{
    entities: RwLock<HashMap<String, E>>,
    max_batch_size: usize,
}

impl<E> Default for InMemoryStorage<E>
where
    E: StorageEntity,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> InMemoryStorage<E>
where
    E: StorageEntity,
{
    /// Creates a new empty in-memory storage
    pub fn new() -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }

    /// Creates storage pre-populated with entities
    pub fn with_entities(entities: Vec<E>) -> Self {
        let map = entities
            .into_iter()
            .map(|entity| (entity.key().as_str().to_string(), entity))
            .collect();

        Self {
            entities: RwLock::new(map),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }

    /// Lowers or raises the batch ceiling
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size.max(1);
        self
    }
}

fn read_lock_error(e: impl std::fmt::Display) -> DomainError {
    DomainError::storage(format!("Failed to acquire read lock: {}", e))
}

fn write_lock_error(e: impl std::fmt::Display) -> DomainError {
    DomainError::storage(format!("Failed to acquire write lock: {}", e))
}

#[async_trait]
impl<E> Storage<E> for InMemoryStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        let entities = self.entities.read().map_err(read_lock_error)?;
        Ok(entities.get(key.as_str()).cloned())
    }

    async fn list(&self) -> Result<Vec<E>, DomainError> {
        let entities = self.entities.read().map_err(read_lock_error)?;
        Ok(entities.values().cloned().collect())
    }

    async fn list_partition(&self, partition: &str) -> Result<Vec<E>, DomainError> {
        let entities = self.entities.read().map_err(read_lock_error)?;

        let mut matching: Vec<E> = entities
            .values()
            .filter(|e| e.partition_key() == Some(partition))
            .cloned()
            .collect();

        matching.sort_by(|a, b| a.key().as_str().cmp(b.key().as_str()));
        Ok(matching)
    }

    async fn create(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let mut entities = self.entities.write().map_err(write_lock_error)?;

        if entities.contains_key(&key) {
            return Err(DomainError::conflict(format!(
                "Entity with key '{}' already exists",
                key
            )));
        }

        entities.insert(key, entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let mut entities = self.entities.write().map_err(write_lock_error)?;

        if !entities.contains_key(&key) {
            return Err(DomainError::not_found(format!(
                "Entity with key '{}' not found",
                key
            )));
        }

        entities.insert(key, entity.clone());
        Ok(entity)
    }

    async fn update_batch(&self, batch: Vec<E>) -> Result<Vec<BatchItemOutcome>, DomainError> {
        check_batch_size(batch.len(), self.max_batch_size)?;

        let mut entities = self.entities.write().map_err(write_lock_error)?;
        let mut outcomes = Vec::with_capacity(batch.len());

        for entity in batch {
            let key = entity.key().as_str().to_string();

            if entities.contains_key(&key) {
                entities.insert(key.clone(), entity);
                outcomes.push(BatchItemOutcome::applied(key));
            } else {
                let error =
                    DomainError::not_found(format!("Entity with key '{}' not found", key));
                outcomes.push(BatchItemOutcome::failed(key, error));
            }
        }

        Ok(outcomes)
    }

    fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError> {
        let mut entities = self.entities.write().map_err(write_lock_error)?;
        Ok(entities.remove(key.as_str()).is_some())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let entities = self.entities.read().map_err(read_lock_error)?;
        Ok(entities.len())
    }

    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        let entities = self.entities.read().map_err(read_lock_error)?;
        Ok(entities.contains_key(key.as_str()))
    }
}
