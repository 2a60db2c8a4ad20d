//! Storage trait definition

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

use super::entity::{StorageEntity, StorageKey};

/// Upper bound on writes a single batch may carry
pub const DEFAULT_MAX_BATCH_SIZE: usize = 500;

/// Outcome of one entry of a committed batch
#[derive(Debug)]
pub struct BatchItemOutcome {
    /// Key of the entity the write targeted
    pub key: String,
    /// `None` when the write landed
    pub error: Option<DomainError>,
}

impl BatchItemOutcome {
    pub fn applied(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            error: None,
        }
    }

    pub fn failed(key: impl Into<String>, error: DomainError) -> Self {
        Self {
            key: key.into(),
            error: Some(error),
        }
    }

    pub fn is_applied(&self) -> bool {
        self.error.is_none()
    }
}

/// Generic storage trait for document operations on any entity type
#[async_trait]
pub trait Storage<E>: Send + Sync + Debug
where
    E: StorageEntity + 'static,
{
    /// Retrieves an entity by its key
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError>;

    /// Retrieves all entities
    async fn list(&self) -> Result<Vec<E>, DomainError>;

    /// Retrieves entities whose partition key matches, ordered by key
    async fn list_partition(&self, partition: &str) -> Result<Vec<E>, DomainError> {
        let mut entities: Vec<E> = self
            .list()
            .await?
            .into_iter()
            .filter(|e| e.partition_key() == Some(partition))
            .collect();

        entities.sort_by(|a, b| a.key().as_str().cmp(b.key().as_str()));
        Ok(entities)
    }

    /// Creates a new entity, returns error if already exists
    async fn create(&self, entity: E) -> Result<E, DomainError>;

    /// Updates an existing entity, returns error if not found
    async fn update(&self, entity: E) -> Result<E, DomainError>;

    /// Saves an entity (creates if not exists, updates if exists)
    async fn save(&self, entity: E) -> Result<E, DomainError> {
        if self.exists(entity.key()).await? {
            self.update(entity).await
        } else {
            self.create(entity).await
        }
    }

    /// Updates a bounded set of existing entities in one commit.
    ///
    /// Entities that no longer exist are reported per item and do not fail the
    /// batch. An `Err` means nothing from this batch was written.
    async fn update_batch(&self, entities: Vec<E>) -> Result<Vec<BatchItemOutcome>, DomainError>;

    /// Largest number of entities `update_batch` accepts
    fn max_batch_size(&self) -> usize {
        DEFAULT_MAX_BATCH_SIZE
    }

    /// Deletes an entity by its key, returns true if deleted
    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError>;

    /// Checks if an entity exists by its key
    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Returns the count of entities
    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.list().await?.len())
    }
}

/// Rejects batches over the store's ceiling
pub fn check_batch_size(len: usize, max: usize) -> Result<(), DomainError> {
    if len > max {
        return Err(DomainError::validation(format!(
            "Batch of {} writes exceeds the limit of {}",
            len, max
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_batch_size() {
        assert!(check_batch_size(0, 500).is_ok());
        assert!(check_batch_size(500, 500).is_ok());

        let err = check_batch_size(501, 500).unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[test]
    fn test_batch_item_outcome() {
        let ok = BatchItemOutcome::applied("f-1");
        assert!(ok.is_applied());

        let failed = BatchItemOutcome::failed("f-2", DomainError::not_found("gone"));
        assert!(!failed.is_applied());
        assert_eq!(failed.key, "f-2");
    }
}
