//! Storage factory for runtime backend selection

use std::str::FromStr;
use std::sync::Arc;

use sqlx::postgres::PgPool;
use tracing::info;

use crate::domain::storage::{Storage, StorageEntity};
use crate::domain::DomainError;

use super::in_memory::InMemoryStorage;
use super::postgres::{PostgresConfig, PostgresStorage};

/// Storage backends selectable through `storage.backend`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    InMemory,
    Postgres,
}

impl FromStr for StorageType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" | "in_memory" => Ok(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            other => Err(DomainError::configuration(format!(
                "Unknown storage backend '{}'",
                other
            ))),
        }
    }
}

/// Resolved backend settings
#[derive(Debug, Clone)]
pub enum StorageConfig {
    InMemory,
    Postgres(PostgresConfig),
}

#[derive(Debug, Clone)]
enum Backend {
    InMemory,
    Postgres(PgPool),
}

/// Hands out one storage per collection, sharing the backend connection
#[derive(Debug, Clone)]
pub struct StorageFactory {
    backend: Backend,
}

impl StorageFactory {
    /// Connects to the configured backend
    pub async fn connect(config: &StorageConfig) -> Result<Self, DomainError> {
        let backend = match config {
            StorageConfig::InMemory => {
                info!("Using in-memory storage");
                Backend::InMemory
            }
            StorageConfig::Postgres(pg_config) => {
                info!(max_connections = pg_config.max_connections, "Connecting to PostgreSQL");
                Backend::Postgres(pg_config.connect().await?)
            }
        };

        Ok(Self { backend })
    }

    /// Factory for process-local storage
    pub fn in_memory() -> Self {
        Self {
            backend: Backend::InMemory,
        }
    }

    pub fn storage_type(&self) -> StorageType {
        match self.backend {
            Backend::InMemory => StorageType::InMemory,
            Backend::Postgres(_) => StorageType::Postgres,
        }
    }

    /// Creates the storage for one collection, preparing its table when needed
    pub async fn collection<E>(&self, table_name: &str) -> Result<Arc<dyn Storage<E>>, DomainError>
    where
        E: StorageEntity + 'static,
    {
        match &self.backend {
            Backend::InMemory => Ok(Arc::new(InMemoryStorage::<E>::new())),
            Backend::Postgres(pool) => {
                let storage = PostgresStorage::<E>::new(pool.clone(), table_name);
                storage.ensure_table().await?;
                Ok(Arc::new(storage))
            }
        }
    }
}
