//! PostgreSQL document storage: one JSONB row per entity, indexed by partition

use std::fmt::Debug;
use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use crate::domain::storage::{
    check_batch_size, BatchItemOutcome, Storage, StorageEntity, StorageKey, DEFAULT_MAX_BATCH_SIZE,
};
use crate::domain::DomainError;

/// Connection settings shared by every collection
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/teamshare".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub async fn connect(&self) -> Result<PgPool, DomainError> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .connect(&self.url)
            .await
            .map_err(db_error("connect to PostgreSQL"))
    }
}

fn db_error(action: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::storage(format!("Failed to {}: {}", action, e))
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

/// SQL for one collection, rendered once when the storage is built
#[derive(Debug, Clone)]
struct Statements {
    get: String,
    list: String,
    list_partition: String,
    insert: String,
    update: String,
    delete: String,
    count: String,
    exists: String,
}

impl Statements {
    fn for_table(table: &str) -> Self {
        Self {
            get: format!("SELECT data FROM {table} WHERE key = $1"),
            list: format!("SELECT data FROM {table} ORDER BY created_at, key"),
            list_partition: format!(
                "SELECT data FROM {table} WHERE partition_key = $1 ORDER BY key"
            ),
            insert: format!(
                "INSERT INTO {table} (key, partition_key, data) VALUES ($1, $2, $3)"
            ),
            update: format!(
                "UPDATE {table} SET data = $2, partition_key = $3, updated_at = NOW() WHERE key = $1"
            ),
            delete: format!("DELETE FROM {table} WHERE key = $1"),
            count: format!("SELECT COUNT(*) AS total FROM {table}"),
            exists: format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE key = $1) AS found"),
        }
    }
}

/// Stores entities as JSONB rows `(key, partition_key, data)`.
///
/// `update_batch` runs inside one transaction: either every staged write of
/// the batch lands or none does.
pub struct PostgresStorage<E>
where
    E: StorageEntity,
{
    pool: PgPool,
    table_name: String,
    sql: Statements,
    _phantom: PhantomData<E>,
}

impl<E> Debug for PostgresStorage<E>
where
    E: StorageEntity,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStorage")
            .field("table_name", &self.table_name)
            .finish()
    }
}

impl<E> PostgresStorage<E>
where
    E: StorageEntity,
{
    pub fn new(pool: PgPool, table_name: impl Into<String>) -> Self {
        let table_name = table_name.into();
        Self {
            pool,
            sql: Statements::for_table(&table_name),
            table_name,
            _phantom: PhantomData,
        }
    }

    /// Creates the collection table and its partition index if missing
    pub async fn ensure_table(&self) -> Result<(), DomainError> {
        let table = &self.table_name;
        let ddl = [
            format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    key VARCHAR(255) PRIMARY KEY,
                    partition_key VARCHAR(255),
                    data JSONB NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )"
            ),
            format!("CREATE INDEX IF NOT EXISTS {table}_partition_idx ON {table} (partition_key, key)"),
        ];

        for statement in &ddl {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(db_error("prepare collection table"))?;
        }

        Ok(())
    }

    fn encode(entity: &E) -> Result<serde_json::Value, DomainError> {
        serde_json::to_value(entity)
            .map_err(|e| DomainError::storage(format!("Failed to encode document: {}", e)))
    }

    fn decode(row: &PgRow) -> Result<E, DomainError> {
        let data: serde_json::Value = row.try_get("data").map_err(db_error("read document"))?;
        serde_json::from_value(data)
            .map_err(|e| DomainError::storage(format!("Failed to decode document: {}", e)))
    }

    fn decode_all(rows: Vec<PgRow>) -> Result<Vec<E>, DomainError> {
        rows.iter().map(Self::decode).collect()
    }

    fn missing(key: &str) -> DomainError {
        DomainError::not_found(format!("Entity with key '{}' not found", key))
    }
}

#[async_trait]
impl<E> Storage<E> for PostgresStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        sqlx::query(&self.sql.get)
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("load document"))?
            .as_ref()
            .map(Self::decode)
            .transpose()
    }

    async fn list(&self) -> Result<Vec<E>, DomainError> {
        let rows = sqlx::query(&self.sql.list)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list documents"))?;

        Self::decode_all(rows)
    }

    async fn list_partition(&self, partition: &str) -> Result<Vec<E>, DomainError> {
        let rows = sqlx::query(&self.sql.list_partition)
            .bind(partition)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list partition"))?;

        Self::decode_all(rows)
    }

    async fn create(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();

        let inserted = sqlx::query(&self.sql.insert)
            .bind(&key)
            .bind(entity.partition_key())
            .bind(Self::encode(&entity)?)
            .execute(&self.pool)
            .await;

        match inserted {
            Ok(_) => Ok(entity),
            Err(e) if is_unique_violation(&e) => Err(DomainError::conflict(format!(
                "Entity with key '{}' already exists",
                key
            ))),
            Err(e) => Err(db_error("insert document")(e)),
        }
    }

    async fn update(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();

        let result = sqlx::query(&self.sql.update)
            .bind(&key)
            .bind(Self::encode(&entity)?)
            .bind(entity.partition_key())
            .execute(&self.pool)
            .await
            .map_err(db_error("update document"))?;

        if result.rows_affected() == 0 {
            return Err(Self::missing(&key));
        }

        Ok(entity)
    }

    async fn update_batch(&self, batch: Vec<E>) -> Result<Vec<BatchItemOutcome>, DomainError> {
        check_batch_size(batch.len(), DEFAULT_MAX_BATCH_SIZE)?;

        let mut tx = self.pool.begin().await.map_err(db_error("open batch"))?;
        let mut outcomes = Vec::with_capacity(batch.len());

        for entity in &batch {
            let key = entity.key().as_str().to_string();

            let result = sqlx::query(&self.sql.update)
                .bind(&key)
                .bind(Self::encode(entity)?)
                .bind(entity.partition_key())
                .execute(&mut *tx)
                .await
                .map_err(db_error("stage batch write"))?;

            let outcome = if result.rows_affected() == 0 {
                BatchItemOutcome::failed(key.clone(), Self::missing(&key))
            } else {
                BatchItemOutcome::applied(key)
            };
            outcomes.push(outcome);
        }

        tx.commit().await.map_err(db_error("commit batch"))?;
        Ok(outcomes)
    }

    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError> {
        let result = sqlx::query(&self.sql.delete)
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_error("delete document"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let row = sqlx::query(&self.sql.count)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("count documents"))?;

        let total: i64 = row.try_get("total").map_err(db_error("read count"))?;
        Ok(total.max(0) as usize)
    }

    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        let row = sqlx::query(&self.sql.exists)
            .bind(key.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("check existence"))?;

        row.try_get("found").map_err(db_error("read existence"))
    }
}
