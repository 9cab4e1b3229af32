//! PostgreSQL data accessor with connection pooling

use std::fmt::Debug;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use crate::domain::record::{apply_patch, missing_record, DataAccessor, Record, RecordKey};
use crate::domain::DataError;

/// PostgreSQL pool configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/webapi_shared".to_string(),
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

    pub fn with_min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    pub fn with_idle_timeout(mut self, secs: u64) -> Self {
        self.idle_timeout_secs = secs;
        self
    }
}

/// PostgreSQL-backed data accessor.
///
/// Stores each record as a JSONB row in a table with
/// (key, data, created_at, updated_at) columns. Every mutating
/// operation runs in its own transaction and the returned record is
/// re-read from the row before commit, so server-side changes are
/// reflected in the result.
pub struct PostgresAccessor<R>
where
    R: Record,
{
    pool: PgPool,
    table_name: String,
    _phantom: PhantomData<R>,
}

impl<R> Debug for PostgresAccessor<R>
where
    R: Record,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresAccessor")
            .field("table_name", &self.table_name)
            .finish()
    }
}

impl<R> PostgresAccessor<R>
where
    R: Record,
{
    /// Creates an accessor over an existing pool and table.
    pub fn new(pool: PgPool, table_name: impl Into<String>) -> Self {
        Self {
            pool,
            table_name: table_name.into(),
            _phantom: PhantomData,
        }
    }

    /// Creates an accessor with its own connection pool.
    pub async fn connect(
        config: &PostgresConfig,
        table_name: impl Into<String>,
    ) -> Result<Self, DataError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(std::time::Duration::from_secs(config.idle_timeout_secs))
            .connect(&config.url)
            .await?;

        Ok(Self::new(pool, table_name))
    }

    /// Returns a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Ensures the backing table exists
    pub async fn ensure_table(&self) -> Result<(), DataError> {
        let query = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                key VARCHAR(255) PRIMARY KEY,
                data JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            self.table_name
        );

        sqlx::query(&query).execute(&self.pool).await?;

        Ok(())
    }

    fn record_from_row(row: &PgRow) -> Result<R, DataError> {
        let data: Value = row.try_get("data")?;
        Ok(serde_json::from_value(data)?)
    }
}

#[async_trait]
impl<R> DataAccessor<R> for PostgresAccessor<R>
where
    R: Record + 'static,
{
    async fn get(&self, key: &R::Key) -> Result<Option<R>, DataError> {
        let query = format!("SELECT data FROM {} WHERE key = $1", self.table_name);

        let row = sqlx::query(&query)
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Self::record_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, skip: u64, limit: Option<u64>) -> Result<Vec<R>, DataError> {
        let rows = match limit {
            Some(limit) => {
                let query = format!(
                    "SELECT data FROM {} ORDER BY key OFFSET $1 LIMIT $2",
                    self.table_name
                );
                sqlx::query(&query)
                    .bind(skip as i64)
                    .bind(limit as i64)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let query = format!(
                    "SELECT data FROM {} ORDER BY key OFFSET $1",
                    self.table_name
                );
                sqlx::query(&query)
                    .bind(skip as i64)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            records.push(Self::record_from_row(row)?);
        }

        Ok(records)
    }

    async fn create(&self, input: R::Create) -> Result<R, DataError> {
        let record = R::from_create(input);
        let key = record.key().as_str().to_string();
        let data = serde_json::to_value(&record)?;

        let mut tx = self.pool.begin().await?;

        let insert = format!("INSERT INTO {} (key, data) VALUES ($1, $2)", self.table_name);
        sqlx::query(&insert)
            .bind(&key)
            .bind(&data)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if e.as_database_error()
                    .is_some_and(|db| db.is_unique_violation())
                {
                    DataError::conflict(format!("record with key '{}' already exists", key))
                } else {
                    DataError::Database(e)
                }
            })?;

        let select = format!("SELECT data FROM {} WHERE key = $1", self.table_name);
        let row = sqlx::query(&select)
            .bind(&key)
            .fetch_one(&mut *tx)
            .await?;
        let refreshed = Self::record_from_row(&row)?;

        tx.commit().await?;

        Ok(refreshed)
    }

    async fn update(&self, existing: R, patch: Map<String, Value>) -> Result<R, DataError> {
        let updated = apply_patch(&existing, &patch)?;
        let old_key = existing.key().as_str().to_string();
        let new_key = updated.key().as_str().to_string();
        let data = serde_json::to_value(&updated)?;

        let mut tx = self.pool.begin().await?;

        // The row is addressed by the key the record had before the
        // patch; a key-changing patch migrates it in the same statement.
        // Landing on another record's key trips the primary-key
        // constraint and surfaces as a conflict, same as create.
        let update = format!(
            "UPDATE {} SET key = $2, data = $3, updated_at = NOW() WHERE key = $1",
            self.table_name
        );
        let result = sqlx::query(&update)
            .bind(&old_key)
            .bind(&new_key)
            .bind(&data)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if e.as_database_error()
                    .is_some_and(|db| db.is_unique_violation())
                {
                    DataError::conflict(format!("record with key '{}' already exists", new_key))
                } else {
                    DataError::Database(e)
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(missing_record(existing.key()));
        }

        let select = format!("SELECT data FROM {} WHERE key = $1", self.table_name);
        let row = sqlx::query(&select)
            .bind(&new_key)
            .fetch_one(&mut *tx)
            .await?;
        let refreshed = Self::record_from_row(&row)?;

        tx.commit().await?;

        Ok(refreshed)
    }

    async fn remove(&self, key: &R::Key) -> Result<R, DataError> {
        let mut tx = self.pool.begin().await?;

        let select = format!(
            "SELECT data FROM {} WHERE key = $1 FOR UPDATE",
            self.table_name
        );
        let row = sqlx::query(&select)
            .bind(key.as_str())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| missing_record(key))?;
        let prior = Self::record_from_row(&row)?;

        let delete = format!("DELETE FROM {} WHERE key = $1", self.table_name);
        sqlx::query(&delete)
            .bind(key.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(prior)
    }
}
