//! The `seen_items` table: listings that already triggered an alert.

use std::path::Path;

use chrono::{Duration, Utc};
use sqlx::SqlitePool;

use crate::{connect_in_memory, connect_pool, run_migrations, DbError, PoolConfig};

/// Rows older than this are pruned when a store is opened.
pub const RETENTION_DAYS: i64 = 7;

/// A row from the `seen_items` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SeenRow {
    pub id: String,
    pub brand: String,
    pub name: String,
    pub price: i64,
    /// Unix epoch seconds.
    pub seen_at: i64,
}

/// Persistent set of alerted listing ids.
///
/// Cheap to clone; clones share the pool.
#[derive(Debug, Clone)]
pub struct SeenStore {
    pool: SqlitePool,
}

impl SeenStore {
    /// Opens the store at `path`, creating the file if needed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the database cannot be opened, migrated or
    /// pruned.
    pub async fn open(path: &Path) -> Result<Self, DbError> {
        let pool = connect_pool(path, PoolConfig::default()).await?;
        Self::from_pool(pool).await
    }

    /// Opens a throwaway in-memory store.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the connection or migration fails.
    pub async fn open_in_memory() -> Result<Self, DbError> {
        let pool = connect_in_memory().await?;
        Self::from_pool(pool).await
    }

    /// Wraps an existing pool: migrates, then deletes rows past the
    /// retention window.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the migration or the cleanup fails.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, DbError> {
        run_migrations(&pool).await?;
        let store = Self { pool };

        let cutoff = (Utc::now() - Duration::days(RETENTION_DAYS)).timestamp();
        let removed = store.prune_older_than(cutoff).await?;
        if removed > 0 {
            tracing::info!(removed, "pruned expired seen items");
        }

        Ok(store)
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the lookup fails. A failed lookup is not
    /// the same as "not seen".
    pub async fn has_seen(&self, id: &str) -> Result<bool, DbError> {
        let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM seen_items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    /// Records `id` as alerted. A second call for the same id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the insert fails.
    pub async fn mark_seen(
        &self,
        id: &str,
        brand: &str,
        name: &str,
        price: i64,
    ) -> Result<(), DbError> {
        self.mark_seen_at(id, brand, name, price, Utc::now().timestamp())
            .await
    }

    pub(crate) async fn mark_seen_at(
        &self,
        id: &str,
        brand: &str,
        name: &str,
        price: i64,
        seen_at: i64,
    ) -> Result<(), DbError> {
        sqlx::query(
            "INSERT OR IGNORE INTO seen_items (id, brand, name, price, seen_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(brand)
        .bind(name)
        .bind(price)
        .bind(seen_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Number of tracked ids.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the query fails.
    pub async fn count(&self) -> Result<i64, DbError> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM seen_items")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the query fails.
    pub async fn get(&self, id: &str) -> Result<Option<SeenRow>, DbError> {
        let row = sqlx::query_as::<_, SeenRow>(
            "SELECT id, brand, name, price, seen_at FROM seen_items WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn prune_older_than(&self, cutoff: i64) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM seen_items WHERE seen_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
