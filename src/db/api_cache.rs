//! SQLite-backed [`CacheStore`], shared by every process using the same database

use crate::cache::CacheStore;
use crate::db::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::warn;

#[derive(Clone)]
pub struct SqliteCache {
    pool: DbPool,
}

#[derive(sqlx::FromRow)]
struct CachedRow {
    value: Vec<u8>,
    stored_at: DateTime<Utc>,
    ttl_seconds: i64,
}

impl SqliteCache {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Delete every expired row, returning how many were removed
    pub async fn purge_expired(&self) -> crate::Result<u64> {
        let rows = sqlx::query_as::<_, (String, DateTime<Utc>, i64)>(
            "SELECT cache_key, stored_at, ttl_seconds FROM api_cache",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut removed = 0;
        for (key, stored_at, ttl_seconds) in rows {
            if is_expired(stored_at, ttl_seconds) {
                removed += sqlx::query("DELETE FROM api_cache WHERE cache_key = ?")
                    .bind(key)
                    .execute(&self.pool)
                    .await?
                    .rows_affected();
            }
        }

        Ok(removed)
    }
}

fn is_expired(stored_at: DateTime<Utc>, ttl_seconds: i64) -> bool {
    let age = Utc::now() - stored_at;
    age.num_milliseconds() >= ttl_seconds.saturating_mul(1000)
}

// Storage failures degrade to cache misses; the client then fetches remotely
#[async_trait]
impl CacheStore for SqliteCache {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let row = sqlx::query_as::<_, CachedRow>(
            "SELECT value, stored_at, ttl_seconds FROM api_cache WHERE cache_key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| warn!("API cache read failed: {}", e))
        .ok()??;

        if is_expired(row.stored_at, row.ttl_seconds) {
            return None;
        }

        Some(row.value)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        let ttl_seconds = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);

        let result = sqlx::query(
            r#"
            INSERT INTO api_cache (cache_key, value, stored_at, ttl_seconds)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(cache_key) DO UPDATE SET
                value = excluded.value,
                stored_at = excluded.stored_at,
                ttl_seconds = excluded.ttl_seconds
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .bind(ttl_seconds)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            warn!("API cache write failed: {}", e);
        }
    }
}
