//! URL-keyed response cache

use crate::error::Result;
use crate::models::CachedResponse;
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};
use tracing::debug;

#[async_trait]
pub trait UrlCacheRepository: Send + Sync {
    async fn get(&self, url: &str) -> Result<Option<CachedResponse>>;

    /// Store or overwrite the response cached under `response.url`
    async fn put(&self, response: &CachedResponse) -> Result<()>;

    /// Delete every entry fetched strictly before `cutoff` (unix seconds).
    ///
    /// Returns the number of removed entries.
    async fn delete_older_than(&self, cutoff: i64) -> Result<u64>;

    async fn clear(&self) -> Result<u64>;
}

pub struct SqliteUrlCacheRepository {
    pool: SqlitePool,
}

impl SqliteUrlCacheRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UrlCacheRepository for SqliteUrlCacheRepository {
    async fn get(&self, url: &str) -> Result<Option<CachedResponse>> {
        let cached = query_as::<_, CachedResponse>("SELECT * FROM url_cache WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;

        Ok(cached)
    }

    async fn put(&self, response: &CachedResponse) -> Result<()> {
        query(
            r#"
            INSERT INTO url_cache (url, body, fetched_at)
            VALUES (?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                body = excluded.body,
                fetched_at = excluded.fetched_at
            "#,
        )
        .bind(&response.url)
        .bind(&response.body)
        .bind(response.fetched_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_older_than(&self, cutoff: i64) -> Result<u64> {
        let result = query("DELETE FROM url_cache WHERE fetched_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        debug!(cutoff, removed = result.rows_affected(), "Swept url cache");
        Ok(result.rows_affected())
    }

    async fn clear(&self) -> Result<u64> {
        let result = query("DELETE FROM url_cache").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
