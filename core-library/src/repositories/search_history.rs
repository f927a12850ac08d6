//! Search history repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::SearchHistoryEntry;
use crate::repositories::versioned::{
    select_oldest_refresh, select_version, update_refreshed, VersionedStore,
};
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};

#[async_trait]
pub trait SearchHistoryRepository: VersionedStore<Record = SearchHistoryEntry> {
    /// Most recent searches first
    async fn find_recent(&self, limit: u32) -> Result<Vec<SearchHistoryEntry>>;

    /// Record a search locally, keyed by the normalized query.
    ///
    /// Repeating a query moves it to the top and bumps its version.
    async fn record_query(&self, query: &str, searched_at: i64) -> Result<SearchHistoryEntry>;

    async fn oldest_refresh(&self) -> Result<Option<i64>>;

    async fn clear(&self) -> Result<u64>;
}

pub struct SqliteSearchHistoryRepository {
    pool: SqlitePool,
}

impl SqliteSearchHistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VersionedStore for SqliteSearchHistoryRepository {
    type Record = SearchHistoryEntry;

    async fn stored_version(&self, id: &str) -> Result<Option<i64>> {
        select_version(&self.pool, "search_history", id).await
    }

    async fn touch_refreshed(&self, id: &str, at: i64) -> Result<()> {
        update_refreshed(&self.pool, "search_history", id, at).await
    }

    async fn upsert(&self, entry: &SearchHistoryEntry) -> Result<()> {
        entry
            .validate()
            .map_err(|e| LibraryError::invalid("SearchHistoryEntry", e))?;

        query(
            r#"
            INSERT INTO search_history (id, query, searched_at, version, last_refreshed)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                query = excluded.query,
                searched_at = excluded.searched_at,
                version = excluded.version,
                last_refreshed = excluded.last_refreshed
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.query)
        .bind(entry.searched_at)
        .bind(entry.version)
        .bind(entry.last_refreshed)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl SearchHistoryRepository for SqliteSearchHistoryRepository {
    async fn find_recent(&self, limit: u32) -> Result<Vec<SearchHistoryEntry>> {
        let entries = query_as::<_, SearchHistoryEntry>(
            "SELECT * FROM search_history ORDER BY searched_at DESC, id ASC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn record_query(&self, search: &str, searched_at: i64) -> Result<SearchHistoryEntry> {
        let key = SearchHistoryEntry::normalize(search);
        if key.is_empty() {
            return Err(LibraryError::invalid(
                "query",
                "Search query cannot be empty".to_string(),
            ));
        }

        let entry = query_as::<_, SearchHistoryEntry>(
            r#"
            INSERT INTO search_history (id, query, searched_at, version, last_refreshed)
            VALUES (?, ?, ?, 0, 0)
            ON CONFLICT(id) DO UPDATE SET
                query = excluded.query,
                searched_at = excluded.searched_at,
                version = search_history.version + 1
            RETURNING *
            "#,
        )
        .bind(&key)
        .bind(search.trim())
        .bind(searched_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn oldest_refresh(&self) -> Result<Option<i64>> {
        select_oldest_refresh(&self.pool, "search_history").await
    }

    async fn clear(&self) -> Result<u64> {
        let result = query("DELETE FROM search_history").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    #[core_async::test]
    async fn test_record_query_dedupes_by_normalized_text() {
        let repo = SqliteSearchHistoryRepository::new(create_test_pool().await.unwrap());

        let first = repo.record_query("Cats ", 100).await.unwrap();
        assert_eq!(first.id, "cats");
        assert_eq!(first.version, 0);

        let second = repo.record_query("cats", 200).await.unwrap();
        assert_eq!(second.version, 1);
        assert_eq!(second.searched_at, 200);

        assert_eq!(repo.find_recent(10).await.unwrap().len(), 1);
    }

    #[core_async::test]
    async fn test_find_recent_newest_first() {
        let repo = SqliteSearchHistoryRepository::new(create_test_pool().await.unwrap());
        repo.record_query("dogs", 100).await.unwrap();
        repo.record_query("cats", 300).await.unwrap();
        repo.record_query("birds", 200).await.unwrap();

        let recent = repo.find_recent(10).await.unwrap();
        let queries: Vec<_> = recent.iter().map(|e| e.query.as_str()).collect();
        assert_eq!(queries, vec!["cats", "birds", "dogs"]);
    }

    #[core_async::test]
    async fn test_blank_query_rejected() {
        let repo = SqliteSearchHistoryRepository::new(create_test_pool().await.unwrap());
        assert!(repo.record_query("   ", 100).await.is_err());
    }
}
