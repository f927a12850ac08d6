//! Watch history repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::WatchHistoryEntry;
use crate::repositories::versioned::{
    select_oldest_refresh, select_version, update_refreshed, VersionedStore,
};
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};
use tracing::{debug, instrument};

#[async_trait]
pub trait WatchHistoryRepository: VersionedStore<Record = WatchHistoryEntry> {
    /// Most recently watched entries first
    async fn find_recent(&self, limit: u32) -> Result<Vec<WatchHistoryEntry>>;

    async fn find_by_video(&self, video_id: &str) -> Result<Option<WatchHistoryEntry>>;

    /// Record playback progress locally.
    ///
    /// Creates the entry for `video_id` at version 0 or bumps the stored
    /// version by one so the local edit outranks the remote copy it was based
    /// on. `last_refreshed` is left untouched: a local write is not a refresh.
    async fn record_watch(
        &self,
        video_id: &str,
        position_secs: i64,
        watched_at: i64,
    ) -> Result<WatchHistoryEntry>;

    async fn oldest_refresh(&self) -> Result<Option<i64>>;

    async fn clear(&self) -> Result<u64>;
}

pub struct SqliteWatchHistoryRepository {
    pool: SqlitePool,
}

impl SqliteWatchHistoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VersionedStore for SqliteWatchHistoryRepository {
    type Record = WatchHistoryEntry;

    async fn stored_version(&self, id: &str) -> Result<Option<i64>> {
        select_version(&self.pool, "watch_history", id).await
    }

    async fn touch_refreshed(&self, id: &str, at: i64) -> Result<()> {
        update_refreshed(&self.pool, "watch_history", id, at).await
    }

    async fn upsert(&self, entry: &WatchHistoryEntry) -> Result<()> {
        entry
            .validate()
            .map_err(|e| LibraryError::invalid("WatchHistoryEntry", e))?;

        query(
            r#"
            INSERT INTO watch_history (id, video_id, position_secs, watched_at, version, last_refreshed)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                video_id = excluded.video_id,
                position_secs = excluded.position_secs,
                watched_at = excluded.watched_at,
                version = excluded.version,
                last_refreshed = excluded.last_refreshed
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.video_id)
        .bind(entry.position_secs)
        .bind(entry.watched_at)
        .bind(entry.version)
        .bind(entry.last_refreshed)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl WatchHistoryRepository for SqliteWatchHistoryRepository {
    async fn find_recent(&self, limit: u32) -> Result<Vec<WatchHistoryEntry>> {
        let entries = query_as::<_, WatchHistoryEntry>(
            "SELECT * FROM watch_history ORDER BY watched_at DESC, id ASC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn find_by_video(&self, video_id: &str) -> Result<Option<WatchHistoryEntry>> {
        let entry = query_as::<_, WatchHistoryEntry>("SELECT * FROM watch_history WHERE id = ?")
            .bind(video_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    #[instrument(skip(self))]
    async fn record_watch(
        &self,
        video_id: &str,
        position_secs: i64,
        watched_at: i64,
    ) -> Result<WatchHistoryEntry> {
        if video_id.trim().is_empty() {
            return Err(LibraryError::invalid(
                "video_id",
                "Watch history must reference a video".to_string(),
            ));
        }

        if position_secs < 0 {
            return Err(LibraryError::invalid(
                "position_secs",
                "Watch position cannot be negative".to_string(),
            ));
        }

        let entry = query_as::<_, WatchHistoryEntry>(
            r#"
            INSERT INTO watch_history (id, video_id, position_secs, watched_at, version, last_refreshed)
            VALUES (?, ?, ?, ?, 0, 0)
            ON CONFLICT(id) DO UPDATE SET
                position_secs = excluded.position_secs,
                watched_at = excluded.watched_at,
                version = watch_history.version + 1
            RETURNING *
            "#,
        )
        .bind(video_id)
        .bind(video_id)
        .bind(position_secs)
        .bind(watched_at)
        .fetch_one(&self.pool)
        .await?;

        debug!(version = entry.version, "Recorded watch progress");
        Ok(entry)
    }

    async fn oldest_refresh(&self) -> Result<Option<i64>> {
        select_oldest_refresh(&self.pool, "watch_history").await
    }

    async fn clear(&self) -> Result<u64> {
        let result = query("DELETE FROM watch_history").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
