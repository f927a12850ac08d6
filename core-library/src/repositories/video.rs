//! Video repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::{Video, VideoFilter};
use crate::repositories::versioned::{select_version, update_refreshed, VersionedStore};
use crate::repositories::{Page, PageRequest};
use async_trait::async_trait;
use sqlx::sqlite::Sqlite;
use sqlx::{query, query_as, QueryBuilder, SqlitePool};
use std::collections::HashSet;
use tracing::instrument;

/// Video repository interface for data access operations
#[async_trait]
pub trait VideoRepository: VersionedStore<Record = Video> {
    /// Find a video by its ID
    async fn find_by_id(&self, id: &str) -> Result<Option<Video>>;

    /// Find every stored video whose id is in `ids`. Unknown ids are skipped.
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Video>>;

    /// Query videos matching `filter` with pagination, ordered by title
    async fn query(&self, filter: &VideoFilter, page_request: PageRequest) -> Result<Page<Video>>;

    /// Count stored videos matching `filter`
    async fn count_matching(&self, filter: &VideoFilter) -> Result<i64>;

    /// The subset of `ids` with no stored video, in input order
    async fn missing_ids(&self, ids: &[String]) -> Result<Vec<String>>;

    /// Delete every stored video
    async fn clear(&self) -> Result<u64>;
}

/// SQLite implementation of VideoRepository
pub struct SqliteVideoRepository {
    pool: SqlitePool,
}

impl SqliteVideoRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Append ` WHERE ...` for the set criteria of `filter`.
fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &VideoFilter) {
    builder.push(" WHERE 1 = 1");

    if let Some(video_type) = &filter.video_type {
        builder.push(" AND video_type = ").push_bind(video_type.clone());
    }

    if let Some(category_id) = &filter.category_id {
        builder.push(" AND category_id = ").push_bind(category_id.clone());
    }

    if let Some(year) = filter.year {
        builder.push(" AND year = ").push_bind(year);
    }
}

#[async_trait]
impl VersionedStore for SqliteVideoRepository {
    type Record = Video;

    async fn stored_version(&self, id: &str) -> Result<Option<i64>> {
        select_version(&self.pool, "videos", id).await
    }

    async fn touch_refreshed(&self, id: &str, at: i64) -> Result<()> {
        update_refreshed(&self.pool, "videos", id, at).await
    }

    async fn upsert(&self, video: &Video) -> Result<()> {
        video
            .validate()
            .map_err(|e| LibraryError::invalid("Video", e))?;

        query(
            r#"
            INSERT INTO videos (
                id, title, description, video_type, category_id, year,
                thumbnail_url, duration_secs, version, last_refreshed
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                video_type = excluded.video_type,
                category_id = excluded.category_id,
                year = excluded.year,
                thumbnail_url = excluded.thumbnail_url,
                duration_secs = excluded.duration_secs,
                version = excluded.version,
                last_refreshed = excluded.last_refreshed
            "#,
        )
        .bind(&video.id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.video_type)
        .bind(&video.category_id)
        .bind(video.year)
        .bind(&video.thumbnail_url)
        .bind(video.duration_secs)
        .bind(video.version)
        .bind(video.last_refreshed)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl VideoRepository for SqliteVideoRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<Video>> {
        let video = query_as::<_, Video>("SELECT * FROM videos WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(video)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Video>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM videos WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(") ORDER BY title ASC");

        let videos = builder
            .build_query_as::<Video>()
            .fetch_all(&self.pool)
            .await?;

        Ok(videos)
    }

    #[instrument(skip(self))]
    async fn query(&self, filter: &VideoFilter, page_request: PageRequest) -> Result<Page<Video>> {
        let total = self.count_matching(filter).await?;

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM videos");
        push_filter(&mut builder, filter);
        builder
            .push(" ORDER BY title ASC, id ASC LIMIT ")
            .push_bind(page_request.limit())
            .push(" OFFSET ")
            .push_bind(page_request.offset());

        let videos = builder
            .build_query_as::<Video>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(videos, total as u64, page_request))
    }

    async fn count_matching(&self, filter: &VideoFilter) -> Result<i64> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM videos");
        push_filter(&mut builder, filter);

        let count: (i64,) = builder.build_query_as().fetch_one(&self.pool).await?;
        Ok(count.0)
    }

    async fn missing_ids(&self, ids: &[String]) -> Result<Vec<String>> {
        let stored: HashSet<String> = self
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(|video| video.id)
            .collect();

        let mut missing: Vec<String> = Vec::new();
        for id in ids {
            if !stored.contains(id) && !missing.contains(id) {
                missing.push(id.clone());
            }
        }

        Ok(missing)
    }

    async fn clear(&self) -> Result<u64> {
        let result = query("DELETE FROM videos").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
