//! Comment repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::Comment;
use crate::repositories::versioned::{select_version, update_refreshed, VersionedStore};
use crate::repositories::{Page, PageRequest};
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};
use tracing::instrument;

#[async_trait]
pub trait CommentRepository: VersionedStore<Record = Comment> {
    /// Comments on `video_id`, newest first
    async fn find_by_video(&self, video_id: &str, page_request: PageRequest) -> Result<Page<Comment>>;

    async fn count_for_video(&self, video_id: &str) -> Result<i64>;

    /// Oldest `last_refreshed` among the comments of `video_id`
    async fn oldest_refresh_for_video(&self, video_id: &str) -> Result<Option<i64>>;

    /// Delete the cached comments of one video
    async fn clear_for_video(&self, video_id: &str) -> Result<u64>;

    async fn clear(&self) -> Result<u64>;
}

pub struct SqliteCommentRepository {
    pool: SqlitePool,
}

impl SqliteCommentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VersionedStore for SqliteCommentRepository {
    type Record = Comment;

    async fn stored_version(&self, id: &str) -> Result<Option<i64>> {
        select_version(&self.pool, "comments", id).await
    }

    async fn touch_refreshed(&self, id: &str, at: i64) -> Result<()> {
        update_refreshed(&self.pool, "comments", id, at).await
    }

    async fn upsert(&self, comment: &Comment) -> Result<()> {
        comment
            .validate()
            .map_err(|e| LibraryError::invalid("Comment", e))?;

        query(
            r#"
            INSERT INTO comments (id, video_id, author, body, created_at, version, last_refreshed)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                video_id = excluded.video_id,
                author = excluded.author,
                body = excluded.body,
                created_at = excluded.created_at,
                version = excluded.version,
                last_refreshed = excluded.last_refreshed
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.video_id)
        .bind(&comment.author)
        .bind(&comment.body)
        .bind(comment.created_at)
        .bind(comment.version)
        .bind(comment.last_refreshed)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl CommentRepository for SqliteCommentRepository {
    #[instrument(skip(self))]
    async fn find_by_video(&self, video_id: &str, page_request: PageRequest) -> Result<Page<Comment>> {
        let total = self.count_for_video(video_id).await?;

        let comments = query_as::<_, Comment>(
            "SELECT * FROM comments WHERE video_id = ? ORDER BY created_at DESC, id ASC LIMIT ? OFFSET ?",
        )
        .bind(video_id)
        .bind(page_request.limit())
        .bind(page_request.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(comments, total as u64, page_request))
    }

    async fn count_for_video(&self, video_id: &str) -> Result<i64> {
        let count: (i64,) = query_as("SELECT COUNT(*) FROM comments WHERE video_id = ?")
            .bind(video_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    async fn oldest_refresh_for_video(&self, video_id: &str) -> Result<Option<i64>> {
        let oldest: (Option<i64>,) =
            query_as("SELECT MIN(last_refreshed) FROM comments WHERE video_id = ?")
                .bind(video_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(oldest.0)
    }

    async fn clear_for_video(&self, video_id: &str) -> Result<u64> {
        let result = query("DELETE FROM comments WHERE video_id = ?")
            .bind(video_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn clear(&self) -> Result<u64> {
        let result = query("DELETE FROM comments").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    fn comment(id: &str, video_id: &str, created_at: i64, last_refreshed: i64) -> Comment {
        Comment {
            id: id.to_string(),
            video_id: video_id.to_string(),
            author: "viewer".to_string(),
            body: format!("comment {}", id),
            created_at,
            version: 0,
            last_refreshed,
        }
    }

    #[core_async::test]
    async fn test_find_by_video_newest_first() {
        let repo = SqliteCommentRepository::new(create_test_pool().await.unwrap());
        repo.upsert(&comment("c1", "v1", 100, 50)).await.unwrap();
        repo.upsert(&comment("c2", "v1", 200, 60)).await.unwrap();
        repo.upsert(&comment("c3", "v2", 300, 10)).await.unwrap();

        let page = repo.find_by_video("v1", PageRequest::first(10)).await.unwrap();
        let ids: Vec<_> = page.items.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c1"]);
        assert_eq!(page.total, 2);

        assert_eq!(repo.count_for_video("v2").await.unwrap(), 1);
        assert_eq!(repo.oldest_refresh_for_video("v1").await.unwrap(), Some(50));
        assert_eq!(repo.oldest_refresh_for_video("v3").await.unwrap(), None);
    }

    #[core_async::test]
    async fn test_clear_for_video_keeps_other_videos() {
        let repo = SqliteCommentRepository::new(create_test_pool().await.unwrap());
        repo.upsert(&comment("c1", "v1", 100, 50)).await.unwrap();
        repo.upsert(&comment("c2", "v2", 100, 50)).await.unwrap();

        assert_eq!(repo.clear_for_video("v1").await.unwrap(), 1);
        assert_eq!(repo.count_for_video("v1").await.unwrap(), 0);
        assert_eq!(repo.count_for_video("v2").await.unwrap(), 1);
    }

    #[core_async::test]
    async fn test_touch_refreshed_only_moves_forward() {
        let repo = SqliteCommentRepository::new(create_test_pool().await.unwrap());
        repo.upsert(&comment("c1", "v1", 100, 50)).await.unwrap();

        repo.touch_refreshed("c1", 500).await.unwrap();
        repo.touch_refreshed("c1", 200).await.unwrap();
        repo.touch_refreshed("missing", 900).await.unwrap();

        assert_eq!(repo.oldest_refresh_for_video("v1").await.unwrap(), Some(500));
        assert_eq!(repo.count_for_video("v1").await.unwrap(), 1);
        let page = repo.find_by_video("v1", PageRequest::first(10)).await.unwrap();
        assert_eq!(page.items[0].body, "comment c1");
    }

    #[core_async::test]
    async fn test_comment_requires_video() {
        let repo = SqliteCommentRepository::new(create_test_pool().await.unwrap());
        let result = repo.upsert(&comment("c1", "", 100, 50)).await;
        assert!(result.is_err());
    }
}
