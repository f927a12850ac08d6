//! Favorite repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::{Favorite, Video};
use crate::repositories::versioned::{select_version, update_refreshed, VersionedStore};
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};

#[async_trait]
pub trait FavoriteRepository: VersionedStore<Record = Favorite> {
    /// All favorites, most recently added first
    async fn find_all(&self) -> Result<Vec<Favorite>>;

    /// Ids of every favorited video
    async fn video_ids(&self) -> Result<Vec<String>>;

    /// Favorited videos that are present in the local video store
    async fn find_videos(&self) -> Result<Vec<Video>>;

    async fn count(&self) -> Result<i64>;

    async fn clear(&self) -> Result<u64>;
}

pub struct SqliteFavoriteRepository {
    pool: SqlitePool,
}

impl SqliteFavoriteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VersionedStore for SqliteFavoriteRepository {
    type Record = Favorite;

    async fn stored_version(&self, id: &str) -> Result<Option<i64>> {
        select_version(&self.pool, "favorites", id).await
    }

    async fn touch_refreshed(&self, id: &str, at: i64) -> Result<()> {
        update_refreshed(&self.pool, "favorites", id, at).await
    }

    async fn upsert(&self, favorite: &Favorite) -> Result<()> {
        favorite
            .validate()
            .map_err(|e| LibraryError::invalid("Favorite", e))?;

        query(
            r#"
            INSERT INTO favorites (id, video_id, added_at, version, last_refreshed)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                video_id = excluded.video_id,
                added_at = excluded.added_at,
                version = excluded.version,
                last_refreshed = excluded.last_refreshed
            "#,
        )
        .bind(&favorite.id)
        .bind(&favorite.video_id)
        .bind(favorite.added_at)
        .bind(favorite.version)
        .bind(favorite.last_refreshed)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl FavoriteRepository for SqliteFavoriteRepository {
    async fn find_all(&self) -> Result<Vec<Favorite>> {
        let favorites =
            query_as::<_, Favorite>("SELECT * FROM favorites ORDER BY added_at DESC, id ASC")
                .fetch_all(&self.pool)
                .await?;

        Ok(favorites)
    }

    async fn video_ids(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            query_as("SELECT video_id FROM favorites ORDER BY added_at DESC, id ASC")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    async fn find_videos(&self) -> Result<Vec<Video>> {
        let videos = query_as::<_, Video>(
            r#"
            SELECT v.* FROM videos v
            INNER JOIN favorites f ON f.video_id = v.id
            ORDER BY f.added_at DESC, f.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }

    async fn count(&self) -> Result<i64> {
        let count: (i64,) = query_as("SELECT COUNT(*) FROM favorites")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    async fn clear(&self) -> Result<u64> {
        let result = query("DELETE FROM favorites").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use crate::repositories::SqliteVideoRepository;

    #[core_async::test]
    async fn test_favorites_ordered_by_added_at() {
        let repo = SqliteFavoriteRepository::new(create_test_pool().await.unwrap());
        repo.upsert(&Favorite::new("v1", 100)).await.unwrap();
        repo.upsert(&Favorite::new("v2", 200)).await.unwrap();

        assert_eq!(repo.video_ids().await.unwrap(), vec!["v2".to_string(), "v1".to_string()]);
        assert_eq!(repo.count().await.unwrap(), 2);
    }

    #[core_async::test]
    async fn test_find_videos_joins_local_videos_only() {
        let pool = create_test_pool().await.unwrap();
        let videos = SqliteVideoRepository::new(pool.clone());
        let repo = SqliteFavoriteRepository::new(pool);

        videos.upsert(&Video::new("v1", "Known", "movie")).await.unwrap();
        repo.upsert(&Favorite::new("v1", 100)).await.unwrap();
        repo.upsert(&Favorite::new("v2", 200)).await.unwrap();

        let found = repo.find_videos().await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "v1");
    }

    #[core_async::test]
    async fn test_clear() {
        let repo = SqliteFavoriteRepository::new(create_test_pool().await.unwrap());
        repo.upsert(&Favorite::new("v1", 100)).await.unwrap();

        assert_eq!(repo.clear().await.unwrap(), 1);
        assert!(repo.find_all().await.unwrap().is_empty());
    }
}
