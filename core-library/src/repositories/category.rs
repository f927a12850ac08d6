//! Category repository trait and implementation

use crate::error::{LibraryError, Result};
use crate::models::Category;
use crate::repositories::versioned::{
    select_oldest_refresh, select_version, update_refreshed, VersionedStore,
};
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};

#[async_trait]
pub trait CategoryRepository: VersionedStore<Record = Category> {
    /// All categories ordered by name
    async fn find_all(&self) -> Result<Vec<Category>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Category>>;

    async fn count(&self) -> Result<i64>;

    /// Oldest `last_refreshed` among stored categories
    async fn oldest_refresh(&self) -> Result<Option<i64>>;

    async fn clear(&self) -> Result<u64>;
}

pub struct SqliteCategoryRepository {
    pool: SqlitePool,
}

impl SqliteCategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VersionedStore for SqliteCategoryRepository {
    type Record = Category;

    async fn stored_version(&self, id: &str) -> Result<Option<i64>> {
        select_version(&self.pool, "categories", id).await
    }

    async fn touch_refreshed(&self, id: &str, at: i64) -> Result<()> {
        update_refreshed(&self.pool, "categories", id, at).await
    }

    async fn upsert(&self, category: &Category) -> Result<()> {
        category
            .validate()
            .map_err(|e| LibraryError::invalid("Category", e))?;

        query(
            r#"
            INSERT INTO categories (id, name, version, last_refreshed)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                version = excluded.version,
                last_refreshed = excluded.last_refreshed
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(category.version)
        .bind(category.last_refreshed)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for SqliteCategoryRepository {
    async fn find_all(&self) -> Result<Vec<Category>> {
        let categories = query_as::<_, Category>("SELECT * FROM categories ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(categories)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Category>> {
        let category = query_as::<_, Category>("SELECT * FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(category)
    }

    async fn count(&self) -> Result<i64> {
        let count: (i64,) = query_as("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }

    async fn oldest_refresh(&self) -> Result<Option<i64>> {
        select_oldest_refresh(&self.pool, "categories").await
    }

    async fn clear(&self) -> Result<u64> {
        let result = query("DELETE FROM categories").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
