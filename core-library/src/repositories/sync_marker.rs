//! Last remote update per entity key

use crate::error::Result;
use async_trait::async_trait;
use sqlx::{query, query_as, SqlitePool};

#[async_trait]
pub trait SyncMarkerRepository: Send + Sync {
    /// Unix seconds of the last successful remote update of `entity`
    async fn last_update(&self, entity: &str) -> Result<Option<i64>>;

    async fn mark(&self, entity: &str, at: i64) -> Result<()>;

    async fn clear(&self, entity: &str) -> Result<()>;
}

pub struct SqliteSyncMarkerRepository {
    pool: SqlitePool,
}

impl SqliteSyncMarkerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SyncMarkerRepository for SqliteSyncMarkerRepository {
    async fn last_update(&self, entity: &str) -> Result<Option<i64>> {
        let row: Option<(i64,)> = query_as("SELECT last_update FROM sync_markers WHERE entity = ?")
            .bind(entity)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(at,)| at))
    }

    async fn mark(&self, entity: &str, at: i64) -> Result<()> {
        query(
            r#"
            INSERT INTO sync_markers (entity, last_update) VALUES (?, ?)
            ON CONFLICT(entity) DO UPDATE SET last_update = excluded.last_update
            "#,
        )
        .bind(entity)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear(&self, entity: &str) -> Result<()> {
        query("DELETE FROM sync_markers WHERE entity = ?")
            .bind(entity)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
