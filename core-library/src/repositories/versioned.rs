//! Storage seam for versioned merge

use crate::error::Result;
use crate::models::Versioned;
use async_trait::async_trait;

/// A store whose records are keyed by id and ordered by version.
///
/// `upsert` writes unconditionally; the version comparison belongs to the
/// caller so that the same store serves both merged first pages and
/// append-only later pages.
#[async_trait]
pub trait VersionedStore: Send + Sync {
    type Record: Versioned + Send + Sync;

    /// Version of the stored record with `id`, if any.
    async fn stored_version(&self, id: &str) -> Result<Option<i64>>;

    /// Insert `record`, or replace the stored record with the same id.
    async fn upsert(&self, record: &Self::Record) -> Result<()>;

    /// Advance `last_refreshed` of the stored record without touching its
    /// data. Never moves the timestamp backwards.
    async fn touch_refreshed(&self, id: &str, at: i64) -> Result<()>;
}

/// `SELECT version FROM <table> WHERE id = ?`
pub(crate) async fn select_version(
    pool: &sqlx::SqlitePool,
    table: &'static str,
    id: &str,
) -> Result<Option<i64>> {
    let version: Option<(i64,)> = sqlx::query_as(&format!("SELECT version FROM {} WHERE id = ?", table))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(version.map(|(v,)| v))
}

/// `UPDATE <table> SET last_refreshed = MAX(last_refreshed, ?) WHERE id = ?`
pub(crate) async fn update_refreshed(
    pool: &sqlx::SqlitePool,
    table: &'static str,
    id: &str,
    at: i64,
) -> Result<()> {
    sqlx::query(&format!(
        "UPDATE {} SET last_refreshed = MAX(last_refreshed, ?) WHERE id = ?",
        table
    ))
    .bind(at)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Oldest `last_refreshed` in `table`, `None` when empty.
pub(crate) async fn select_oldest_refresh(
    pool: &sqlx::SqlitePool,
    table: &'static str,
) -> Result<Option<i64>> {
    let oldest: (Option<i64>,) =
        sqlx::query_as(&format!("SELECT MIN(last_refreshed) FROM {}", table))
            .fetch_one(pool)
            .await?;

    Ok(oldest.0)
}
