//! # Versioned Merge
//!
//! Conflict resolution when remote records are persisted over local ones:
//! the highest version per id wins, wall-clock time plays no part.
//!
//! Records are checked and written one at a time. A batch is not atomic and
//! may partially apply under concurrent local writes; the version check is
//! what keeps concurrent refreshes from regressing a record.

use crate::error::Result;
use core_library::models::Versioned;
use core_library::repositories::VersionedStore;
use tracing::{debug, instrument, trace};

/// Outcome of merging one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub inserted: usize,
    pub replaced: usize,
    /// Incoming records whose version did not exceed the stored one. Only
    /// their refresh time was recorded.
    pub discarded: usize,
}

impl MergeStats {
    pub fn written(&self) -> usize {
        self.inserted + self.replaced
    }
}

/// What to do with one incoming record given the stored version.
fn accepts(incoming: i64, stored: Option<i64>) -> bool {
    match stored {
        None => true,
        Some(existing) => incoming > existing,
    }
}

/// Merge `records` into `store`, keeping the highest version per id.
///
/// Outdated records are dropped silently and only counted. Their data is not
/// written, but a stamped refresh still advances the stored record's
/// `last_refreshed`.
#[instrument(skip(store, records), fields(count = records.len()))]
pub async fn apply_remote_batch<S>(store: &S, records: &[S::Record]) -> Result<MergeStats>
where
    S: VersionedStore + ?Sized,
{
    let mut stats = MergeStats::default();

    for record in records {
        let stored = store.stored_version(record.id()).await?;

        if !accepts(record.version(), stored) {
            trace!(
                id = record.id(),
                incoming = record.version(),
                stored = ?stored,
                "Discarding outdated record"
            );
            if record.last_refreshed() > 0 {
                store
                    .touch_refreshed(record.id(), record.last_refreshed())
                    .await?;
            }
            stats.discarded += 1;
            continue;
        }

        store.upsert(record).await?;
        if stored.is_some() {
            stats.replaced += 1;
        } else {
            stats.inserted += 1;
        }
    }

    debug!(
        inserted = stats.inserted,
        replaced = stats.replaced,
        discarded = stats.discarded,
        "Merged remote batch"
    );
    Ok(stats)
}

/// Write `records` without version checks. Used for pages past the first,
/// whose ids are assumed disjoint from what is stored.
pub async fn append_page<S>(store: &S, records: &[S::Record]) -> Result<usize>
where
    S: VersionedStore + ?Sized,
{
    for record in records {
        store.upsert(record).await?;
    }

    debug!(count = records.len(), "Appended remote page");
    Ok(records.len())
}

/// Persist one page of remote results: the first page is merged by version,
/// later pages are appended.
pub async fn persist_page<S>(store: &S, page: u32, records: &[S::Record]) -> Result<MergeStats>
where
    S: VersionedStore + ?Sized,
{
    if page <= 1 {
        apply_remote_batch(store, records).await
    } else {
        let inserted = append_page(store, records).await?;
        Ok(MergeStats {
            inserted,
            ..MergeStats::default()
        })
    }
}

/// Set `last_refreshed` of every freshly received record to `now`.
pub fn stamp_refreshed<T: Versioned>(records: &mut [T], now: i64) {
    for record in records.iter_mut() {
        record.mark_refreshed(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use core_library::Result as LibraryResult;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: String,
        version: i64,
        payload: &'static str,
        refreshed: i64,
    }

    impl Versioned for Row {
        fn id(&self) -> &str {
            &self.id
        }

        fn version(&self) -> i64 {
            self.version
        }

        fn last_refreshed(&self) -> i64 {
            self.refreshed
        }

        fn mark_refreshed(&mut self, at: i64) {
            self.refreshed = at;
        }
    }

    fn row(id: &str, version: i64, payload: &'static str) -> Row {
        Row {
            id: id.to_string(),
            version,
            payload,
            refreshed: 0,
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<HashMap<String, Row>>,
    }

    impl MemoryStore {
        fn get(&self, id: &str) -> Option<Row> {
            self.rows.lock().unwrap().get(id).cloned()
        }

        fn snapshot(&self) -> Vec<Row> {
            let mut rows: Vec<_> = self.rows.lock().unwrap().values().cloned().collect();
            rows.sort_by(|a, b| a.id.cmp(&b.id));
            rows
        }
    }

    #[async_trait]
    impl VersionedStore for MemoryStore {
        type Record = Row;

        async fn stored_version(&self, id: &str) -> LibraryResult<Option<i64>> {
            Ok(self.get(id).map(|row| row.version))
        }

        async fn upsert(&self, record: &Row) -> LibraryResult<()> {
            self.rows
                .lock()
                .unwrap()
                .insert(record.id.clone(), record.clone());
            Ok(())
        }

        async fn touch_refreshed(&self, id: &str, at: i64) -> LibraryResult<()> {
            if let Some(row) = self.rows.lock().unwrap().get_mut(id) {
                row.refreshed = row.refreshed.max(at);
            }
            Ok(())
        }
    }

    #[core_async::test]
    async fn test_lower_version_does_not_downgrade() {
        let store = MemoryStore::default();
        store.upsert(&row("A", 3, "local")).await.unwrap();

        let stats = apply_remote_batch(&store, &[row("A", 2, "remote")]).await.unwrap();

        assert_eq!(stats.discarded, 1);
        assert_eq!(store.get("A"), Some(row("A", 3, "local")));
    }

    #[core_async::test]
    async fn test_equal_version_is_discarded() {
        let store = MemoryStore::default();
        store.upsert(&row("A", 3, "local")).await.unwrap();

        apply_remote_batch(&store, &[row("A", 3, "remote")]).await.unwrap();
        assert_eq!(store.get("A").unwrap().payload, "local");
    }

    #[core_async::test]
    async fn test_discarded_record_still_counts_as_refreshed() {
        let store = MemoryStore::default();
        let mut local = row("A", 3, "local");
        local.refreshed = 100;
        store.upsert(&local).await.unwrap();

        let mut incoming = vec![row("A", 3, "remote")];
        stamp_refreshed(&mut incoming, 500);
        let stats = apply_remote_batch(&store, &incoming).await.unwrap();

        assert_eq!(stats.discarded, 1);
        let stored = store.get("A").unwrap();
        assert_eq!(stored.payload, "local");
        assert_eq!(stored.refreshed, 500);

        // An older stamp never moves the refresh time back.
        stamp_refreshed(&mut incoming, 200);
        apply_remote_batch(&store, &incoming).await.unwrap();
        assert_eq!(store.get("A").unwrap().refreshed, 500);
    }

    #[core_async::test]
    async fn test_higher_version_replaces() {
        let store = MemoryStore::default();
        store.upsert(&row("A", 3, "local")).await.unwrap();

        let stats = apply_remote_batch(&store, &[row("A", 5, "remote"), row("B", 0, "new")])
            .await
            .unwrap();

        assert_eq!(
            stats,
            MergeStats {
                inserted: 1,
                replaced: 1,
                discarded: 0
            }
        );
        assert_eq!(store.get("A"), Some(row("A", 5, "remote")));
    }

    #[core_async::test]
    async fn test_merge_is_idempotent() {
        let store = MemoryStore::default();
        let batch = [row("A", 1, "a"), row("B", 2, "b"), row("C", 1, "c")];

        apply_remote_batch(&store, &batch).await.unwrap();
        let once = store.snapshot();

        let second = apply_remote_batch(&store, &batch).await.unwrap();
        assert_eq!(store.snapshot(), once);
        assert_eq!(second.written(), 0);
        assert_eq!(second.discarded, 3);
    }

    #[core_async::test]
    async fn test_later_pages_append_without_version_check() {
        let store = MemoryStore::default();
        store.upsert(&row("A", 3, "local")).await.unwrap();

        let stats = persist_page(&store, 2, &[row("A", 1, "page two")]).await.unwrap();

        assert_eq!(stats.inserted, 1);
        assert_eq!(store.get("A").unwrap().payload, "page two");
    }

    #[core_async::test]
    async fn test_first_page_is_merged() {
        let store = MemoryStore::default();
        store.upsert(&row("A", 3, "local")).await.unwrap();

        let stats = persist_page(&store, 1, &[row("A", 1, "stale")]).await.unwrap();

        assert_eq!(stats.discarded, 1);
        assert_eq!(store.get("A").unwrap().payload, "local");
    }

    #[test]
    fn test_stamp_refreshed() {
        let mut rows = vec![row("A", 1, "a"), row("B", 1, "b")];
        stamp_refreshed(&mut rows, 42);
        assert!(rows.iter().all(|r| r.last_refreshed() == 42));
    }
}
