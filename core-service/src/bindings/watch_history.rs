//! Watch history

use super::SyncEnv;
use crate::api::CatalogApi;
use core_library::models::WatchHistoryEntry;
use core_library::repositories::WatchHistoryRepository;
use core_library::LibraryError;
use core_sync::{
    apply_remote_batch, stamp_refreshed, synced_read, FreshnessPolicy, FreshnessSnapshot,
    RemoteError, Resource, SyncError,
};
use futures::stream::BoxStream;
use std::sync::Arc;
use tracing::instrument;

pub struct WatchHistorySync {
    history: Arc<dyn WatchHistoryRepository>,
    api: Arc<dyn CatalogApi>,
    env: SyncEnv,
}

impl WatchHistorySync {
    pub fn new(
        history: Arc<dyn WatchHistoryRepository>,
        api: Arc<dyn CatalogApi>,
        env: SyncEnv,
    ) -> Self {
        Self { history, api, env }
    }

    /// Most recently watched entries, up to one page.
    pub fn history(&self) -> BoxStream<'_, Resource<Vec<WatchHistoryEntry>>> {
        let store = self.history.as_ref();
        let limit = self.env.page_size;
        let policy = FreshnessPolicy::EmptyOrOldest {
            window: self.env.freshness.watch_history_ttl,
        };

        synced_read(
            move || store.find_recent(limit),
            move || async move {
                let mut entries = self.env.caller.call(self.api.fetch_watch_history()).await?;
                stamp_refreshed(&mut entries, self.env.now());
                Ok::<_, RemoteError>(entries)
            },
            move |entries: Vec<WatchHistoryEntry>| async move {
                apply_remote_batch(store, &entries).await?;
                Ok::<_, SyncError>(())
            },
            move |local: Vec<WatchHistoryEntry>| async move {
                let oldest = store.oldest_refresh().await?;
                let snapshot = FreshnessSnapshot::with_oldest(local.len() as i64, oldest);
                Ok::<_, LibraryError>(policy.is_stale(&snapshot, self.env.now()))
            },
        )
    }

    /// Record playback progress locally. The entry's version is bumped so a
    /// remote copy older than this write cannot replace it.
    #[instrument(skip(self))]
    pub async fn record_watch(
        &self,
        video_id: &str,
        position_secs: i64,
    ) -> core_library::Result<WatchHistoryEntry> {
        self.history
            .record_watch(video_id, position_secs, self.env.now())
            .await
    }

    pub async fn resume_position(&self, video_id: &str) -> core_library::Result<Option<i64>> {
        Ok(self
            .history
            .find_by_video(video_id)
            .await?
            .map(|entry| entry.position_secs))
    }

    pub async fn invalidate(&self) -> core_library::Result<u64> {
        self.history.clear().await
    }
}
