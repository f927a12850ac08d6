//! Search results and search history
//!
//! Result pages are cached as raw JSON under their request key in the URL
//! cache, independent of the video catalog. Entries older than the URL cache
//! TTL are stale on read and removed by [`SearchSync::sweep_expired`].

use super::SyncEnv;
use crate::api::CatalogApi;
use core_library::models::{CachedResponse, SearchHistoryEntry, Video};
use core_library::repositories::{SearchHistoryRepository, UrlCacheRepository};
use core_library::LibraryError;
use core_sync::{
    apply_remote_batch, expiry_cutoff, is_expired, stamp_refreshed, synced_read,
    FreshnessPolicy, FreshnessSnapshot, RemoteError, Resource, SyncError,
};
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// URL cache key of one search result page.
pub fn cache_key(query: &str, page: u32) -> String {
    format!("search?q={}&page={}", SearchHistoryEntry::normalize(query), page.max(1))
}

pub struct SearchSync {
    cache: Arc<dyn UrlCacheRepository>,
    history: Arc<dyn SearchHistoryRepository>,
    api: Arc<dyn CatalogApi>,
    env: SyncEnv,
}

impl SearchSync {
    pub fn new(
        cache: Arc<dyn UrlCacheRepository>,
        history: Arc<dyn SearchHistoryRepository>,
        api: Arc<dyn CatalogApi>,
        env: SyncEnv,
    ) -> Self {
        Self {
            cache,
            history,
            api,
            env,
        }
    }

    /// Search the catalog.
    ///
    /// Searching for the first page also records the query in the local
    /// search history.
    pub fn search(&self, query: &str, page: u32) -> BoxStream<'_, Resource<Vec<Video>>> {
        let query = query.trim().to_string();
        if query.is_empty() {
            return stream::iter([
                Resource::Loading,
                Resource::error("Search query cannot be empty", None),
            ])
            .boxed();
        }

        let page = page.max(1);
        let key = cache_key(&query, page);
        let local_key = key.clone();
        let check_key = key.clone();
        let local_query = query.clone();
        let cache = self.cache.as_ref();
        let history = self.history.as_ref();
        let ttl = self.env.freshness.url_cache_ttl;

        debug!(%key, "Searching");

        synced_read(
            move || async move {
                if page == 1 {
                    if let Err(error) = history.record_query(&local_query, self.env.now()).await {
                        warn!(error = %error, "Failed to record search query");
                    }
                }

                match cache.get(&local_key).await? {
                    Some(cached) => Ok(serde_json::from_str::<Vec<Video>>(&cached.body)?),
                    None => Ok::<_, SyncError>(Vec::new()),
                }
            },
            move || async move {
                let results = self
                    .env
                    .caller
                    .call(self.api.search(&query, page, self.env.page_size))
                    .await?;
                Ok::<_, RemoteError>(results)
            },
            move |results: Vec<Video>| async move {
                let response = CachedResponse {
                    url: key,
                    body: serde_json::to_string(&results)?,
                    fetched_at: self.env.now(),
                };
                cache.put(&response).await?;
                Ok::<_, SyncError>(())
            },
            move |_| async move {
                let fetched_at = cache.get(&check_key).await?.map(|cached| cached.fetched_at);
                Ok::<_, LibraryError>(is_expired(fetched_at, ttl, self.env.now()))
            },
        )
    }

    /// Recent searches, merged with the remote search history.
    pub fn recent_searches(&self) -> BoxStream<'_, Resource<Vec<SearchHistoryEntry>>> {
        let store = self.history.as_ref();
        let limit = self.env.page_size;
        let policy = FreshnessPolicy::EmptyOrOldest {
            window: self.env.freshness.search_history_ttl,
        };

        synced_read(
            move || store.find_recent(limit),
            move || async move {
                let mut entries = self.env.caller.call(self.api.fetch_search_history()).await?;
                stamp_refreshed(&mut entries, self.env.now());
                Ok::<_, RemoteError>(entries)
            },
            move |entries: Vec<SearchHistoryEntry>| async move {
                apply_remote_batch(store, &entries).await?;
                Ok::<_, SyncError>(())
            },
            move |local: Vec<SearchHistoryEntry>| async move {
                let oldest = store.oldest_refresh().await?;
                let snapshot = FreshnessSnapshot::with_oldest(local.len() as i64, oldest);
                Ok::<_, LibraryError>(policy.is_stale(&snapshot, self.env.now()))
            },
        )
    }

    /// Delete cached search pages older than the URL cache TTL.
    #[instrument(skip(self))]
    pub async fn sweep_expired(&self) -> core_library::Result<u64> {
        let cutoff = expiry_cutoff(self.env.now(), self.env.freshness.url_cache_ttl);
        self.cache.delete_older_than(cutoff).await
    }

    pub async fn clear_history(&self) -> core_library::Result<u64> {
        self.history.clear().await
    }

    pub async fn invalidate(&self) -> core_library::Result<u64> {
        self.cache.clear().await
    }
}
