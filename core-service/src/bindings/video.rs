//! Catalog videos

use super::SyncEnv;
use crate::api::CatalogApi;
use core_library::models::{Video, VideoFilter};
use core_library::repositories::{Page, PageRequest, VideoRepository};
use core_library::LibraryError;
use core_sync::{
    apply_remote_batch, is_remote_only_page, persist_page, stamp_refreshed, synced_read,
    FreshnessPolicy, FreshnessSnapshot, RemoteError, Resource, SyncError,
};
use futures::stream::BoxStream;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::debug;

pub struct VideoSync {
    videos: Arc<dyn VideoRepository>,
    api: Arc<dyn CatalogApi>,
    env: SyncEnv,
}

impl VideoSync {
    pub fn new(videos: Arc<dyn VideoRepository>, api: Arc<dyn CatalogApi>, env: SyncEnv) -> Self {
        Self { videos, api, env }
    }

    /// One page of videos matching `filter`.
    ///
    /// The first page is served from the store and refetched only when no
    /// stored video matches the filter. Later pages always come from the
    /// remote source and are appended to the store.
    pub fn videos(&self, filter: VideoFilter, page: u32) -> BoxStream<'_, Resource<Page<Video>>> {
        let request = PageRequest::new(page, self.env.page_size);
        let remote_only = is_remote_only_page(request.page);
        let store = self.videos.as_ref();
        let local_filter = filter.clone();
        let count_filter = filter.clone();

        debug!(?filter, page = request.page, remote_only, "Reading videos");

        synced_read(
            move || async move {
                if remote_only {
                    return Ok(Page::new(Vec::new(), 0, request));
                }
                store.query(&local_filter, request).await
            },
            move || async move {
                let mut items = self
                    .env
                    .caller
                    .call(self.api.fetch_videos(&filter, request.page, request.page_size))
                    .await?;
                stamp_refreshed(&mut items, self.env.now());
                Ok::<_, RemoteError>(Page::from_items(items, request))
            },
            move |fetched: Page<Video>| async move {
                persist_page(store, fetched.page, &fetched.items).await?;
                Ok::<_, SyncError>(())
            },
            move |_| async move {
                if remote_only {
                    return Ok(true);
                }
                let count = store.count_matching(&count_filter).await?;
                let snapshot = FreshnessSnapshot::with_count(count);
                Ok::<_, LibraryError>(FreshnessPolicy::FilterCount.is_stale(&snapshot, self.env.now()))
            },
        )
    }

    /// A single video, refetched when missing or older than the video TTL.
    pub fn video(&self, id: &str) -> BoxStream<'_, Resource<Option<Video>>> {
        let store = self.videos.as_ref();
        let local_id = id.to_string();
        let remote_id = id.to_string();
        let policy = FreshnessPolicy::EmptyOrOldest {
            window: self.env.freshness.video_ttl,
        };

        synced_read(
            move || async move { store.find_by_id(&local_id).await },
            move || async move {
                let mut video = self
                    .env
                    .caller
                    .call(self.api.fetch_video(&remote_id))
                    .await?;
                video.last_refreshed = self.env.now();
                Ok::<_, RemoteError>(Some(video))
            },
            move |fetched: Option<Video>| async move {
                if let Some(video) = fetched {
                    apply_remote_batch(store, std::slice::from_ref(&video)).await?;
                }
                Ok::<_, SyncError>(())
            },
            move |local: Option<Video>| async move {
                let snapshot = match &local {
                    Some(video) => FreshnessSnapshot::with_oldest(1, Some(video.last_refreshed)),
                    None => FreshnessSnapshot::with_oldest(0, None),
                };
                Ok::<_, Infallible>(policy.is_stale(&snapshot, self.env.now()))
            },
        )
    }

    /// Drop every cached video.
    pub async fn invalidate(&self) -> core_library::Result<u64> {
        self.videos.clear().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::test_support::{clock, env, video, MockApi, HOUR, NOW};
    use bridge_traits::BridgeError;
    use core_library::create_test_pool;
    use core_library::repositories::{SqliteVideoRepository, VersionedStore};
    use core_sync::collect_resources;

    async fn setup(api: MockApi) -> (VideoSync, Arc<SqliteVideoRepository>) {
        let repo = Arc::new(SqliteVideoRepository::new(create_test_pool().await.unwrap()));
        let sync = VideoSync::new(repo.clone(), Arc::new(api), env(clock()));
        (sync, repo)
    }

    #[core_async::test]
    async fn test_first_page_uses_store_when_filter_matches() {
        let mut api = MockApi::new();
        api.expect_fetch_videos().times(0);
        let (sync, repo) = setup(api).await;
        repo.upsert(&video("a", 1)).await.unwrap();

        let emitted = collect_resources(sync.videos(VideoFilter::new().with_type("movie"), 1)).await;

        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[1].data().unwrap().items, vec![video("a", 1)]);
    }

    #[core_async::test]
    async fn test_first_page_fetches_when_nothing_matches() {
        let mut api = MockApi::new();
        api.expect_fetch_videos()
            .times(1)
            .returning(|_, _, _| Ok(vec![video("a", 1), video("b", 1)]));
        let (sync, repo) = setup(api).await;

        let emitted = collect_resources(sync.videos(VideoFilter::new(), 1)).await;

        assert_eq!(emitted.len(), 2);
        let page = emitted[1].data().unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.items.iter().all(|v| v.last_refreshed == NOW));
        assert_eq!(repo.count_matching(&VideoFilter::new()).await.unwrap(), 2);
    }

    #[core_async::test]
    async fn test_later_pages_always_go_remote() {
        let mut api = MockApi::new();
        api.expect_fetch_videos()
            .withf(|_, page, _| *page == 2)
            .times(1)
            .returning(|_, _, _| Ok(vec![video("c", 1)]));
        let (sync, repo) = setup(api).await;
        repo.upsert(&video("a", 1)).await.unwrap();

        let emitted = collect_resources(sync.videos(VideoFilter::new(), 2)).await;

        assert_eq!(emitted.len(), 2);
        assert_eq!(emitted[1].data().unwrap().items, vec![{
            let mut v = video("c", 1);
            v.last_refreshed = NOW;
            v
        }]);
        assert!(repo.find_by_id("c").await.unwrap().is_some());
    }

    #[core_async::test]
    async fn test_later_page_failure_has_no_fallback() {
        let mut api = MockApi::new();
        api.expect_fetch_videos()
            .returning(|_, _, _| Err(BridgeError::Connect("refused".to_string())));
        let (sync, _repo) = setup(api).await;

        let emitted = collect_resources(sync.videos(VideoFilter::new(), 3)).await;
        assert_eq!(
            emitted,
            vec![Resource::Loading, Resource::error("No network connectivity", None)]
        );
    }

    #[core_async::test]
    async fn test_single_video_refreshes_when_old() {
        let mut api = MockApi::new();
        api.expect_fetch_video()
            .times(1)
            .returning(|_| Ok(video("a", 2)));
        let (sync, repo) = setup(api).await;

        let mut cached = video("a", 1);
        cached.last_refreshed = NOW - 13 * HOUR;
        repo.upsert(&cached).await.unwrap();

        let emitted = collect_resources(sync.video("a")).await;

        assert_eq!(emitted.len(), 3);
        assert_eq!(emitted[1], Resource::Success(Some(cached)));
        assert_eq!(repo.stored_version("a").await.unwrap(), Some(2));
    }

    #[core_async::test]
    async fn test_single_video_recent_is_served_locally() {
        let mut api = MockApi::new();
        api.expect_fetch_video().times(0);
        let (sync, repo) = setup(api).await;

        let mut cached = video("a", 1);
        cached.last_refreshed = NOW - HOUR;
        repo.upsert(&cached).await.unwrap();

        let emitted = collect_resources(sync.video("a")).await;
        assert_eq!(emitted, vec![Resource::Loading, Resource::Success(Some(cached))]);
    }
}
