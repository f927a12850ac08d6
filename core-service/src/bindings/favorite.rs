//! Favorites with video backfill
//!
//! A remote favorites sync is rate-limited by a [`SyncContext`] owned by this
//! binding. After merging favorites, every favorited video missing from the
//! local catalog is fetched and inserted. The backfill only ever adds videos;
//! nothing is removed when a video leaves the favorites.

use super::SyncEnv;
use crate::api::CatalogApi;
use core_library::models::{Favorite, Video};
use core_library::repositories::{FavoriteRepository, VideoRepository};
use core_sync::{
    apply_remote_batch, stamp_refreshed, synced_read, RemoteError, Resource, SyncContext,
    SyncError,
};
use futures::stream::BoxStream;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct FavoriteSync {
    favorites: Arc<dyn FavoriteRepository>,
    videos: Arc<dyn VideoRepository>,
    api: Arc<dyn CatalogApi>,
    env: SyncEnv,
    context: SyncContext,
}

impl FavoriteSync {
    pub fn new(
        favorites: Arc<dyn FavoriteRepository>,
        videos: Arc<dyn VideoRepository>,
        api: Arc<dyn CatalogApi>,
        env: SyncEnv,
    ) -> Self {
        Self {
            favorites,
            videos,
            api,
            env,
            context: SyncContext::new("favorites"),
        }
    }

    pub fn context(&self) -> &SyncContext {
        &self.context
    }

    /// Favorites, refetched when none are cached or the favorites interval
    /// has elapsed since the last remote sync.
    pub fn favorites(&self) -> BoxStream<'_, Resource<Vec<Favorite>>> {
        let store = self.favorites.as_ref();
        let interval = self.env.freshness.favorites_interval;

        synced_read(
            move || store.find_all(),
            move || async move {
                let mut favorites = self.env.caller.call(self.api.fetch_favorites()).await?;
                stamp_refreshed(&mut favorites, self.env.now());
                Ok::<_, RemoteError>(favorites)
            },
            move |favorites: Vec<Favorite>| async move {
                apply_remote_batch(store, &favorites).await?;
                self.context.mark_updated(self.env.now());
                self.backfill_videos(&favorites).await;
                Ok::<_, SyncError>(())
            },
            move |local: Vec<Favorite>| async move {
                let due = self.context.is_due(self.env.now(), interval);
                Ok::<_, Infallible>(local.is_empty() || due)
            },
        )
    }

    /// Locally cached videos of every favorite.
    pub async fn favorite_videos(&self) -> core_library::Result<Vec<Video>> {
        self.favorites.find_videos().await
    }

    /// Drop cached favorites and make the next read sync remotely.
    pub async fn invalidate(&self) -> core_library::Result<u64> {
        self.context.clear();
        self.favorites.clear().await
    }

    /// Insert every favorited video that is not cached yet.
    ///
    /// Failures are logged and leave the favorites sync itself successful.
    /// Returns the number of inserted videos.
    #[instrument(skip(self, favorites), fields(count = favorites.len()))]
    async fn backfill_videos(&self, favorites: &[Favorite]) -> usize {
        let ids: Vec<String> = favorites.iter().map(|f| f.video_id.clone()).collect();

        let missing = match self.videos.missing_ids(&ids).await {
            Ok(missing) => missing,
            Err(error) => {
                warn!(error = %error, "Could not look up favorited videos");
                return 0;
            }
        };

        if missing.is_empty() {
            debug!("Every favorited video is cached");
            return 0;
        }

        let mut videos = match self
            .env
            .caller
            .call(self.api.fetch_videos_by_ids(&missing))
            .await
        {
            Ok(videos) => videos,
            Err(error) => {
                warn!(error = %error, missing = missing.len(), "Video backfill fetch failed");
                return 0;
            }
        };
        stamp_refreshed(&mut videos, self.env.now());

        match apply_remote_batch(self.videos.as_ref(), &videos).await {
            Ok(stats) => {
                info!(inserted = stats.inserted, "Backfilled favorited videos");
                stats.inserted
            }
            Err(error) => {
                warn!(error = %error, "Failed to store backfilled videos");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::test_support::{clock, env, video, MockApi, NOW};
    use bridge_traits::{BridgeError, FixedClock};
    use core_library::create_test_pool;
    use core_library::repositories::{SqliteFavoriteRepository, SqliteVideoRepository, VersionedStore};
    use core_sync::collect_resources;

    struct Fixture {
        sync: FavoriteSync,
        favorites: Arc<SqliteFavoriteRepository>,
        videos: Arc<SqliteVideoRepository>,
        clock: Arc<FixedClock>,
    }

    async fn setup(api: MockApi) -> Fixture {
        let pool = create_test_pool().await.unwrap();
        let favorites = Arc::new(SqliteFavoriteRepository::new(pool.clone()));
        let videos = Arc::new(SqliteVideoRepository::new(pool));
        let clock = clock();
        let sync = FavoriteSync::new(
            favorites.clone(),
            videos.clone(),
            Arc::new(api),
            env(clock.clone()),
        );
        Fixture {
            sync,
            favorites,
            videos,
            clock,
        }
    }

    #[core_async::test]
    async fn test_sync_backfills_missing_videos_only() {
        let mut api = MockApi::new();
        api.expect_fetch_favorites()
            .times(1)
            .returning(|| Ok(vec![Favorite::new("a", 1), Favorite::new("b", 2)]));
        api.expect_fetch_videos_by_ids()
            .withf(|ids| ids == ["b".to_string()])
            .times(1)
            .returning(|_| Ok(vec![video("b", 1)]));
        let fixture = setup(api).await;
        fixture.videos.upsert(&video("a", 4)).await.unwrap();

        let emitted = collect_resources(fixture.sync.favorites()).await;

        assert_eq!(emitted.len(), 2);
        assert_eq!(fixture.favorites.count().await.unwrap(), 2);
        assert_eq!(fixture.videos.stored_version("a").await.unwrap(), Some(4));
        assert_eq!(
            fixture.videos.find_by_id("b").await.unwrap().unwrap().last_refreshed,
            NOW
        );
        assert_eq!(fixture.sync.context().last_update(), Some(NOW));
        assert_eq!(fixture.sync.favorite_videos().await.unwrap().len(), 2);
    }

    #[core_async::test]
    async fn test_backfill_failure_keeps_favorites() {
        let mut api = MockApi::new();
        api.expect_fetch_favorites()
            .returning(|| Ok(vec![Favorite::new("a", 1)]));
        api.expect_fetch_videos_by_ids()
            .returning(|_| Err(BridgeError::Connect("refused".to_string())));
        let fixture = setup(api).await;

        let emitted = collect_resources(fixture.sync.favorites()).await;

        assert!(emitted[1].is_success());
        assert_eq!(fixture.favorites.count().await.unwrap(), 1);
        assert!(fixture.videos.find_by_id("a").await.unwrap().is_none());
    }

    #[core_async::test]
    async fn test_interval_limits_remote_syncs() {
        let mut api = MockApi::new();
        api.expect_fetch_favorites()
            .times(2)
            .returning(|| Ok(vec![Favorite::new("a", 1)]));
        api.expect_fetch_videos_by_ids()
            .returning(|_| Ok(vec![video("a", 1)]));
        let fixture = setup(api).await;

        collect_resources(fixture.sync.favorites()).await;

        let emitted = collect_resources(fixture.sync.favorites()).await;
        assert_eq!(emitted.len(), 2);

        fixture.clock.advance(chrono::Duration::minutes(6));
        let emitted = collect_resources(fixture.sync.favorites()).await;
        assert_eq!(emitted.len(), 3);
    }

    #[core_async::test]
    async fn test_backfill_never_deletes_videos() {
        let mut api = MockApi::new();
        api.expect_fetch_favorites().returning(|| Ok(Vec::new()));
        let fixture = setup(api).await;
        fixture.videos.upsert(&video("old", 1)).await.unwrap();

        collect_resources(fixture.sync.favorites()).await;

        assert!(fixture.videos.find_by_id("old").await.unwrap().is_some());
    }

    #[core_async::test]
    async fn test_invalidate_resets_context() {
        let mut api = MockApi::new();
        api.expect_fetch_favorites()
            .returning(|| Ok(vec![Favorite::new("a", 1)]));
        api.expect_fetch_videos_by_ids().returning(|_| Ok(Vec::new()));
        let fixture = setup(api).await;

        collect_resources(fixture.sync.favorites()).await;
        assert!(fixture.sync.context().last_update().is_some());

        fixture.sync.invalidate().await.unwrap();
        assert_eq!(fixture.sync.context().last_update(), None);
        assert_eq!(fixture.favorites.count().await.unwrap(), 0);
    }
}
