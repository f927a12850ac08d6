//! Catalog categories

use super::SyncEnv;
use crate::api::CatalogApi;
use core_library::models::Category;
use core_library::repositories::{CategoryRepository, SyncMarkerRepository};
use core_library::LibraryError;
use core_sync::{
    apply_remote_batch, stamp_refreshed, synced_read, FreshnessPolicy, FreshnessSnapshot,
    RemoteError, Resource, SyncError,
};
use futures::stream::BoxStream;
use std::sync::Arc;

/// Sync marker key of the last remote category update
pub const CATEGORIES_MARKER: &str = "categories";

pub struct CategorySync {
    categories: Arc<dyn CategoryRepository>,
    markers: Arc<dyn SyncMarkerRepository>,
    api: Arc<dyn CatalogApi>,
    env: SyncEnv,
}

impl CategorySync {
    pub fn new(
        categories: Arc<dyn CategoryRepository>,
        markers: Arc<dyn SyncMarkerRepository>,
        api: Arc<dyn CatalogApi>,
        env: SyncEnv,
    ) -> Self {
        Self {
            categories,
            markers,
            api,
            env,
        }
    }

    /// All categories, refetched once the category TTL has passed since the
    /// last remote update.
    pub fn categories(&self) -> BoxStream<'_, Resource<Vec<Category>>> {
        let store = self.categories.as_ref();
        let markers = self.markers.as_ref();
        let policy = FreshnessPolicy::FixedTtl {
            window: self.env.freshness.category_ttl,
        };

        synced_read(
            move || store.find_all(),
            move || async move {
                let mut categories = self.env.caller.call(self.api.fetch_categories()).await?;
                stamp_refreshed(&mut categories, self.env.now());
                Ok::<_, RemoteError>(categories)
            },
            move |categories: Vec<Category>| async move {
                apply_remote_batch(store, &categories).await?;
                markers.mark(CATEGORIES_MARKER, self.env.now()).await?;
                Ok::<_, SyncError>(())
            },
            move |_| async move {
                let last_update = markers.last_update(CATEGORIES_MARKER).await?;
                let snapshot = FreshnessSnapshot::with_last_update(last_update);
                Ok::<_, LibraryError>(policy.is_stale(&snapshot, self.env.now()))
            },
        )
    }

    /// Drop cached categories and forget the last update.
    pub async fn invalidate(&self) -> core_library::Result<()> {
        self.categories.clear().await?;
        self.markers.clear(CATEGORIES_MARKER).await
    }
}
