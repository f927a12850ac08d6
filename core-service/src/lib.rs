//! Core service façade and bootstrap helpers.
//!
//! This crate wires the host-provided bridges from a [`CoreConfig`] into the
//! local store, the catalog API and the sync engine, and exposes one binding
//! per catalog entity. Desktop apps typically enable the `desktop-shims`
//! feature, which supplies a reqwest HTTP client when the host does not.

pub mod api;
pub mod bindings;
pub mod error;

pub use api::{CatalogApi, HttpCatalogApi};
pub use bindings::{
    CategorySync, CommentSync, FavoriteSync, SearchSync, SyncEnv, VideoSync, WatchHistorySync,
};
pub use error::{CoreError, Result};

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop::{DesktopNetworkMonitor, ReqwestHttpClient};

use core_library::db::{create_pool, DatabaseConfig};
use core_library::repositories::{
    SqliteCategoryRepository, SqliteCommentRepository, SqliteFavoriteRepository,
    SqliteSearchHistoryRepository, SqliteSyncMarkerRepository, SqliteUrlCacheRepository,
    SqliteVideoRepository, SqliteWatchHistoryRepository,
};
use core_runtime::CoreConfig;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::info;

/// Primary façade exposed to host applications.
pub struct CoreService {
    videos: VideoSync,
    categories: CategorySync,
    comments: CommentSync,
    favorites: FavoriteSync,
    watch_history: WatchHistorySync,
    search: SearchSync,
}

impl CoreService {
    /// Open the database and build every binding over the HTTP catalog API.
    ///
    /// ```ignore
    /// let config = CoreConfig::builder()
    ///     .database_path("videos.db")
    ///     .api_base_url("https://api.example.com/v1")
    ///     .build()?;
    /// let core = CoreService::bootstrap(config).await?;
    /// let mut categories = core.categories().categories();
    /// ```
    pub async fn bootstrap(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        let pool = create_pool(DatabaseConfig::new(&config.database_path))
            .await
            .map_err(|err| CoreError::InitializationFailed(err.to_string()))?;

        let mut api = HttpCatalogApi::new(Arc::clone(&config.http_client), &config.api_base_url);
        if let Some(token) = &config.api_token {
            api = api.with_token(token.clone());
        }

        info!(
            database = %config.database_path.display(),
            api = %config.api_base_url,
            "Core service initialized"
        );
        Ok(Self::with_api(&config, pool, Arc::new(api)))
    }

    /// Build the bindings over an existing pool and catalog API.
    pub fn with_api(config: &CoreConfig, pool: SqlitePool, api: Arc<dyn CatalogApi>) -> Self {
        let env = SyncEnv::from_config(config);
        let videos = Arc::new(SqliteVideoRepository::new(pool.clone()));

        Self {
            videos: VideoSync::new(videos.clone(), Arc::clone(&api), env.clone()),
            categories: CategorySync::new(
                Arc::new(SqliteCategoryRepository::new(pool.clone())),
                Arc::new(SqliteSyncMarkerRepository::new(pool.clone())),
                Arc::clone(&api),
                env.clone(),
            ),
            comments: CommentSync::new(
                Arc::new(SqliteCommentRepository::new(pool.clone())),
                Arc::clone(&api),
                env.clone(),
            ),
            favorites: FavoriteSync::new(
                Arc::new(SqliteFavoriteRepository::new(pool.clone())),
                videos,
                Arc::clone(&api),
                env.clone(),
            ),
            watch_history: WatchHistorySync::new(
                Arc::new(SqliteWatchHistoryRepository::new(pool.clone())),
                Arc::clone(&api),
                env.clone(),
            ),
            search: SearchSync::new(
                Arc::new(SqliteUrlCacheRepository::new(pool.clone())),
                Arc::new(SqliteSearchHistoryRepository::new(pool)),
                api,
                env,
            ),
        }
    }

    pub fn videos(&self) -> &VideoSync {
        &self.videos
    }

    pub fn categories(&self) -> &CategorySync {
        &self.categories
    }

    pub fn comments(&self) -> &CommentSync {
        &self.comments
    }

    pub fn favorites(&self) -> &FavoriteSync {
        &self.favorites
    }

    pub fn watch_history(&self) -> &WatchHistorySync {
        &self.watch_history
    }

    pub fn search(&self) -> &SearchSync {
        &self.search
    }

    /// Drop every cached remote entity. Local watch and search history are
    /// kept.
    pub async fn clear_cache(&self) -> Result<()> {
        self.videos.invalidate().await?;
        self.categories.invalidate().await?;
        self.comments.invalidate_all().await?;
        self.favorites.invalidate().await?;
        self.search.invalidate().await?;
        info!("Cleared catalog cache");
        Ok(())
    }
}
