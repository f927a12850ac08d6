//! # Entity Bindings
//!
//! Each binding ties the cache orchestrator, a freshness policy and versioned
//! merge to one entity kind. Every read returns a one-shot stream of
//! [`Resource`](core_sync::Resource) values.
//!
//! - `VideoSync` - Paginated catalog queries and single videos
//! - `CategorySync` - Categories, refreshed on a fixed TTL
//! - `CommentSync` - Comments per video
//! - `FavoriteSync` - Favorites, rate-limited, with video backfill
//! - `WatchHistorySync` - Playback progress and local watch recording
//! - `SearchSync` - URL-cached search results and search history

pub mod category;
pub mod comment;
pub mod favorite;
pub mod search;
pub mod video;
pub mod watch_history;

pub use category::{CategorySync, CATEGORIES_MARKER};
pub use comment::CommentSync;
pub use favorite::FavoriteSync;
pub use search::SearchSync;
pub use video::VideoSync;
pub use watch_history::WatchHistorySync;

use bridge_traits::Clock;
use core_runtime::{CoreConfig, FreshnessConfig};
use core_sync::RemoteCaller;
use std::sync::Arc;

/// Settings shared by every binding.
#[derive(Clone)]
pub struct SyncEnv {
    pub caller: RemoteCaller,
    pub clock: Arc<dyn Clock>,
    pub freshness: FreshnessConfig,
    pub page_size: u32,
}

impl SyncEnv {
    pub fn new(caller: RemoteCaller, clock: Arc<dyn Clock>) -> Self {
        Self {
            caller,
            clock,
            freshness: FreshnessConfig::default(),
            page_size: 20,
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        let mut caller = RemoteCaller::new(config.remote_timeout);
        if let Some(monitor) = &config.network_monitor {
            caller = caller.with_network_monitor(Arc::clone(monitor));
        }

        Self {
            caller,
            clock: Arc::clone(&config.clock),
            freshness: config.freshness.clone(),
            page_size: config.page_size,
        }
    }

    pub fn with_freshness(mut self, freshness: FreshnessConfig) -> Self {
        self.freshness = freshness;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn now(&self) -> i64 {
        self.clock.unix_timestamp()
    }
}

impl std::fmt::Debug for SyncEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEnv")
            .field("caller", &self.caller)
            .field("freshness", &self.freshness)
            .field("page_size", &self.page_size)
            .finish()
    }
}
