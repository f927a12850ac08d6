//! # Repository Pattern Implementation
//!
//! One repository per entity, each exclusively owning its table.
//!
//! ## Architecture
//!
//! - Traits define the interface for each repository
//! - SQLite implementations use sqlx for async database access
//! - Every synchronizable repository is also a [`VersionedStore`], the seam
//!   versioned merge writes through
//! - Pagination is supported via the `Page<T>` wrapper (1-based pages)
//!
//! ## Available Repositories
//!
//! - `VideoRepository` - Catalog entries, filterable by type/category/year
//! - `CategoryRepository` - Catalog categories
//! - `CommentRepository` - Comments per video
//! - `FavoriteRepository` - Favorited videos
//! - `WatchHistoryRepository` - Playback progress per video
//! - `SearchHistoryRepository` - Past search queries
//! - `UrlCacheRepository` - Raw responses keyed by request URL
//! - `SyncMarkerRepository` - Last remote update per entity key

pub mod category;
pub mod comment;
pub mod favorite;
pub mod pagination;
pub mod search_history;
pub mod sync_marker;
pub mod url_cache;
pub mod versioned;
pub mod video;
pub mod watch_history;

pub use category::{CategoryRepository, SqliteCategoryRepository};
pub use comment::{CommentRepository, SqliteCommentRepository};
pub use favorite::{FavoriteRepository, SqliteFavoriteRepository};
pub use pagination::{Page, PageRequest};
pub use search_history::{SearchHistoryRepository, SqliteSearchHistoryRepository};
pub use sync_marker::{SqliteSyncMarkerRepository, SyncMarkerRepository};
pub use url_cache::{SqliteUrlCacheRepository, UrlCacheRepository};
pub use versioned::VersionedStore;
pub use video::{SqliteVideoRepository, VideoRepository};
pub use watch_history::{SqliteWatchHistoryRepository, WatchHistoryRepository};
