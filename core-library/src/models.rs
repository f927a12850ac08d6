//! Domain models for the video catalog
//!
//! Every synchronizable record carries a stable `id`, a non-negative
//! `version` that increases on each authoritative update, and
//! `last_refreshed`, the unix time (seconds) of the last write that came from
//! the remote source.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Identity and version of a record that takes part in versioned merge.
pub trait Versioned {
    fn id(&self) -> &str;
    fn version(&self) -> i64;
    fn last_refreshed(&self) -> i64;

    /// Record that this copy was just received from the remote source.
    fn mark_refreshed(&mut self, at: i64);
}

macro_rules! impl_versioned {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Versioned for $ty {
                fn id(&self) -> &str {
                    &self.id
                }

                fn version(&self) -> i64 {
                    self.version
                }

                fn last_refreshed(&self) -> i64 {
                    self.last_refreshed
                }

                fn mark_refreshed(&mut self, at: i64) {
                    self.last_refreshed = at;
                }
            }
        )+
    };
}

impl_versioned!(Video, Category, Comment, Favorite, WatchHistoryEntry, SearchHistoryEntry);

fn validate_identity(kind: &str, id: &str, version: i64) -> Result<(), String> {
    if id.trim().is_empty() {
        return Err(format!("{} id cannot be empty", kind));
    }

    if version < 0 {
        return Err(format!("{} version cannot be negative", kind));
    }

    Ok(())
}

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Video {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Catalog type, e.g. `movie` or `series`
    pub video_type: String,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub duration_secs: Option<i64>,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub last_refreshed: i64,
}

impl Video {
    pub fn new(id: impl Into<String>, title: impl Into<String>, video_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            video_type: video_type.into(),
            category_id: None,
            year: None,
            thumbnail_url: None,
            duration_secs: None,
            version: 0,
            last_refreshed: 0,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_identity("Video", &self.id, self.version)?;

        if self.title.trim().is_empty() {
            return Err("Video title cannot be empty".to_string());
        }

        if let Some(duration) = self.duration_secs {
            if duration < 0 {
                return Err("Video duration cannot be negative".to_string());
            }
        }

        Ok(())
    }

    /// Whether the video satisfies every set criterion of `filter`.
    pub fn matches(&self, filter: &VideoFilter) -> bool {
        filter
            .video_type
            .as_ref()
            .map_or(true, |t| &self.video_type == t)
            && filter
                .category_id
                .as_ref()
                .map_or(true, |c| self.category_id.as_ref() == Some(c))
            && filter.year.map_or(true, |y| self.year == Some(y))
    }
}

/// Criteria for paginated catalog queries. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoFilter {
    pub video_type: Option<String>,
    pub category_id: Option<String>,
    pub year: Option<i32>,
}

impl VideoFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, video_type: impl Into<String>) -> Self {
        self.video_type = Some(video_type.into());
        self
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub last_refreshed: i64,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: 0,
            last_refreshed: 0,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_identity("Category", &self.id, self.version)?;

        if self.name.trim().is_empty() {
            return Err("Category name cannot be empty".to_string());
        }

        Ok(())
    }
}

/// Comment posted on a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: String,
    pub video_id: String,
    pub author: String,
    pub body: String,
    /// Unix seconds when the comment was posted
    pub created_at: i64,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub last_refreshed: i64,
}

impl Comment {
    pub fn validate(&self) -> Result<(), String> {
        validate_identity("Comment", &self.id, self.version)?;

        if self.video_id.trim().is_empty() {
            return Err("Comment must reference a video".to_string());
        }

        Ok(())
    }
}

/// A favorited video. The id is the favorited video's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Favorite {
    pub id: String,
    pub video_id: String,
    pub added_at: i64,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub last_refreshed: i64,
}

impl Favorite {
    pub fn new(video_id: impl Into<String>, added_at: i64) -> Self {
        let video_id = video_id.into();
        Self {
            id: video_id.clone(),
            video_id,
            added_at,
            version: 0,
            last_refreshed: 0,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_identity("Favorite", &self.id, self.version)?;

        if self.video_id.trim().is_empty() {
            return Err("Favorite must reference a video".to_string());
        }

        Ok(())
    }
}

/// Playback progress, one row per video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct WatchHistoryEntry {
    pub id: String,
    pub video_id: String,
    pub position_secs: i64,
    pub watched_at: i64,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub last_refreshed: i64,
}

impl WatchHistoryEntry {
    pub fn validate(&self) -> Result<(), String> {
        validate_identity("WatchHistoryEntry", &self.id, self.version)?;

        if self.position_secs < 0 {
            return Err("Watch position cannot be negative".to_string());
        }

        Ok(())
    }
}

/// A past search. The id is the normalized query text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SearchHistoryEntry {
    pub id: String,
    pub query: String,
    pub searched_at: i64,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub last_refreshed: i64,
}

impl SearchHistoryEntry {
    /// Normalize a query into its history key (lowercase, trimmed)
    pub fn normalize(query: &str) -> String {
        query.trim().to_lowercase()
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_identity("SearchHistoryEntry", &self.id, self.version)?;

        if self.query.trim().is_empty() {
            return Err("Search query cannot be empty".to_string());
        }

        Ok(())
    }
}

/// Raw remote response cached under its request URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CachedResponse {
    pub url: String,
    pub body: String,
    /// Unix seconds when the response was stored
    pub fetched_at: i64,
}
