//! # Freshness Policies
//!
//! Per-entity rules deciding whether cached data must be refetched.
//!
//! All timestamps are unix seconds. A window is exceeded only when strictly
//! more time than the window has passed, and a missing timestamp is always
//! stale.

use bridge_traits::Clock;
use std::fmt::Display;
use std::time::Duration;
use tracing::{trace, warn};

/// What a policy needs to know about the local store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FreshnessSnapshot {
    /// Locally stored records relevant to the read (all rows, or rows matching a filter)
    pub record_count: i64,
    /// Oldest `last_refreshed` among those records
    pub oldest_refresh: Option<i64>,
    /// Last successful remote update of the whole entity
    pub last_update: Option<i64>,
}

impl FreshnessSnapshot {
    pub fn with_count(record_count: i64) -> Self {
        Self {
            record_count,
            ..Self::default()
        }
    }

    pub fn with_last_update(last_update: Option<i64>) -> Self {
        Self {
            last_update,
            ..Self::default()
        }
    }

    pub fn with_oldest(record_count: i64, oldest_refresh: Option<i64>) -> Self {
        Self {
            record_count,
            oldest_refresh,
            last_update: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreshnessPolicy {
    /// Stale once `window` has passed since the last remote update, or if
    /// there never was one.
    FixedTtl { window: Duration },
    /// Stale when nothing is cached or the oldest cached record has outlived
    /// `window`.
    EmptyOrOldest { window: Duration },
    /// Stale when no cached record matches the query.
    FilterCount,
    /// Always refetch.
    Always,
}

impl FreshnessPolicy {
    pub fn is_stale(&self, snapshot: &FreshnessSnapshot, now: i64) -> bool {
        let stale = match self {
            Self::FixedTtl { window } => is_expired(snapshot.last_update, *window, now),
            Self::EmptyOrOldest { window } => {
                snapshot.record_count == 0 || is_expired(snapshot.oldest_refresh, *window, now)
            }
            Self::FilterCount => snapshot.record_count == 0,
            Self::Always => true,
        };

        trace!(policy = ?self, ?snapshot, now, stale, "Evaluated freshness");
        stale
    }

    pub fn evaluate(&self, snapshot: &FreshnessSnapshot, clock: &dyn Clock) -> bool {
        self.is_stale(snapshot, clock.unix_timestamp())
    }
}

fn window_secs(window: Duration) -> i64 {
    i64::try_from(window.as_secs()).unwrap_or(i64::MAX)
}

/// Whether `timestamp` is older than `window` at `now`. `None` is expired.
pub fn is_expired(timestamp: Option<i64>, window: Duration, now: i64) -> bool {
    match timestamp {
        Some(at) => now.saturating_sub(at) > window_secs(window),
        None => true,
    }
}

/// Pages past the first are never served from the local store.
pub fn is_remote_only_page(page: u32) -> bool {
    page > 1
}

/// Oldest timestamp still valid for an expiry of `expiry` at `now`.
///
/// URL-keyed caches delete rows fetched before this instant.
pub fn expiry_cutoff(now: i64, expiry: Duration) -> i64 {
    now.saturating_sub(window_secs(expiry))
}

/// Resolve a fallible staleness check, failing toward a refresh.
pub fn fetch_or_default<E: Display>(result: Result<bool, E>) -> bool {
    match result {
        Ok(stale) => stale,
        Err(error) => {
            warn!(error = %error, "Staleness check failed, treating data as stale");
            true
        }
    }
}
