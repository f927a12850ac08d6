//! Per-entity sync context
//!
//! Holds the instant of the last successful remote update of one entity.
//! The value lives only as long as the owning repository and is never
//! persisted, so a fresh process always starts out due for a refresh.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tracing::debug;

const NEVER: i64 = i64::MIN;

#[derive(Debug)]
pub struct SyncContext {
    name: &'static str,
    last_update: AtomicI64,
}

impl SyncContext {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            last_update: AtomicI64::new(NEVER),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn mark_updated(&self, now: i64) {
        self.last_update.store(now, Ordering::SeqCst);
        debug!(entity = self.name, at = now, "Marked entity as updated");
    }

    pub fn last_update(&self) -> Option<i64> {
        match self.last_update.load(Ordering::SeqCst) {
            NEVER => None,
            at => Some(at),
        }
    }

    /// Whether more than `interval` has passed since the last update, or no
    /// update has happened yet.
    pub fn is_due(&self, now: i64, interval: Duration) -> bool {
        crate::freshness::is_expired(self.last_update(), interval, now)
    }

    pub fn clear(&self) {
        self.last_update.store(NEVER, Ordering::SeqCst);
        debug!(entity = self.name, "Cleared sync context");
    }
}
