//! Time-related operations.
//!
//! `timeout` is what the remote leg of a synchronized read uses to bound a
//! single network call; an elapsed deadline surfaces as [`Elapsed`].

pub use tokio::time::{error::Elapsed, interval, sleep, sleep_until, timeout, Interval, Sleep, Timeout};

pub use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
