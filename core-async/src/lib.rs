//! Async runtime facade for the video platform core.
//!
//! Every core-* crate goes through this crate instead of depending on Tokio
//! directly, which keeps the executor swappable in one place.
//!
//! # Modules
//!
//! - `runtime`: blocking entry points (`block_on`)
//! - `task`: task spawning
//! - `time`: sleep, timeouts, durations
//! - `sync`: async-aware locks and channels
//!
//! # Examples
//!
//! ```rust
//! use core_async::time::{timeout, Duration};
//!
//! async fn example() {
//!     let value = timeout(Duration::from_secs(1), async { 42 }).await;
//!     assert_eq!(value.ok(), Some(42));
//! }
//! ```

// Entry-point/test macros, re-exported so callers only depend on core-async.
pub use core_async_macros::{main, test};

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};
