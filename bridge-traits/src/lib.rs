//! # Host Bridge Traits
//!
//! Capability contracts the core needs from the host platform.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP used by the remote catalog API
//! - [`NetworkMonitor`](network::NetworkMonitor) - Connectivity detection, lets the
//!   sync engine fail fast with "no connectivity" instead of waiting on a timeout
//! - [`Clock`](time::Clock) - Time source; freshness policies read "now" from it
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should map platform faults onto the most specific variant (`Timeout`,
//! `Connect`, `Http`) because the sync engine classifies remote failures from it.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so handles can be shared across tasks.

pub mod error;
pub mod http;
pub mod network;
pub mod time;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use network::{NetworkInfo, NetworkMonitor, NetworkStatus, NetworkType};
pub use time::{Clock, ConsoleLogger, FixedClock, LogEntry, LogLevel, LoggerSink, SystemClock};
