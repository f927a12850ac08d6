//! # Core Configuration Module
//!
//! Configuration for the Video Platform Core.
//!
//! ## Overview
//!
//! A builder assembles a [`CoreConfig`] holding the injected bridges and the
//! tuning knobs of the synchronization engine. Validation is fail-fast: an
//! unusable configuration is rejected by [`CoreConfigBuilder::build`] instead
//! of surfacing later as a runtime fault.
//!
//! ## Required settings
//!
//! - `database_path` - SQLite database file (`:memory:` for an ephemeral store)
//! - `api_base_url` - root URL of the catalog API
//! - `HttpClient` - required unless the `desktop-shims` feature supplies reqwest
//!
//! ## Optional settings
//!
//! - `api_token` - bearer token attached to every API request
//! - `NetworkMonitor` - lets remote calls fail fast while offline
//! - `Clock` - time source for freshness decisions (default: system clock)
//! - `remote_timeout`, `page_size`, [`FreshnessConfig`]
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/path/to/videos.db")
//!     .api_base_url("https://api.example.com/v1")
//!     .api_token("secret")
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{Clock, HttpClient, NetworkMonitor, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const HOUR: u64 = 60 * 60;

/// Upper bound accepted for `page_size`.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Expiry windows of the per-entity freshness policies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreshnessConfig {
    /// Categories refetch after this long since the last remote update.
    pub category_ttl: Duration,
    /// Comments on a video refetch once the oldest cached row is this old.
    pub comment_ttl: Duration,
    /// A single cached video is re-read remotely once this old.
    pub video_ttl: Duration,
    pub watch_history_ttl: Duration,
    pub search_history_ttl: Duration,
    /// Cached search responses older than this are stale and swept.
    pub url_cache_ttl: Duration,
    /// Minimum spacing between two remote favorites syncs.
    pub favorites_interval: Duration,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            category_ttl: Duration::from_secs(48 * HOUR),
            comment_ttl: Duration::from_secs(24 * HOUR),
            video_ttl: Duration::from_secs(12 * HOUR),
            watch_history_ttl: Duration::from_secs(6 * HOUR),
            search_history_ttl: Duration::from_secs(6 * HOUR),
            url_cache_ttl: Duration::from_secs(HOUR),
            favorites_interval: Duration::from_secs(5 * 60),
        }
    }
}

impl FreshnessConfig {
    pub fn validate(&self) -> Result<()> {
        let windows = [
            ("category_ttl", self.category_ttl),
            ("comment_ttl", self.comment_ttl),
            ("video_ttl", self.video_ttl),
            ("watch_history_ttl", self.watch_history_ttl),
            ("search_history_ttl", self.search_history_ttl),
            ("url_cache_ttl", self.url_cache_ttl),
            ("favorites_interval", self.favorites_interval),
        ];

        for (name, window) in windows {
            if window.is_zero() {
                return Err(Error::Config(format!(
                    "Freshness window '{}' must be greater than zero",
                    name
                )));
            }
        }

        Ok(())
    }
}

/// Core configuration for the Video Platform Core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Path to the SQLite database file
    pub database_path: PathBuf,

    /// Base URL of the catalog API, without trailing slash
    pub api_base_url: String,

    pub api_token: Option<String>,

    pub http_client: Arc<dyn HttpClient>,

    /// Network connectivity monitor (optional)
    pub network_monitor: Option<Arc<dyn NetworkMonitor>>,

    pub clock: Arc<dyn Clock>,

    /// Upper bound for a single remote call, retries included
    pub remote_timeout: Duration,

    /// Items per page for paginated catalog queries
    pub page_size: u32,

    pub freshness: FreshnessConfig,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("http_client", &"HttpClient { ... }")
            .field(
                "network_monitor",
                &self.network_monitor.as_ref().map(|_| "NetworkMonitor { ... }"),
            )
            .field("remote_timeout", &self.remote_timeout)
            .field("page_size", &self.page_size)
            .field("freshness", &self.freshness)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Whether the configured database lives only in memory.
    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == ":memory:"
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Database path is not empty
    /// - API base URL is an http(s) URL
    /// - Remote timeout is non-zero
    /// - Page size is within `1..=MAX_PAGE_SIZE`
    /// - Every freshness window is non-zero
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return Err(Error::Config(format!(
                "API base URL must start with http:// or https://, got '{}'",
                self.api_base_url
            )));
        }

        if self.remote_timeout.is_zero() {
            return Err(Error::Config(
                "Remote timeout must be greater than zero".to_string(),
            ));
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::Config(format!(
                "Page size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }

        self.freshness.validate()
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::with_timeout(timeout)
        .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for the remote catalog API. \
                 Desktop: enable the 'desktop-shims' feature to use the default ReqwestHttpClient. \
                 Other hosts: inject a native HTTP client with .http_client()."
            .to_string(),
    })
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    api_base_url: Option<String>,
    api_token: Option<String>,
    http_client: Option<Arc<dyn HttpClient>>,
    network_monitor: Option<Arc<dyn NetworkMonitor>>,
    clock: Option<Arc<dyn Clock>>,
    remote_timeout: Option<Duration>,
    page_size: Option<u32>,
    freshness: Option<FreshnessConfig>,
}

impl CoreConfigBuilder {
    /// Sets the database path.
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder().database_path("/path/to/videos.db");
    /// ```
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the catalog API root. A trailing slash is dropped.
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.api_base_url = Some(url.trim_end_matches('/').to_string());
        self
    }

    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Sets the HTTP client implementation.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the network monitor implementation (optional).
    pub fn network_monitor(mut self, monitor: Arc<dyn NetworkMonitor>) -> Self {
        self.network_monitor = Some(monitor);
        self
    }

    /// Overrides the time source; tests inject a `FixedClock`.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = Some(timeout);
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn freshness(mut self, freshness: FreshnessConfig) -> Self {
        self.freshness = Some(freshness);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// Returns an error if a required setting is missing, the HTTP client
    /// cannot be defaulted, or [`CoreConfig::validate`] fails.
    pub fn build(self) -> Result<CoreConfig> {
        let database_path = self.database_path.ok_or_else(|| {
            Error::Config("Database path is required. Use .database_path() to set it.".to_string())
        })?;

        let api_base_url = self.api_base_url.ok_or_else(|| {
            Error::Config("API base URL is required. Use .api_base_url() to set it.".to_string())
        })?;

        let remote_timeout = self.remote_timeout.unwrap_or(Duration::from_secs(30));

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(remote_timeout)?,
        };

        let config = CoreConfig {
            database_path,
            api_base_url,
            api_token: self.api_token,
            http_client,
            network_monitor: self.network_monitor,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            remote_timeout,
            page_size: self.page_size.unwrap_or(20),
            freshness: self.freshness.unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{BridgeError, HttpRequest, HttpResponse};

    struct MockHttpClient;

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn execute(&self, _request: HttpRequest) -> std::result::Result<HttpResponse, BridgeError> {
            Err(BridgeError::NotAvailable("mock".to_string()))
        }
    }

    fn builder() -> CoreConfigBuilder {
        CoreConfig::builder()
            .database_path("/tmp/videos.db")
            .api_base_url("https://api.example.com/v1/")
            .http_client(Arc::new(MockHttpClient))
    }

    #[test]
    fn test_builder_applies_defaults() {
        let config = builder().build().unwrap();

        assert_eq!(config.api_base_url, "https://api.example.com/v1");
        assert_eq!(config.remote_timeout, Duration::from_secs(30));
        assert_eq!(config.page_size, 20);
        assert_eq!(config.freshness, FreshnessConfig::default());
        assert!(config.api_token.is_none());
        assert!(config.network_monitor.is_none());
        assert!(!config.is_in_memory());
    }

    #[test]
    fn test_freshness_defaults() {
        let freshness = FreshnessConfig::default();
        assert_eq!(freshness.category_ttl, Duration::from_secs(48 * 3600));
        assert_eq!(freshness.comment_ttl, Duration::from_secs(24 * 3600));
        assert_eq!(freshness.url_cache_ttl, Duration::from_secs(3600));
        assert_eq!(freshness.favorites_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_builder_requires_database_path() {
        let result = CoreConfig::builder()
            .api_base_url("https://api.example.com")
            .http_client(Arc::new(MockHttpClient))
            .build();

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Database path is required"));
    }

    #[test]
    fn test_builder_requires_api_base_url() {
        let result = CoreConfig::builder()
            .database_path(":memory:")
            .http_client(Arc::new(MockHttpClient))
            .build();

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("API base URL is required"));
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let result = builder().api_base_url("ftp://example.com").build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_page_size_out_of_range() {
        assert!(builder().page_size(0).build().is_err());
        assert!(builder().page_size(MAX_PAGE_SIZE + 1).build().is_err());
        assert!(builder().page_size(MAX_PAGE_SIZE).build().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let result = builder().remote_timeout(Duration::ZERO).build();
        assert!(result.unwrap_err().to_string().contains("Remote timeout"));
    }

    #[test]
    fn test_validate_rejects_zero_freshness_window() {
        let freshness = FreshnessConfig {
            comment_ttl: Duration::ZERO,
            ..FreshnessConfig::default()
        };
        let result = builder().freshness(freshness).build();
        assert!(result.unwrap_err().to_string().contains("comment_ttl"));
    }

    #[test]
    fn test_in_memory_database() {
        let config = builder().database_path(":memory:").build().unwrap();
        assert!(config.is_in_memory());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = builder().api_token("super-secret").build().unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret"));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_http_client_is_capability_error() {
        let result = CoreConfig::builder()
            .database_path(":memory:")
            .api_base_url("https://api.example.com")
            .build();

        assert!(matches!(result, Err(Error::CapabilityMissing { .. })));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_desktop_default_http_client() {
        let result = CoreConfig::builder()
            .database_path(":memory:")
            .api_base_url("https://api.example.com")
            .build();

        assert!(result.is_ok());
    }
}
