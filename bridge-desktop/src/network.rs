//! Network Monitoring Implementation

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    network::{NetworkInfo, NetworkMonitor, NetworkType},
};
use core_async::sync::Mutex;
use core_async::time::{timeout, Duration, Instant};
use tracing::debug;

/// Desktop network monitor
///
/// Reachability is decided by opening a TCP connection to a probe address
/// (normally the catalog API host). Results are cached for `cache_ttl` so a
/// burst of synchronized reads does not probe once per call.
pub struct DesktopNetworkMonitor {
    probe_addr: String,
    probe_timeout: Duration,
    cache_ttl: Duration,
    cached: Mutex<Option<(Instant, NetworkInfo)>>,
}

impl DesktopNetworkMonitor {
    /// Create a monitor probing `probe_addr` (`host:port`).
    pub fn new(probe_addr: impl Into<String>) -> Self {
        Self {
            probe_addr: probe_addr.into(),
            probe_timeout: Duration::from_secs(3),
            cache_ttl: Duration::from_secs(10),
            cached: Mutex::new(None),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    async fn probe(&self) -> NetworkInfo {
        match timeout(
            self.probe_timeout,
            tokio::net::TcpStream::connect(self.probe_addr.as_str()),
        )
        .await
        {
            // Desktop APIs do not expose the link type without platform crates.
            Ok(Ok(_)) => NetworkInfo::connected(NetworkType::Other),
            Ok(Err(_)) | Err(_) => NetworkInfo::disconnected(),
        }
    }
}

#[async_trait]
impl NetworkMonitor for DesktopNetworkMonitor {
    async fn get_network_info(&self) -> Result<NetworkInfo> {
        let mut cached = self.cached.lock().await;

        if let Some((checked_at, info)) = cached.as_ref() {
            if checked_at.elapsed() < self.cache_ttl {
                return Ok(info.clone());
            }
        }

        let info = self.probe().await;
        debug!(probe = %self.probe_addr, status = ?info.status, "Network info updated");
        *cached = Some((Instant::now(), info.clone()));

        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::network::NetworkStatus;

    #[core_async::test]
    async fn test_unreachable_probe_reports_disconnected() {
        // Port 9 on an unroutable TEST-NET address never answers.
        let monitor = DesktopNetworkMonitor::new("192.0.2.1:9")
            .with_probe_timeout(Duration::from_millis(50));

        let info = monitor.get_network_info().await.unwrap();
        assert_eq!(info.status, NetworkStatus::Disconnected);
        assert!(monitor.is_offline().await);
    }

    #[core_async::test]
    async fn test_local_listener_reports_connected() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let monitor = DesktopNetworkMonitor::new(addr.to_string());
        let info = monitor.get_network_info().await.unwrap();

        assert_eq!(info.status, NetworkStatus::Connected);
        assert!(monitor.is_connected().await);
    }
}
