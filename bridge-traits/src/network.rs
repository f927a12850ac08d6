//! Network Monitoring Abstraction

use crate::error::Result;
use async_trait::async_trait;

/// Network connection type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkType {
    Cellular,
    WiFi,
    Ethernet,
    Other,
}

/// Network connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    Connected,
    Disconnected,
    /// Connection status unknown or indeterminate
    Indeterminate,
}

/// Network information
#[derive(Debug, Clone)]
pub struct NetworkInfo {
    pub status: NetworkStatus,
    pub network_type: Option<NetworkType>,
    /// Whether the connection is metered (has data limits/costs)
    pub is_metered: bool,
}

impl NetworkInfo {
    pub fn connected(network_type: NetworkType) -> Self {
        Self {
            status: NetworkStatus::Connected,
            network_type: Some(network_type),
            is_metered: matches!(network_type, NetworkType::Cellular),
        }
    }

    pub fn disconnected() -> Self {
        Self {
            status: NetworkStatus::Disconnected,
            network_type: None,
            is_metered: false,
        }
    }
}

/// Network monitor trait
///
/// Lets the remote leg of a sync fail immediately with "no connectivity"
/// when the host already knows it is offline.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::network::NetworkMonitor;
///
/// async fn should_sync(monitor: &dyn NetworkMonitor) -> bool {
///     monitor.is_connected().await
/// }
/// ```
#[async_trait]
pub trait NetworkMonitor: Send + Sync {
    /// Get current network information
    async fn get_network_info(&self) -> Result<NetworkInfo>;

    /// Check if currently connected to any network
    async fn is_connected(&self) -> bool {
        matches!(
            self.get_network_info().await,
            Ok(NetworkInfo {
                status: NetworkStatus::Connected,
                ..
            })
        )
    }

    /// True only when the monitor positively reports `Disconnected`.
    ///
    /// Monitor failures and indeterminate states are not treated as offline.
    async fn is_offline(&self) -> bool {
        matches!(
            self.get_network_info().await,
            Ok(NetworkInfo {
                status: NetworkStatus::Disconnected,
                ..
            })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;

    struct StaticMonitor(Option<NetworkInfo>);

    #[async_trait]
    impl NetworkMonitor for StaticMonitor {
        async fn get_network_info(&self) -> Result<NetworkInfo> {
            self.0
                .clone()
                .ok_or_else(|| BridgeError::NotAvailable("network info".to_string()))
        }
    }

    #[test]
    fn test_network_info_constructors() {
        let wifi = NetworkInfo::connected(NetworkType::WiFi);
        assert_eq!(wifi.status, NetworkStatus::Connected);
        assert!(!wifi.is_metered);

        let cellular = NetworkInfo::connected(NetworkType::Cellular);
        assert!(cellular.is_metered);

        let offline = NetworkInfo::disconnected();
        assert_eq!(offline.status, NetworkStatus::Disconnected);
        assert_eq!(offline.network_type, None);
    }

    #[core_async::test]
    async fn test_is_offline_requires_positive_report() {
        let offline = StaticMonitor(Some(NetworkInfo::disconnected()));
        assert!(offline.is_offline().await);
        assert!(!offline.is_connected().await);

        let failing = StaticMonitor(None);
        assert!(!failing.is_offline().await);
        assert!(!failing.is_connected().await);
    }
}
