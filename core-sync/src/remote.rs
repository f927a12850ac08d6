//! # Result Normalizer
//!
//! Wraps remote calls so that every failure leaves as a [`RemoteError`].
//!
//! [`safe_call`] classifies whatever error the call produced. [`RemoteCaller`]
//! adds the per-call policies configured for the process: a deadline and an
//! optional connectivity check that fails fast while the host is offline.
//!
//! ```ignore
//! let caller = RemoteCaller::new(Duration::from_secs(30))
//!     .with_network_monitor(monitor);
//!
//! let videos = caller.call(api.fetch_categories()).await?;
//! ```

use crate::error::RemoteError;
use bridge_traits::NetworkMonitor;
use core_async::time::{timeout, Duration};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Await `call` and classify its failure.
///
/// The raw error is logged before classification.
pub async fn safe_call<T, E, F>(call: F) -> Result<T, RemoteError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<RemoteError> + Display,
{
    match call.await {
        Ok(value) => Ok(value),
        Err(error) => {
            warn!(error = %error, "Remote call failed");
            let classified = error.into();
            debug!(kind = ?classified, "Classified remote failure");
            Err(classified)
        }
    }
}

/// Configured result normalizer shared by every entity binding.
#[derive(Clone)]
pub struct RemoteCaller {
    timeout: Duration,
    network_monitor: Option<Arc<dyn NetworkMonitor>>,
}

impl RemoteCaller {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            network_monitor: None,
        }
    }

    pub fn with_network_monitor(mut self, monitor: Arc<dyn NetworkMonitor>) -> Self {
        self.network_monitor = Some(monitor);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `call` under the configured deadline.
    ///
    /// Returns `NoConnectivity` without polling `call` when the network
    /// monitor positively reports the host offline, and `Timeout` when the
    /// deadline elapses first.
    pub async fn call<T, E, F>(&self, call: F) -> Result<T, RemoteError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<RemoteError> + Display,
    {
        if let Some(monitor) = &self.network_monitor {
            if monitor.is_offline().await {
                warn!("Skipping remote call, network is offline");
                return Err(RemoteError::NoConnectivity);
            }
        }

        match timeout(self.timeout, safe_call(call)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Remote call timed out"
                );
                Err(RemoteError::Timeout)
            }
        }
    }
}

impl std::fmt::Debug for RemoteCaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCaller")
            .field("timeout", &self.timeout)
            .field("network_monitor", &self.network_monitor.is_some())
            .finish()
    }
}
