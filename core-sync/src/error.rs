use bridge_traits::BridgeError;
use core_library::LibraryError;
use std::io;
use thiserror::Error;

/// Classified failure of the remote leg of a synchronized read.
///
/// Only the result normalizer in [`crate::remote`] produces these; everything
/// above it treats any variant as "remote leg failed".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Request timed out")]
    Timeout,

    #[error("No network connectivity")]
    NoConnectivity,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server responded with status {status}")]
    Server { status: u16, body: Option<String> },

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl RemoteError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn classify_io(error: &io::Error) -> RemoteError {
    match error.kind() {
        io::ErrorKind::TimedOut => RemoteError::Timeout,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::NotConnected
        | io::ErrorKind::AddrNotAvailable => RemoteError::NoConnectivity,
        _ => RemoteError::Network(error.to_string()),
    }
}

impl From<BridgeError> for RemoteError {
    fn from(error: BridgeError) -> Self {
        match error {
            BridgeError::Timeout(_) => Self::Timeout,
            BridgeError::Connect(_) => Self::NoConnectivity,
            BridgeError::Http { status, body } => Self::Server { status, body },
            BridgeError::Io(e) => classify_io(&e),
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<io::Error> for RemoteError {
    fn from(error: io::Error) -> Self {
        classify_io(&error)
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(error: serde_json::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Local store error: {0}")]
    Library(#[from] LibraryError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_error_classification() {
        assert_eq!(
            RemoteError::from(BridgeError::Timeout("slow".into())),
            RemoteError::Timeout
        );
        assert_eq!(
            RemoteError::from(BridgeError::Connect("refused".into())),
            RemoteError::NoConnectivity
        );
        assert_eq!(
            RemoteError::from(BridgeError::Http {
                status: 404,
                body: Some("missing".into())
            }),
            RemoteError::Server {
                status: 404,
                body: Some("missing".into())
            }
        );
        assert!(matches!(
            RemoteError::from(BridgeError::Decode("bad json".into())),
            RemoteError::Unknown(_)
        ));
    }

    #[test]
    fn test_io_error_classification() {
        let timed_out = io::Error::new(io::ErrorKind::TimedOut, "t");
        assert_eq!(RemoteError::from(timed_out), RemoteError::Timeout);

        let refused = io::Error::new(io::ErrorKind::ConnectionRefused, "r");
        assert_eq!(
            RemoteError::from(BridgeError::Io(refused)),
            RemoteError::NoConnectivity
        );

        let reset = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        assert!(matches!(RemoteError::from(reset), RemoteError::Network(_)));
    }

    #[test]
    fn test_json_error_is_unknown() {
        let error = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(matches!(RemoteError::from(error), RemoteError::Unknown(_)));
    }

    #[test]
    fn test_server_status() {
        let error = RemoteError::Server {
            status: 503,
            body: None,
        };
        assert_eq!(error.status(), Some(503));
        assert_eq!(error.to_string(), "Server responded with status 503");
        assert_eq!(RemoteError::Timeout.status(), None);
    }
}
