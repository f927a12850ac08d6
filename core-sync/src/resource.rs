//! Tri-state value emitted by synchronized reads

/// Progress of one synchronized read.
///
/// `Error` carries the last-known local data when any existed, so a failed
/// refresh never hides cached content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource<T> {
    Loading,
    Success(T),
    Error { message: String, data: Option<T> },
}

impl<T> Resource<T> {
    pub fn error(message: impl Into<String>, data: Option<T>) -> Self {
        Self::Error {
            message: message.into(),
            data,
        }
    }

    /// Data carried by `Success`, or the fallback carried by `Error`
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Loading => None,
            Self::Success(data) => Some(data),
            Self::Error { data, .. } => data.as_ref(),
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Loading => None,
            Self::Success(data) => Some(data),
            Self::Error { data, .. } => data,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn map<U, F>(self, f: F) -> Resource<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Loading => Resource::Loading,
            Self::Success(data) => Resource::Success(f(data)),
            Self::Error { message, data } => Resource::Error {
                message,
                data: data.map(f),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let loading: Resource<Vec<u32>> = Resource::Loading;
        assert!(loading.is_loading());
        assert!(loading.data().is_none());

        let success = Resource::Success(vec![1, 2]);
        assert!(success.is_success());
        assert_eq!(success.data(), Some(&vec![1, 2]));

        let failed = Resource::error("offline", Some(vec![1]));
        assert!(failed.is_error());
        assert_eq!(failed.error_message(), Some("offline"));
        assert_eq!(failed.into_data(), Some(vec![1]));
    }

    #[test]
    fn test_map_keeps_error_fallback() {
        let failed = Resource::error("timeout", Some(vec![1, 2, 3]));
        let mapped = failed.map(|items| items.len());
        assert_eq!(mapped, Resource::error("timeout", Some(3)));

        let empty: Resource<Vec<u32>> = Resource::error("timeout", None);
        assert_eq!(empty.map(|items| items.len()), Resource::error("timeout", None));
    }
}
