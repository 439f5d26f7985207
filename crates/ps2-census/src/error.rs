//! Error types for the retrieval layer

use std::fmt;
use std::sync::Arc;

use census_api::CensusError;

/// Errors returned by [`Client`](crate::Client) lookups and proxies
///
/// A record that does not exist is not an error: lookups return
/// `Ok(None)` instead. The error is cheap to clone so a failed proxy can
/// report the same failure to every caller that resolves it.
#[derive(Debug, Clone)]
pub enum Error {
    /// The lookup key or filter could not be canonicalised
    InvalidRequest(String),
    /// The Census API could not complete the request
    Transport(Arc<CensusError>),
    /// A record returned by the API did not match its record type
    Decode(Arc<serde_json::Error>),
    /// A background fetch task panicked or was aborted
    Join(String),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            Self::Transport(e) => write!(f, "Transport failure: {}", e),
            Self::Decode(e) => write!(f, "Failed to decode record: {}", e),
            Self::Join(msg) => write!(f, "Fetch task failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e.as_ref()),
            Self::Decode(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<CensusError> for Error {
    fn from(e: CensusError) -> Self {
        Self::Transport(Arc::new(e))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(Arc::new(e))
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Join(e.to_string())
    }
}

/// Result type for retrieval operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_transport_error_keeps_source() {
        let err: Error = CensusError::InvalidServiceId.into();
        assert!(matches!(err, Error::Transport(_)));
        assert!(err.source().is_some());
        assert_eq!(
            err.to_string(),
            "Transport failure: The service ID is not registered"
        );
    }

    #[test]
    fn test_clone_shares_transport_error() {
        let err: Error = CensusError::MissingServiceId.into();
        let copy = err.clone();
        match (err, copy) {
            (Error::Transport(a), Error::Transport(b)) => assert!(Arc::ptr_eq(&a, &b)),
            _ => panic!("expected transport errors"),
        }
    }
}
