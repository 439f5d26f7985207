//! Error types for the Census API client

use std::fmt;

/// Errors that can occur when interacting with the Census API
#[derive(Debug)]
pub enum CensusError {
    /// HTTP request failed (connection, timeout, TLS)
    Http(reqwest::Error),
    /// The server kept answering with a non-success status
    Status { status: u16, url: String },
    /// Failed to parse the response body as JSON
    Json(serde_json::Error),
    /// Invalid endpoint URL in the configuration
    Url(url::ParseError),
    /// The API redirected the request, which it does during maintenance
    Maintenance { url: String },
    /// The response did not have the expected shape
    Payload(String),
    /// The namespace or collection does not exist
    UnknownCollection {
        namespace: String,
        collection: Option<String>,
    },
    /// The server could not parse the generated query
    BadRequestSyntax { url: String },
    /// The queried component of the API is temporarily unavailable
    ServiceUnavailable { url: String },
    /// The service ID is not registered
    InvalidServiceId,
    /// Rate limit of the shared example service ID exceeded
    MissingServiceId,
    /// Unknown field name or invalid field value in the query
    InvalidSearchTerm { message: String, url: String },
    /// Server-side error while processing the query
    Server { message: String, url: String },
    /// Any other error reported by the API
    Unknown(String),
}

impl CensusError {
    /// Whether the request may succeed when retried
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Maintenance { .. } => true,
            _ => false,
        }
    }
}

impl fmt::Display for CensusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => write!(f, "Census HTTP error: {}", e),
            Self::Status { status, url } => {
                write!(f, "Census returned status {} for {}", status, url)
            }
            Self::Json(e) => write!(f, "Census JSON parse error: {}", e),
            Self::Url(e) => write!(f, "Invalid Census endpoint: {}", e),
            Self::Maintenance { url } => {
                write!(f, "API redirection detected, maintenance inferred: {}", url)
            }
            Self::Payload(msg) => write!(f, "Unexpected Census payload: {}", msg),
            Self::UnknownCollection {
                namespace,
                collection: Some(collection),
            } => write!(f, "No collection at \"{}/{}\"", namespace, collection),
            Self::UnknownCollection {
                namespace,
                collection: None,
            } => write!(f, "The namespace \"{}\" does not exist", namespace),
            Self::BadRequestSyntax { url } => write!(f, "Bad request syntax: {}", url),
            Self::ServiceUnavailable { url } => {
                write!(f, "This component of the API is currently unavailable: {}", url)
            }
            Self::InvalidServiceId => write!(f, "The service ID is not registered"),
            Self::MissingServiceId => write!(
                f,
                "The default service ID is rate limited, wait 60 seconds or register your own"
            ),
            Self::InvalidSearchTerm { message, .. } => write!(f, "Invalid search term: {}", message),
            Self::Server { message, .. } => write!(f, "Census server error: {}", message),
            Self::Unknown(msg) => write!(f, "Unknown Census error: {}", msg),
        }
    }
}

impl std::error::Error for CensusError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Url(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CensusError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<serde_json::Error> for CensusError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<url::ParseError> for CensusError {
    fn from(e: url::ParseError) -> Self {
        Self::Url(e)
    }
}

/// Result type for Census API operations
pub type Result<T> = std::result::Result<T, CensusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_collection_display() {
        let err = CensusError::UnknownCollection {
            namespace: "ps2:v2".to_string(),
            collection: Some("charakter".to_string()),
        };
        assert_eq!(format!("{}", err), "No collection at \"ps2:v2/charakter\"");

        let err = CensusError::UnknownCollection {
            namespace: "ps3".to_string(),
            collection: None,
        };
        assert_eq!(format!("{}", err), "The namespace \"ps3\" does not exist");
    }

    #[test]
    fn test_retryable_classification() {
        let maintenance = CensusError::Maintenance {
            url: "https://example.com".to_string(),
        };
        assert!(maintenance.is_retryable());

        let server_status = CensusError::Status {
            status: 503,
            url: String::new(),
        };
        assert!(server_status.is_retryable());

        let client_status = CensusError::Status {
            status: 404,
            url: String::new(),
        };
        assert!(!client_status.is_retryable());

        assert!(!CensusError::InvalidServiceId.is_retryable());
        assert!(!CensusError::Payload("x".to_string()).is_retryable());
    }
}
