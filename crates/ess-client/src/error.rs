//! Error types for the event streaming client

use std::fmt;

use tokio_tungstenite::tungstenite;

#[derive(Debug)]
pub enum EssError {
    /// The WebSocket handshake failed. `endpoint` has the service ID masked.
    Connect {
        endpoint: String,
        source: Box<tungstenite::Error>,
    },
    /// The socket failed after the connection was established
    WebSocket(Box<tungstenite::Error>),
    /// A trigger could not be encoded as a subscribe message
    Subscribe { trigger: String, reason: String },
    /// A subscribe message could not be written to the socket
    Send {
        trigger: String,
        source: Box<tungstenite::Error>,
    },
    JsonParse(String),
    MaxReconnectAttempts,
    ConnectionClosed,
}

impl EssError {
    /// Whether reconnecting could plausibly succeed.
    ///
    /// A trigger that does not encode never will, and a handshake rejected
    /// with a 4xx status means the service ID or endpoint is wrong.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connect { source, .. } => match source.as_ref() {
                tungstenite::Error::Http(response) => !response.status().is_client_error(),
                _ => true,
            },
            Self::Subscribe { .. } | Self::MaxReconnectAttempts => false,
            _ => true,
        }
    }
}

impl fmt::Display for EssError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EssError::Connect { endpoint, source } => {
                write!(f, "Failed to connect to {}: {}", endpoint, source)
            }
            EssError::WebSocket(err) => write!(f, "WebSocket error: {}", err),
            EssError::Subscribe { trigger, reason } => {
                write!(f, "Cannot encode subscription for trigger {}: {}", trigger, reason)
            }
            EssError::Send { trigger, source } => {
                write!(f, "Failed to send subscription for trigger {}: {}", trigger, source)
            }
            EssError::JsonParse(msg) => write!(f, "JSON parse error: {}", msg),
            EssError::MaxReconnectAttempts => write!(f, "Max reconnection attempts reached"),
            EssError::ConnectionClosed => write!(f, "Connection closed"),
        }
    }
}

impl std::error::Error for EssError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EssError::Connect { source, .. } | EssError::Send { source, .. } => Some(source.as_ref()),
            EssError::WebSocket(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<tungstenite::Error> for EssError {
    fn from(err: tungstenite::Error) -> Self {
        EssError::WebSocket(Box::new(err))
    }
}

impl From<serde_json::Error> for EssError {
    fn from(err: serde_json::Error) -> Self {
        EssError::JsonParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EssError>;
