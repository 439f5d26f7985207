//! Client configuration

use std::env;
use std::time::Duration;

use crate::query::DEFAULT_NAMESPACE;

/// Official Census REST endpoint
pub const DEFAULT_ENDPOINT: &str = "https://census.daybreakgames.com";

/// Shared, heavily rate-limited service ID
pub const DEFAULT_SERVICE_ID: &str = "s:example";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 5;

/// Connection settings for a [`CensusClient`](crate::CensusClient)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CensusConfig {
    /// Base URL of the REST API, without trailing slash
    pub endpoint: String,
    /// Service ID, with or without the `s:` prefix
    pub service_id: String,
    /// Namespace used for queries that do not set one
    pub namespace: String,
    pub timeout: Duration,
    /// Maximum number of attempts per request, including the first
    pub max_retries: u32,
}

impl Default for CensusConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            service_id: DEFAULT_SERVICE_ID.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl CensusConfig {
    /// Parse configuration from environment variables, falling back to the
    /// defaults for anything missing or unparsable
    pub fn from_env() -> Self {
        let endpoint = env::var("CENSUS_ENDPOINT")
            .map(|e| e.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());

        let service_id =
            env::var("CENSUS_SERVICE_ID").unwrap_or_else(|_| DEFAULT_SERVICE_ID.to_string());

        let namespace =
            env::var("CENSUS_NAMESPACE").unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string());

        let timeout = env::var("CENSUS_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        let max_retries = env::var("CENSUS_MAX_RETRIES")
            .ok()
            .and_then(|r| r.parse().ok())
            .unwrap_or(DEFAULT_MAX_RETRIES);

        Self {
            endpoint,
            service_id,
            namespace,
            timeout,
            max_retries,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_service_id(mut self, service_id: impl Into<String>) -> Self {
        self.service_id = service_id.into();
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The service ID in path form, always carrying the `s:` prefix
    pub fn service_id_segment(&self) -> String {
        if self.service_id.starts_with("s:") {
            self.service_id.clone()
        } else {
            format!("s:{}", self.service_id)
        }
    }

    /// Whether the configured endpoint is the official Census host, which
    /// expects the service ID as the first path segment
    pub fn is_official_endpoint(&self) -> bool {
        self.endpoint.trim_end_matches('/') == DEFAULT_ENDPOINT
    }
}
