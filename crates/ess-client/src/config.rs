//! Connection settings for the push endpoint

pub const DEFAULT_ENDPOINT: &str = "wss://push.planetside2.com/streaming";
pub const DEFAULT_ENVIRONMENT: &str = "ps2";
pub const DEFAULT_SERVICE_ID: &str = "s:example";

/// Configuration for an ESS subscription
#[derive(Debug, Clone)]
pub struct EssConfig {
    /// WebSocket endpoint
    pub endpoint: String,
    /// Census service ID, including the `s:` prefix
    pub service_id: String,
    /// Game environment (`ps2`, `ps2ps4us`, `ps2ps4eu`)
    pub environment: String,
}

impl Default for EssConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            service_id: DEFAULT_SERVICE_ID.to_string(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
        }
    }
}

impl EssConfig {
    /// Read `ESS_ENDPOINT`, `CENSUS_SERVICE_ID` and `ESS_ENVIRONMENT`,
    /// falling back to the defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: std::env::var("ESS_ENDPOINT").unwrap_or(defaults.endpoint),
            service_id: std::env::var("CENSUS_SERVICE_ID")
                .map(|id| normalise_service_id(&id))
                .unwrap_or(defaults.service_id),
            environment: std::env::var("ESS_ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    pub fn with_service_id(mut self, service_id: impl AsRef<str>) -> Self {
        self.service_id = normalise_service_id(service_id.as_ref());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }
}

fn normalise_service_id(id: &str) -> String {
    let id = id.trim();
    if id.starts_with("s:") {
        id.to_string()
    } else {
        format!("s:{}", id)
    }
}
