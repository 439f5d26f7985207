//! Census REST HTTP client

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::CensusConfig;
use crate::error::{CensusError, Result};
use crate::payload::{check_response, extract_count, extract_payload, extract_single, redact};
use crate::query::{Query, Verb};

/// Upper bound for a single backoff delay
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Number of query timings averaged by [`CensusClient::latency`]
const TIMING_WINDOW: usize = 100;

/// Client for the Census REST API
///
/// Requests that fail with connection errors, server-side HTTP errors or
/// maintenance redirects are retried with exponential backoff. API-level
/// errors reported in the response body are never retried.
pub struct CensusClient {
    http: reqwest::Client,
    config: CensusConfig,
    profiling: bool,
    timings: Mutex<VecDeque<f64>>,
}

impl CensusClient {
    /// Create a new client from a configuration
    pub fn new(config: CensusConfig) -> Result<Self> {
        // Redirects are how the API signals maintenance, so they must
        // surface instead of being followed
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            http,
            config,
            profiling: false,
            timings: Mutex::new(VecDeque::with_capacity(TIMING_WINDOW)),
        })
    }

    /// Enable server-side query timing, see [`CensusClient::latency`]
    pub fn with_profiling(mut self, profiling: bool) -> Self {
        self.profiling = profiling;
        self
    }

    pub fn config(&self) -> &CensusConfig {
        &self.config
    }

    /// Start a query for a collection in the configured namespace
    pub fn query(&self, collection: impl Into<String>) -> Query {
        Query::new(collection).namespace(self.config.namespace.clone())
    }

    /// Average server-side query time in milliseconds over the last 100
    /// profiled requests
    pub fn latency(&self) -> Option<f64> {
        let timings = self.timings.lock().ok()?;
        if timings.is_empty() {
            return None;
        }
        Some(timings.iter().sum::<f64>() / timings.len() as f64)
    }

    /// Perform a query and return the checked response body
    pub async fn request(&self, query: &Query, verb: Verb) -> Result<Value> {
        let profiled = self.profiling && verb == Verb::Get;
        let url = if profiled {
            query.clone().timing(true).url(&self.config, verb)?
        } else {
            query.url(&self.config, verb)?
        };

        debug!(verb = verb.as_str(), url = %redact(&url), "Performing Census request");
        let mut data = self.send_with_retry(&url).await?;
        check_response(&data, &url)?;

        if profiled {
            if let Some(timing) = data.as_object_mut().and_then(|o| o.remove("timing")) {
                self.record_timing(&timing);
            }
        }
        Ok(data)
    }

    /// Perform a `get` query and return every matching element
    pub async fn get(&self, query: &Query) -> Result<Vec<Value>> {
        let collection = collection_of(query)?;
        let data = self.request(query, Verb::Get).await?;
        extract_payload(&data, collection)
    }

    /// Perform a `get` query and return the first match, if any
    pub async fn get_single(&self, query: &Query) -> Result<Option<Value>> {
        let collection = collection_of(query)?;
        let data = self.request(query, Verb::Get).await?;
        extract_single(&data, collection)
    }

    /// Perform a `count` query
    pub async fn count(&self, query: &Query) -> Result<u64> {
        let data = self.request(query, Verb::Count).await?;
        extract_count(&data)
    }

    async fn send_with_retry(&self, url: &Url) -> Result<Value> {
        let max_tries = self.config.max_retries.max(1);
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    url = %redact(url),
                    "Backing off before retry"
                );
                tokio::time::sleep(delay).await;
            }
            attempt += 1;

            match self.send_once(url).await {
                Ok(data) => {
                    if attempt > 1 {
                        debug!(tries = attempt, url = %redact(url), "Query successful after retries");
                    }
                    return Ok(data);
                }
                Err(e) if e.is_retryable() && attempt < max_tries => {
                    debug!(error = %e, attempt, "Retryable Census error");
                }
                Err(e) => {
                    if e.is_retryable() {
                        warn!(tries = attempt, url = %redact(url), error = %e, "Giving up on query");
                    }
                    return Err(e);
                }
            }
        }
    }

    async fn send_once(&self, url: &Url) -> Result<Value> {
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();

        if status.is_redirection() {
            return Err(CensusError::Maintenance { url: redact(url) });
        }
        if !status.is_success() {
            return Err(CensusError::Status {
                status: status.as_u16(),
                url: redact(url),
            });
        }

        // The API sometimes serves JSON with a text/plain content type
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    fn record_timing(&self, timing: &Value) {
        let total = match timing.get("total-ms") {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        };
        let Some(total) = total else {
            return;
        };
        debug!(timing = %timing, "Census query timing");
        if let Ok(mut timings) = self.timings.lock() {
            if timings.len() == TIMING_WINDOW {
                timings.pop_front();
            }
            timings.push_back(total);
        }
    }
}

/// Delay before retry number `attempt` (1-based): 1ms, 10ms, 100ms, ...
/// capped at five seconds
fn backoff_delay(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(6);
    Duration::from_millis(10u64.pow(exponent)).min(MAX_BACKOFF)
}

fn collection_of(query: &Query) -> Result<&str> {
    query
        .collection()
        .ok_or_else(|| CensusError::Payload("query has no collection".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard, max_retries: u32) -> CensusClient {
        let config = CensusConfig::default()
            .with_endpoint(server.url())
            .with_max_retries(max_retries);
        CensusClient::new(config).unwrap()
    }

    #[test]
    fn test_backoff_delay() {
        assert_eq!(backoff_delay(1), Duration::from_millis(1));
        assert_eq!(backoff_delay(2), Duration::from_millis(10));
        assert_eq!(backoff_delay(4), Duration::from_secs(1));
        assert_eq!(backoff_delay(5), MAX_BACKOFF);
        assert_eq!(backoff_delay(30), MAX_BACKOFF);
    }

    #[tokio::test]
    async fn test_get_single() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/get/ps2:v2/character".to_string()))
            .match_query(Matcher::UrlEncoded(
                "name.first_lower".to_string(),
                "auroram".to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"character_list":[{"character_id":"5428010618015189713"}],"returned":1}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, 5);
        let query = client.query("character").term("name.first_lower", "auroram");
        let found = client.get_single(&query).await.unwrap().unwrap();
        assert_eq!(found["character_id"], "5428010618015189713");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_list_is_none() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/get/ps2:v2/character".to_string()))
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"character_list":[],"returned":0}"#)
            .create_async()
            .await;

        let client = client_for(&server, 5);
        let query = client.query("character").term("character_id", 1);
        assert!(client.get_single(&query).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/get/ps2:v2/item".to_string()))
            .match_query(Matcher::Any)
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let client = client_for(&server, 3);
        let err = client.get(&client.query("item")).await.unwrap_err();
        assert!(matches!(err, CensusError::Status { status: 503, .. }));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_redirect_is_maintenance() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/get/ps2:v2/world".to_string()))
            .match_query(Matcher::Any)
            .with_status(302)
            .with_header("location", "https://www.planetside2.com/maintenance")
            .expect(2)
            .create_async()
            .await;

        let client = client_for(&server, 2);
        let err = client.get(&client.query("world")).await.unwrap_err();
        assert!(matches!(err, CensusError::Maintenance { .. }));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_errors_are_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/get/ps2:v2/character".to_string()))
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"errorCode":"SERVER_ERROR","errorMessage":"INVALID_SEARCH_TERM: Invalid search term: battle_rank."}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server, 5);
        let query = client.query("character").term("battle_rank", "x");
        let err = client.get(&query).await.unwrap_err();
        assert!(matches!(err, CensusError::InvalidSearchTerm { .. }));

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_count() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/count/ps2:v2/item".to_string()))
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"count":12345}"#)
            .create_async()
            .await;

        let client = client_for(&server, 5);
        assert_eq!(client.count(&client.query("item")).await.unwrap(), 12345);
    }

    #[tokio::test]
    async fn test_profiling_records_latency() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/get/ps2:v2/faction".to_string()))
            .match_query(Matcher::UrlEncoded("c:timing".to_string(), "1".to_string()))
            .with_status(200)
            .with_body(r#"{"faction_list":[],"returned":0,"timing":{"total-ms":"40"}}"#)
            .expect(2)
            .create_async()
            .await;

        let client = client_for(&server, 5).with_profiling(true);
        assert_eq!(client.latency(), None);

        let query = client.query("faction");
        client.get(&query).await.unwrap();
        client.get(&query).await.unwrap();
        assert_eq!(client.latency(), Some(40.0));
    }
}
