//! URL generation for Census queries

use url::Url;

use crate::config::CensusConfig;
use crate::error::{CensusError, Result};
use crate::query::{Query, Verb};

impl Query {
    /// Generate the request URL for this query.
    ///
    /// The service ID is only inserted into the path for the official
    /// endpoint; custom endpoints (proxies, test servers) receive the bare
    /// `/<verb>/<namespace>/<collection>` path.
    pub fn url(&self, config: &CensusConfig, verb: Verb) -> Result<Url> {
        let mut url = Url::parse(&config.endpoint)?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                CensusError::Payload(format!("endpoint cannot be a base: {}", config.endpoint))
            })?;
            segments.pop_if_empty();
            if config.is_official_endpoint() {
                segments.push(&config.service_id_segment());
            }
            segments.push(verb.as_str()).push(&self.namespace);
            if let Some(collection) = &self.collection {
                segments.push(collection);
            }
        }

        let pairs: Vec<String> = self
            .terms
            .iter()
            .map(|t| (t.field.clone(), t.query_value()))
            .chain(self.commands())
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(&v)))
            .collect();
        if !pairs.is_empty() {
            url.set_query(Some(&pairs.join("&")));
        }

        Ok(url)
    }
}
