//! Record sources consumed by the retrieval façade

use std::sync::Arc;

use async_trait::async_trait;
use census_api::CensusClient;
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::filter::Filter;
use crate::kind::EntityKind;

/// Backend the façade fetches raw records from.
///
/// A record that does not exist is `Ok(None)` (or an empty list), never an
/// error. Errors are reserved for failures to complete the request.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch the first record of `kind` matching `filter`
    async fn fetch_one(&self, kind: EntityKind, filter: &Filter) -> Result<Option<Value>>;

    /// Fetch up to `limit` records of `kind` matching `filter`, skipping the
    /// first `offset` matches
    async fn fetch_many(
        &self,
        kind: EntityKind,
        filter: &Filter,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Value>>;

    /// Number of records of `kind` matching `filter`
    async fn count(&self, kind: EntityKind, filter: &Filter) -> Result<u64>;
}

/// [`RecordSource`] backed by the Census REST API
pub struct CensusSource {
    client: Arc<CensusClient>,
}

impl CensusSource {
    pub fn new(client: Arc<CensusClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &CensusClient {
        &self.client
    }
}

#[async_trait]
impl RecordSource for CensusSource {
    async fn fetch_one(&self, kind: EntityKind, filter: &Filter) -> Result<Option<Value>> {
        let query = filter.apply(self.client.query(kind.collection()));
        debug!(%kind, terms = filter.terms().len(), "Fetching single record");
        Ok(self.client.get_single(&query).await?)
    }

    async fn fetch_many(
        &self,
        kind: EntityKind,
        filter: &Filter,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Value>> {
        let query = filter
            .apply(self.client.query(kind.collection()))
            .limit(limit)
            .offset(offset);
        debug!(%kind, limit, offset, "Fetching records");
        Ok(self.client.get(&query).await?)
    }

    async fn count(&self, kind: EntityKind, filter: &Filter) -> Result<u64> {
        let query = filter.apply(self.client.query(kind.collection()));
        Ok(self.client.count(&query).await?)
    }
}
