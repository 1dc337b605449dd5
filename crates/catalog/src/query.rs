//! Catalog search against `/api/base/search`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use eods_common::{Connection, HttpBackend, HttpRequest};
use serde::Deserialize;
use tracing::{error, info, instrument, warn};

use crate::dedup::{default_safe_list, find_minimum_cloud, SafeGranuleLookup};
use crate::error::{CatalogError, Result};
use crate::export::write_query_results;
use crate::filters::CatalogFilters;
use crate::record::{annotate_sentinel2, CatalogRecord};

#[derive(Debug, Deserialize)]
struct SearchMeta {
    total_count: u64,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    meta: SearchMeta,
    #[serde(default)]
    objects: Vec<CatalogRecord>,
}

/// What a successful search produced.
#[derive(Debug, Clone, Default)]
pub struct QueryOutcome {
    /// `alternate` of every returned record, in result order.
    pub identifiers: Vec<String>,
    /// `None` when the catalog matched nothing.
    pub table: Option<Vec<CatalogRecord>>,
    /// Written when the filters name an output directory.
    pub csv_path: Option<PathBuf>,
}

impl QueryOutcome {
    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}

/// Issues catalog searches for one connection.
pub struct CatalogClient {
    backend: Arc<dyn HttpBackend>,
    connection: Connection,
    safe_list: Option<Arc<dyn SafeGranuleLookup>>,
    timeout: Option<Duration>,
}

impl CatalogClient {
    pub fn new(backend: Arc<dyn HttpBackend>, connection: Connection) -> Self {
        Self {
            backend,
            connection,
            safe_list: None,
            timeout: None,
        }
    }

    /// Use `safe_list` for `find_least_cloud` instead of loading
    /// `static/safe-granule-orbit-list.txt`.
    pub fn with_safe_list(mut self, safe_list: Arc<dyn SafeGranuleLookup>) -> Self {
        self.safe_list = Some(safe_list);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Search the catalog.
    ///
    /// - `Err(Validation)` for a bad filter combination, before any request
    /// - `Err(ServiceStatus)` for a non-200 reply
    /// - `Ok(None)` when the request itself failed (timeout, refused
    ///   connection); the failure is logged so batch callers can carry on
    /// - `Ok(Some(outcome))` otherwise; zero matches give no identifiers and
    ///   no table
    #[instrument(skip_all, fields(username = %self.connection.username))]
    pub async fn query_catalog(&self, filters: &CatalogFilters) -> Result<Option<QueryOutcome>> {
        filters.validate()?;

        let params = filters.to_query_params(&self.connection);
        let request = HttpRequest::get(self.connection.search_url())
            .query_pairs(params)
            .timeout(self.timeout);

        let reply = match self.backend.send(request).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(
                    error = %self.connection.redact(&e.to_string()),
                    "Catalog query raised an exception, no list returned"
                );
                return Ok(None);
            }
        };

        let url = self.connection.redact(&reply.url);
        if reply.status != 200 {
            warn!(status = reply.status, url = %url, "Catalog query not successful");
            return Err(CatalogError::ServiceStatus {
                status: reply.status,
                url,
            });
        }
        info!(url = %url, "Catalog query succeeded");

        let envelope: SearchEnvelope = reply
            .json()
            .map_err(|e| CatalogError::MalformedResponse(e.to_string()))?;

        if envelope.meta.total_count == 0 {
            info!("Query was accepted but matched zero records, try a different set of parameters");
            return Ok(Some(QueryOutcome::default()));
        }

        let mut records = envelope.objects;

        if filters.is_sentinel2() {
            annotate_sentinel2(&mut records);
        }

        if filters.ignore_split_granules {
            records.retain(|record| !record.is_split_component());
        }

        if filters.find_least_cloud && filters.is_sentinel2() {
            records = match &self.safe_list {
                Some(safe_list) => find_minimum_cloud(&records, safe_list.as_ref())?,
                None => find_minimum_cloud(&records, &default_safe_list()?)?,
            };
        }

        let csv_path = match &filters.output_directory {
            Some(dir) => Some(write_query_results(dir, &records)?),
            None => None,
        };

        let identifiers: Vec<String> = records.iter().map(|r| r.alternate.clone()).collect();
        for identifier in &identifiers {
            info!(layer = %identifier, "Matching layer");
        }
        info!(count = identifiers.len(), "Number of layers returned");

        Ok(Some(QueryOutcome {
            identifiers,
            table: Some(records),
            csv_path,
        }))
    }
}
