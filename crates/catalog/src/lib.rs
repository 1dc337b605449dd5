//! EODS catalog search.
//!
//! [`CatalogClient::query_catalog`] translates [`CatalogFilters`] into a
//! search request, flattens the reply into [`CatalogRecord`]s, derives the
//! Sentinel-2 granule, orbit and cloud-cover fields, and optionally reduces
//! the table to the least-cloudy record(s) per granule with
//! [`find_minimum_cloud`].

pub mod dedup;
pub mod error;
pub mod export;
pub mod filters;
pub mod query;
pub mod record;

pub use dedup::{find_minimum_cloud, SafeGranuleLookup, SafeGranuleSet, DEFAULT_SAFE_LIST_PATH};
pub use error::{CatalogError, Result};
pub use export::{write_query_results, QUERY_RESULTS_FILE};
pub use filters::{CatalogFilters, RecordType, SatelliteId, DEFAULT_RESULT_LIMIT};
pub use query::{CatalogClient, QueryOutcome};
pub use record::{layer_stub, CatalogRecord, DedupKeys};
