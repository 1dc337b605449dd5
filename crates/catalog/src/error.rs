//! Error types for the catalog crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by catalog queries and granule deduplication.
///
/// `Validation` is always raised before any network call. Transport
/// failures are not represented here: `query_catalog` soft-fails them into
/// `Ok(None)`.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("QUERY failed, {0}")]
    Validation(String),

    #[error(
        "find_least_cloud was requested but the search criteria are too narrow, spatially or \
         temporally, and matched no granule references in \"{source_name}\". Suggest widening your search"
    )]
    TooNarrow { source_name: String },

    #[error("safe granule list {} cannot be found", path.display())]
    SafeListNotFound { path: PathBuf },

    #[error("Catalog search responded with status {status} (not successful) for {url}")]
    ServiceStatus { status: u16, url: String },

    #[error("Malformed catalog response: {0}")]
    MalformedResponse(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
