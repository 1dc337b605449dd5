//! Types and utilities shared by every EODS client crate.
//!
//! - [`Connection`]: service domain and credentials
//! - [`ClientSettings`] / [`TlsPolicy`]: how the HTTP client is built
//! - [`HttpBackend`]: the transport seam, with [`ReqwestBackend`] as the
//!   production implementation
//! - [`redact`]: scrubbing of bearer credentials from text
//! - [`BoundingBox`]: WKT geometry bounds
//! - [`osgb`]: WGS84 to British National Grid (EPSG:27700)

pub mod bbox;
pub mod connection;
pub mod error;
pub mod http;
pub mod osgb;
pub mod redact;
pub mod settings;

pub use bbox::{BboxParseError, BoundingBox};
pub use connection::Connection;
pub use error::{EodsError, EodsResult, TransportError};
pub use http::{HttpBackend, HttpReply, HttpRequest, Method, ReqwestBackend, RequestBody};
pub use settings::{ClientSettings, TlsPolicy};
