//! Connection details for one EODS deployment.

use std::fmt;

use serde::Deserialize;

use crate::error::{EodsError, EodsResult};
use crate::redact;

/// Path of the catalog search endpoint.
pub const SEARCH_PATH: &str = "/api/base/search";
/// Default path of the OGC services endpoint used for WPS.
pub const DEFAULT_WPS_PATH: &str = "/geoserver/ows";
/// Path of the layer-group REST resource.
pub const LAYER_GROUP_PATH: &str = "/api/layer_groups/";

/// Domain and credentials of the remote service.
///
/// The access token is a bearer credential: `Debug` masks it, and
/// [`Connection::redact`] scrubs it from arbitrary text.
#[derive(Clone, Deserialize)]
pub struct Connection {
    pub domain: String,
    pub username: String,
    pub access_token: String,
    /// Overrides [`DEFAULT_WPS_PATH`].
    #[serde(default)]
    pub wps_path: Option<String>,
}

impl Connection {
    pub fn new(
        domain: impl Into<String>,
        username: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            username: username.into(),
            access_token: access_token.into(),
            wps_path: None,
        }
    }

    /// Build from `HOST`, `API_USER` and `API_TOKEN`.
    pub fn from_env() -> EodsResult<Self> {
        let var = |name: &str| {
            std::env::var(name)
                .map_err(|_| EodsError::Config(format!("environment variable {} is not set", name)))
        };
        Ok(Self::new(var("HOST")?, var("API_USER")?, var("API_TOKEN")?))
    }

    pub fn with_wps_path(mut self, path: impl Into<String>) -> Self {
        self.wps_path = Some(path.into());
        self
    }

    fn join(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.domain.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Catalog search endpoint.
    pub fn search_url(&self) -> String {
        self.join(SEARCH_PATH)
    }

    /// WPS endpoint (submission, status and results).
    pub fn wps_url(&self) -> String {
        self.join(self.wps_path.as_deref().unwrap_or(DEFAULT_WPS_PATH))
    }

    /// Layer-group collection, or a single group when `id` is given.
    pub fn layer_group_url(&self, id: Option<i64>) -> String {
        match id {
            Some(id) => format!("{}{}/", self.join(LAYER_GROUP_PATH), id),
            None => self.join(LAYER_GROUP_PATH),
        }
    }

    /// Scrub this connection's token and any credential query values.
    pub fn redact(&self, text: &str) -> String {
        redact::redact(text, &self.access_token)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("domain", &self.domain)
            .field("username", &self.username)
            .field("access_token", &redact::MASK)
            .field("wps_path", &self.wps_path)
            .finish()
    }
}
