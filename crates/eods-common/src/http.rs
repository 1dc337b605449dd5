//! The transport seam used by every remote operation.
//!
//! Operations take an `&dyn HttpBackend` so tests can substitute a scripted
//! fake; [`ReqwestBackend`] is the production implementation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::{header, Certificate, Client};
use serde::de::DeserializeOwned;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{EodsError, TransportError};
use crate::redact::redact_url_fragments;
use crate::settings::{ClientSettings, TlsPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Xml(String),
    Json(serde_json::Value),
}

/// A single request, independent of the client that sends it.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn query_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn xml(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Xml(body.into()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Value of the first query pair named `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A reply with any status; interpreting the status is up to the caller.
#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    /// Final URL including the query string. May carry credentials.
    pub url: String,
    pub body: Bytes,
}

impl HttpReply {
    pub fn new(status: u16, url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            url: url.into(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// Send a request and return the reply whatever its status.
    async fn send(&self, request: HttpRequest) -> Result<HttpReply, TransportError>;

    /// Stream the body at `url` into `dest`, returning the bytes written.
    /// A non-2xx status is a [`TransportError::Status`].
    async fn download_to(
        &self,
        url: &str,
        dest: &Path,
        timeout: Option<Duration>,
    ) -> Result<u64, TransportError>;
}

/// [`HttpBackend`] over a shared reqwest client.
pub struct ReqwestBackend {
    client: Client,
}

impl ReqwestBackend {
    pub fn new(settings: &ClientSettings) -> Result<Self, EodsError> {
        let mut builder = Client::builder()
            .user_agent(settings.user_agent.clone())
            .connect_timeout(settings.connect_timeout())
            .tcp_nodelay(true);

        builder = match &settings.tls {
            TlsPolicy::Verify => builder,
            TlsPolicy::Disabled => builder.danger_accept_invalid_certs(true),
            TlsPolicy::CustomBundle(path) => {
                let pem = std::fs::read(path).map_err(|e| {
                    TransportError::TlsBundle(format!("{}: {}", path.display(), e))
                })?;
                let cert = Certificate::from_pem(&pem)
                    .map_err(|e| TransportError::TlsBundle(format!("{}: {}", path.display(), e)))?;
                builder.add_root_certificate(cert)
            }
        };

        let client = builder
            .build()
            .map_err(|e| EodsError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn send(&self, request: HttpRequest) -> Result<HttpReply, TransportError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        builder = match request.body {
            Some(RequestBody::Xml(xml)) => builder
                .header(header::CONTENT_TYPE, "application/xml")
                .body(xml),
            Some(RequestBody::Json(json)) => builder.json(&json),
            None => builder,
        };
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(TransportError::from_reqwest)?;
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let body = response.bytes().await.map_err(TransportError::from_reqwest)?;

        debug!(status, url = %redact_url_fragments(&url), bytes = body.len(), "HTTP reply");

        Ok(HttpReply { status, url, body })
    }

    async fn download_to(
        &self,
        url: &str,
        dest: &Path,
        timeout: Option<Duration>,
    ) -> Result<u64, TransportError> {
        let mut request = self.client.get(url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(TransportError::from_reqwest)?;
        if !response.status().is_success() {
            return Err(TransportError::Status {
                status: response.status().as_u16(),
            });
        }

        let mut file = File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(TransportError::from_reqwest)?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        file.sync_all().await?;

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = HttpRequest::get("https://eo.example/api")
            .query("limit", "10")
            .query_pairs([("offset", "0")])
            .header("User-Agent", "test")
            .timeout(Some(Duration::from_secs(5)));

        assert_eq!(request.method, Method::Get);
        assert_eq!(request.query_value("limit"), Some("10"));
        assert_eq!(request.query_value("offset"), Some("0"));
        assert_eq!(request.query_value("missing"), None);
        assert_eq!(request.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_reply_helpers() {
        let reply = HttpReply::new(200, "u", r#"{"a":"b"}"#);
        assert!(reply.is_success());
        let value: serde_json::Value = reply.json().unwrap();
        assert_eq!(value["a"], "b");
        assert!(!HttpReply::new(400, "u", "").is_success());
    }

    #[test]
    fn test_missing_tls_bundle_is_error() {
        let settings = ClientSettings {
            tls: TlsPolicy::CustomBundle("/nonexistent/bundle.pem".into()),
            ..ClientSettings::default()
        };
        assert!(ReqwestBackend::new(&settings).is_err());
    }
}
