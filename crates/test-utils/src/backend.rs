//! A scripted [`HttpBackend`] for driving client code without a network.
//!
//! Replies and download outcomes are queued up front and consumed in order.
//! Every request is recorded so tests can assert on what was sent.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use eods_common::{HttpBackend, HttpReply, HttpRequest, TransportError};

#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<HttpReply, TransportError>>>,
    downloads: Mutex<VecDeque<Result<Vec<u8>, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
    download_urls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next `send`.
    pub fn push_reply(&self, status: u16, body: impl Into<String>) -> &Self {
        let body: String = body.into();
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(HttpReply::new(status, String::new(), body)));
        self
    }

    /// Queue a transport failure for the next `send`.
    pub fn push_error(&self, error: TransportError) -> &Self {
        self.replies.lock().unwrap().push_back(Err(error));
        self
    }

    /// Queue the body written by the next `download_to`.
    pub fn push_download(&self, body: impl Into<Vec<u8>>) -> &Self {
        self.downloads.lock().unwrap().push_back(Ok(body.into()));
        self
    }

    /// Queue a failure for the next `download_to`.
    pub fn push_download_error(&self, error: TransportError) -> &Self {
        self.downloads.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn download_urls(&self) -> Vec<String> {
        self.download_urls.lock().unwrap().clone()
    }

    pub fn download_count(&self) -> usize {
        self.download_urls.lock().unwrap().len()
    }

    /// Replies still queued; zero once a test consumed its whole script.
    pub fn pending_replies(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

/// The URL a real client would have requested, query string included.
fn full_url(request: &HttpRequest) -> String {
    if request.query.is_empty() {
        return request.url.clone();
    }
    let query: Vec<String> = request
        .query
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    format!("{}?{}", request.url, query.join("&"))
}

#[async_trait]
impl HttpBackend for ScriptedBackend {
    async fn send(&self, request: HttpRequest) -> Result<HttpReply, TransportError> {
        let url = full_url(&request);
        self.requests.lock().unwrap().push(request);

        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(mut reply)) => {
                reply.url = url;
                Ok(reply)
            }
            Some(Err(error)) => Err(error),
            None => Err(TransportError::Connect(format!(
                "no scripted reply left for {}",
                url
            ))),
        }
    }

    async fn download_to(
        &self,
        url: &str,
        dest: &Path,
        _timeout: Option<Duration>,
    ) -> Result<u64, TransportError> {
        self.download_urls.lock().unwrap().push(url.to_string());

        let next = self.downloads.lock().unwrap().pop_front();
        match next {
            Some(Ok(body)) => {
                tokio::fs::write(dest, &body).await?;
                Ok(body.len() as u64)
            }
            Some(Err(error)) => Err(error),
            None => Err(TransportError::Connect(format!(
                "no scripted download left for {}",
                url
            ))),
        }
    }
}
