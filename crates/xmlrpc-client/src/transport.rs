//! HTTP transport.
//!
//! The client only needs one operation from the network: POST a body and get
//! back the status and the full response body. [`Transport`] is that seam;
//! [`HttpTransport`] implements it with `reqwest`.

use std::future::Future;
use std::pin::Pin;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::trace;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// A boxed future that can be sent across threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The status line and body of an HTTP reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// HTTP status code.
    pub status: u16,
    /// Canonical reason phrase, if known.
    pub reason: Option<String>,
    /// Complete response body.
    pub body: Vec<u8>,
}

impl HttpReply {
    /// Creates a reply with the given status and body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            reason: None,
            body: body.into(),
        }
    }

    /// Returns true for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request body and returns the reply.
///
/// Implementations report connection failures as
/// [`ClientError::Transport`] and return non-2xx replies as-is; status
/// handling belongs to the caller.
pub trait Transport: Send + Sync {
    /// POSTs `body` to `url` with the given content type.
    fn post<'a>(
        &'a self,
        url: &'a Url,
        content_type: &'a str,
        body: Vec<u8>,
    ) -> BoxFuture<'a, ClientResult<HttpReply>>;
}

/// [`Transport`] over a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Builds the HTTP client from timeout, user agent and TLS settings.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ClientError::transport(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn post<'a>(
        &'a self,
        url: &'a Url,
        content_type: &'a str,
        body: Vec<u8>,
    ) -> BoxFuture<'a, ClientResult<HttpReply>> {
        Box::pin(async move {
            trace!(url = %url, bytes = body.len(), "sending request");

            let response = self
                .client
                .post(url.clone())
                .header(CONTENT_TYPE, content_type)
                .body(body)
                .send()
                .await
                .map_err(|e| ClientError::transport(format!("request failed: {}", e)))?;

            let status = response.status();
            trace!(status = %status, "received response");

            let body = response
                .bytes()
                .await
                .map_err(|e| ClientError::transport(format!("failed to read response: {}", e)))?;

            Ok(HttpReply {
                status: status.as_u16(),
                reason: status.canonical_reason().map(str::to_string),
                body: body.to_vec(),
            })
        })
    }
}
