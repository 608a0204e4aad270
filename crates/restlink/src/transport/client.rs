//! `reqwest`-backed transport.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use reqwest::redirect::Policy;

use super::{FailureKind, Transport, TransportFailure, TransportRequest, runtime};
use crate::logging::targets;
use crate::response::TransportResponse;

/// Configuration for the reqwest transport.
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Connect timeout.
    pub connect_timeout: Option<Duration>,
    /// Whether to follow redirects.
    pub follow_redirects: bool,
    /// Maximum number of redirects to follow.
    pub max_redirects: usize,
    /// User agent sent with every request.
    pub user_agent: Option<String>,
    /// Proxy URL.
    pub proxy: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Some(Duration::from_secs(10)),
            follow_redirects: true,
            max_redirects: 10,
            user_agent: Some(format!("restlink/{} (Rust)", env!("CARGO_PKG_VERSION"))),
            proxy: None,
        }
    }
}

/// Builder for a [`ReqwestTransport`].
#[derive(Default)]
pub struct ReqwestTransportBuilder {
    config: TransportConfig,
}

impl ReqwestTransportBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Disable the connect timeout.
    pub fn no_connect_timeout(mut self) -> Self {
        self.config.connect_timeout = None;
        self
    }

    /// Disable redirect following.
    pub fn no_redirects(mut self) -> Self {
        self.config.follow_redirects = false;
        self
    }

    /// Set the maximum number of redirects to follow.
    pub fn max_redirects(mut self, max: usize) -> Self {
        self.config.max_redirects = max;
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Set a proxy URL.
    pub fn proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.config.proxy = Some(proxy_url.into());
        self
    }

    /// Build the transport.
    pub fn build(self) -> Result<ReqwestTransport, TransportFailure> {
        let mut builder = reqwest::Client::builder();

        if let Some(connect_timeout) = self.config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        if self.config.follow_redirects {
            builder = builder.redirect(Policy::limited(self.config.max_redirects));
        } else {
            builder = builder.redirect(Policy::none());
        }

        if let Some(ref ua) = self.config.user_agent {
            builder = builder.user_agent(ua);
        }

        if let Some(ref proxy_url) = self.config.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| TransportFailure::new(FailureKind::Other, format!("invalid proxy: {e}")))?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(ReqwestTransport {
            client,
            config: Arc::new(self.config),
        })
    }
}

/// A [`Transport`] that sends requests with `reqwest`.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    config: Arc<TransportConfig>,
}

impl ReqwestTransport {
    /// Create a transport with default configuration.
    pub fn new() -> Result<Self, TransportFailure> {
        ReqwestTransportBuilder::new().build()
    }

    /// Create a builder for configuring a new transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::new()
    }

    /// Get the transport's configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("config", &self.config)
            .finish()
    }
}

impl Transport for ReqwestTransport {
    fn execute(
        &self,
        request: TransportRequest,
    ) -> Result<Box<dyn TransportResponse>, TransportFailure> {
        let runtime = blocking_runtime()?;

        let mut req_builder = self
            .client
            .request(request.method.to_reqwest(), request.url.as_str())
            .headers(request.headers);

        if let Some(timeout) = request.timeout {
            req_builder = req_builder.timeout(timeout);
        }

        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        // reqwest arms its timeout timer when the send future is created
        let response = runtime.block_on(async move { req_builder.send().await })?;
        tracing::trace!(
            target: targets::TRANSPORT,
            "{} {} -> {}",
            request.method,
            request.url,
            response.status()
        );
        Ok(Box::new(ReqwestResponse::new(response)))
    }
}

fn blocking_runtime() -> Result<&'static tokio::runtime::Runtime, TransportFailure> {
    if runtime::in_async_context() {
        return Err(TransportFailure::new(
            FailureKind::Other,
            "blocking request issued from within an async runtime",
        ));
    }
    runtime::get().map_err(|e| {
        TransportFailure::new(FailureKind::Other, format!("failed to start runtime: {e}"))
    })
}

impl From<reqwest::Error> for TransportFailure {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            FailureKind::Timeout
        } else if err.is_connect() {
            FailureKind::Connect
        } else if err.is_body() || err.is_decode() {
            FailureKind::Body
        } else {
            FailureKind::Other
        };
        Self::new(kind, err.to_string())
    }
}

/// A response received by [`ReqwestTransport`].
///
/// Status, reason, URL and headers are captured on arrival; the body stays
/// on the wire until [`TransportResponse::read_body`] is called.
pub struct ReqwestResponse {
    status: u16,
    reason: String,
    url: String,
    headers: Vec<(String, String)>,
    body: Mutex<Option<reqwest::Response>>,
}

impl ReqwestResponse {
    fn new(response: reqwest::Response) -> Self {
        let status = response.status();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        Self {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            url: response.url().to_string(),
            headers,
            body: Mutex::new(Some(response)),
        }
    }
}

impl TransportResponse for ReqwestResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn reason(&self) -> &str {
        &self.reason
    }

    fn url(&self) -> Option<&str> {
        Some(&self.url)
    }

    fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    fn read_body(&mut self) -> Result<Bytes, TransportFailure> {
        let response = self
            .body
            .get_mut()
            .take()
            .ok_or_else(|| TransportFailure::new(FailureKind::Body, "response body already consumed"))?;

        let runtime = blocking_runtime()?;
        runtime.block_on(async move { response.bytes().await }).map_err(|err| {
            let kind = if err.is_timeout() {
                FailureKind::Timeout
            } else {
                FailureKind::Body
            };
            TransportFailure::new(kind, err.to_string())
        })
    }
}

impl std::fmt::Debug for ReqwestResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestResponse")
            .field("status", &self.status)
            .field("url", &self.url)
            .field("body_consumed", &self.body.lock().is_none())
            .finish()
    }
}
