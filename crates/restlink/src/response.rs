//! Normalized HTTP responses.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::logging::targets;
use crate::transport::TransportFailure;

/// A response object as handed back by a [`Transport`](crate::transport::Transport).
///
/// The body can be read once; later reads fail.
pub trait TransportResponse: fmt::Debug + Send + Sync {
    /// HTTP status code.
    fn status(&self) -> u16;

    /// Status line text (e.g. `"OK"` for 200).
    fn reason(&self) -> &str;

    /// URL the response was received from.
    fn url(&self) -> Option<&str>;

    /// Response headers in the order the transport received them.
    fn headers(&self) -> &[(String, String)];

    /// Read the full response body, consuming it.
    fn read_body(&mut self) -> std::result::Result<Bytes, TransportFailure>;
}

/// Response headers keyed by name.
pub type Headers = BTreeMap<String, String>;

/// A completed HTTP exchange.
///
/// Two responses are equal when their code, body and headers are equal; the
/// status text and the originating transport response are ignored.
#[derive(Clone, Default)]
pub struct Response {
    code: Option<u16>,
    body: Bytes,
    headers: Headers,
    msg: String,
    original: Option<Arc<dyn TransportResponse>>,
}

impl Response {
    /// Create a response with no headers and an empty status text.
    pub fn new(code: Option<u16>, body: impl Into<Bytes>) -> Self {
        Self {
            code,
            body: body.into(),
            ..Self::default()
        }
    }

    /// Set the headers.
    pub fn with_headers<K, V>(mut self, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers = headers
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
        self
    }

    /// Set the status text.
    pub fn with_msg(mut self, msg: impl Into<String>) -> Self {
        self.msg = msg.into();
        self
    }

    /// Attach the transport response this response was built from.
    pub fn with_original(mut self, original: Arc<dyn TransportResponse>) -> Self {
        self.original = Some(original);
        self
    }

    /// Build a response from a transport response, reading its body.
    ///
    /// The headers are copied into a plain map; repeated headers are joined
    /// with `", "`. The transport response is kept as [`Response::original`].
    /// If the body cannot be read, the returned failure carries the
    /// transport response.
    pub fn from_transport(
        mut response: Box<dyn TransportResponse>,
    ) -> std::result::Result<Self, TransportFailure> {
        match response.read_body() {
            Ok(body) => Ok(Self::materialize(response, body)),
            Err(failure) => Err(failure.with_response(response)),
        }
    }

    /// Like [`Response::from_transport`], but an unreadable body becomes empty.
    pub(crate) fn from_transport_lossy(mut response: Box<dyn TransportResponse>) -> Self {
        let body = match response.read_body() {
            Ok(body) => body,
            Err(err) => {
                tracing::debug!(target: targets::CONNECTION, "Discarding unreadable body: {}", err);
                Bytes::new()
            }
        };
        Self::materialize(response, body)
    }

    fn materialize(response: Box<dyn TransportResponse>, body: Bytes) -> Self {
        let mut headers = Headers::new();
        for (name, value) in response.headers() {
            headers
                .entry(name.clone())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.clone());
        }

        Self {
            code: Some(response.status()),
            body,
            headers,
            msg: response.reason().to_string(),
            original: Some(Arc::from(response)),
        }
    }

    /// The HTTP status code, if the exchange produced one.
    pub fn code(&self) -> Option<u16> {
        self.code
    }

    /// The raw body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// All headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The status text (e.g. `"Not Found"`).
    pub fn msg(&self) -> &str {
        &self.msg
    }

    /// The transport response this response was built from.
    pub fn original(&self) -> Option<&Arc<dyn TransportResponse>> {
        self.original.as_ref()
    }

    /// The URL of the originating transport response.
    pub fn url(&self) -> Option<&str> {
        self.original.as_deref().and_then(|original| original.url())
    }

    /// Get a header value. Lookup is case-sensitive.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// Get a header value, or `default` if it is absent.
    pub fn get<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.header(key).unwrap_or(default)
    }

    /// Get a header value that must be present.
    pub fn require(&self, key: &str) -> Result<&str> {
        self.header(key)
            .ok_or_else(|| Error::HeaderNotFound(key.to_string()))
    }

    /// Check if the status is 2xx.
    pub fn is_success(&self) -> bool {
        matches!(self.code, Some(200..=299))
    }

    /// Check if the status is 3xx.
    pub fn is_redirection(&self) -> bool {
        matches!(self.code, Some(300..=399))
    }

    /// Check if the status is 4xx.
    pub fn is_client_error(&self) -> bool {
        matches!(self.code, Some(400..=499))
    }

    /// Check if the status is 5xx.
    pub fn is_server_error(&self) -> bool {
        matches!(self.code, Some(500..=599))
    }
}

impl PartialEq for Response {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.body == other.body && self.headers == other.headers
    }
}

impl Eq for Response {}

impl<'a> Index<&'a str> for Response {
    type Output = str;

    /// # Panics
    ///
    /// Panics if the header is absent. Use [`Response::get`] or
    /// [`Response::require`] for a fallible lookup.
    fn index(&self, key: &'a str) -> &str {
        match self.header(key) {
            Some(value) => value,
            None => panic!("header not found: {key}"),
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Response(code=")?;
        match self.code {
            Some(code) => write!(f, "{code}")?,
            None => write!(f, "None")?,
        }
        write!(f, ", body=\"{}\", headers={{", String::from_utf8_lossy(&self.body))?;
        for (i, (name, value)) in self.headers.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name:?}: {value:?}")?;
        }
        write!(f, "}}, msg=\"{}\")", self.msg)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("code", &self.code)
            .field("body", &self.body)
            .field("headers", &self.headers)
            .field("msg", &self.msg)
            .field("url", &self.url())
            .finish()
    }
}
