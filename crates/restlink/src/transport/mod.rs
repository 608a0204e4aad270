//! The transport a connection sends its requests through.
//!
//! A [`Transport`] performs one blocking HTTP exchange per call. It either
//! hands back a [`TransportResponse`] (for any status code) or fails with a
//! [`TransportFailure`] when no exchange could be completed. The connection
//! decides what counts as an error; transports never inspect status codes.
//!
//! [`ReqwestTransport`] is the default implementation.

mod client;
pub mod runtime;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use bytes::Bytes;

use crate::error::Error;
use crate::response::TransportResponse;

pub use client::{ReqwestResponse, ReqwestTransport, ReqwestTransportBuilder, TransportConfig};

/// HTTP request methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET method.
    Get,
    /// HTTP POST method.
    Post,
    /// HTTP PUT method.
    Put,
    /// HTTP DELETE method.
    Delete,
    /// HTTP PATCH method.
    Patch,
    /// HTTP HEAD method.
    Head,
    /// HTTP OPTIONS method.
    Options,
}

impl HttpMethod {
    /// The method name as sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// Check if requests with this method send a body.
    pub fn carries_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }

    /// Convert to reqwest method.
    pub(crate) fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
            Self::Patch => reqwest::Method::PATCH,
            Self::Head => reqwest::Method::HEAD,
            Self::Options => reqwest::Method::OPTIONS,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            "PATCH" => Ok(Self::Patch),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            _ => Err(Error::InvalidMethod(s.to_string())),
        }
    }
}

/// A request ready to be handed to a [`Transport`].
#[derive(Clone, Debug)]
pub struct TransportRequest {
    /// The HTTP method.
    pub method: HttpMethod,
    /// The absolute request URL.
    pub url: String,
    /// Request headers, including `Authorization` when the connection has credentials.
    pub headers: http::HeaderMap,
    /// Request body.
    pub body: Option<Bytes>,
    /// Timeout for the whole exchange.
    pub timeout: Option<Duration>,
}

/// What went wrong in a failed exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The exchange did not complete within the timeout.
    Timeout,
    /// The host could not be resolved or reached.
    Connect,
    /// The response body could not be read.
    Body,
    /// Any other transport-level failure.
    Other,
}

/// A failure to complete an HTTP exchange.
///
/// May hold the response that was received before the failure.
#[derive(Debug)]
pub struct TransportFailure {
    kind: FailureKind,
    message: String,
    response: Option<Box<dyn TransportResponse>>,
}

impl TransportFailure {
    /// Create a failure without a response.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            response: None,
        }
    }

    /// Attach the partial response received before the failure.
    pub fn with_response(mut self, response: Box<dyn TransportResponse>) -> Self {
        self.response = Some(response);
        self
    }

    /// The kind of failure.
    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Description of the failure.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The partial response, if any.
    pub fn response(&self) -> Option<&dyn TransportResponse> {
        self.response.as_deref()
    }

    /// Check if the exchange timed out.
    pub fn is_timeout(&self) -> bool {
        self.kind == FailureKind::Timeout
    }

    pub(crate) fn take_response(&mut self) -> Option<Box<dyn TransportResponse>> {
        self.response.take()
    }
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FailureKind::Timeout => write!(f, "Request timed out: {}", self.message),
            FailureKind::Connect => write!(f, "Connection failed: {}", self.message),
            FailureKind::Body => write!(f, "Failed to read response body: {}", self.message),
            FailureKind::Other => write!(f, "Transport error: {}", self.message),
        }
    }
}

impl std::error::Error for TransportFailure {}

/// Performs HTTP exchanges for a [`Connection`](crate::Connection).
///
/// Implementations block the calling thread until the exchange completes,
/// fails or times out. They must not retry.
pub trait Transport: fmt::Debug + Send + Sync {
    /// Perform one HTTP exchange.
    fn execute(
        &self,
        request: TransportRequest,
    ) -> Result<Box<dyn TransportResponse>, TransportFailure>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!(" Post ".parse::<HttpMethod>().unwrap(), HttpMethod::Post);
        assert_eq!("DELETE".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
        assert!(matches!(
            "FETCH".parse::<HttpMethod>(),
            Err(Error::InvalidMethod(method)) if method == "FETCH"
        ));
    }

    #[test]
    fn test_method_body() {
        assert!(HttpMethod::Post.carries_body());
        assert!(HttpMethod::Put.carries_body());
        assert!(HttpMethod::Patch.carries_body());
        assert!(!HttpMethod::Get.carries_body());
        assert!(!HttpMethod::Head.carries_body());
        assert!(!HttpMethod::Delete.carries_body());
    }

    #[test]
    fn test_method_display() {
        assert_eq!(HttpMethod::Options.to_string(), "OPTIONS");
        assert_eq!(HttpMethod::Patch.to_reqwest(), reqwest::Method::PATCH);
    }

    #[test]
    fn test_failure_display() {
        let failure = TransportFailure::new(FailureKind::Timeout, "operation timed out");
        assert!(failure.is_timeout());
        assert!(failure.response().is_none());
        assert_eq!(failure.to_string(), "Request timed out: operation timed out");

        let failure = TransportFailure::new(FailureKind::Connect, "connection refused");
        assert!(!failure.is_timeout());
        assert_eq!(failure.to_string(), "Connection failed: connection refused");
    }
}
