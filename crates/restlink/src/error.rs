//! Error types for connections to a remote site.
//!
//! A request attempt ends in exactly one of three ways: a [`Response`], a
//! [`ServerError`] (the site answered with a 5xx status) or a
//! [`ConnectionError`] (no usable HTTP exchange took place). Both error
//! kinds carry the same three fields, `message`, `url` and `code`, so callers
//! can log or re-raise them without matching on the variant.

use std::fmt;

use bytes::Bytes;

use crate::response::{Response, TransportResponse};
use crate::transport::TransportFailure;

/// A specialized Result type for connection operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by a [`Connection`](crate::Connection).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The remote site answered with a 5xx status.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// The HTTP exchange could not be completed.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// The site URL is missing or cannot be used as a base URL.
    #[error("Invalid site: {0}")]
    InvalidSite(String),

    /// A header name or value could not be encoded.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// A required response header was absent.
    #[error("Header not found: {0}")]
    HeaderNotFound(String),

    /// An HTTP method string was not recognized.
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// A payload format string was not recognized.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// The default transport could not be created.
    #[error("Failed to set up transport: {0}")]
    TransportSetup(#[source] TransportFailure),
}

impl Error {
    /// Human readable message of the error.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Server(err) => err.message(),
            Self::Connection(err) => Some(err.message()),
            Self::InvalidSite(msg)
            | Self::InvalidHeader(msg)
            | Self::HeaderNotFound(msg)
            | Self::InvalidMethod(msg)
            | Self::InvalidFormat(msg) => Some(msg.as_str()),
            Self::TransportSetup(failure) => Some(failure.message()),
        }
    }

    /// URL the failed request was sent to, when known.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Server(err) => err.url(),
            Self::Connection(err) => err.url(),
            _ => None,
        }
    }

    /// HTTP status code attached to the error, when known.
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Server(err) => err.code(),
            Self::Connection(err) => err.code(),
            _ => None,
        }
    }

    /// Check if this is a [`ServerError`].
    pub fn is_server(&self) -> bool {
        matches!(self, Self::Server(_))
    }

    /// Check if this is a [`ConnectionError`].
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

/// An error caused by the remote server (HTTP 500..=599).
#[derive(Clone, Debug, Default)]
pub struct ServerError {
    message: Option<String>,
    url: Option<String>,
    code: Option<u16>,
    response: Option<Response>,
}

impl ServerError {
    /// Create a server error from the response that carried the 5xx status.
    ///
    /// The status text becomes the message. Without a response all fields
    /// stay empty.
    pub fn new(response: Option<&Response>) -> Self {
        match response {
            Some(response) => Self {
                message: Some(response.msg().to_string()),
                url: response.url().map(str::to_string),
                code: response.code(),
                response: Some(response.clone()),
            },
            None => Self::default(),
        }
    }

    /// The status text of the failed response.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The URL of the failed request.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// The HTTP status code.
    pub fn code(&self) -> Option<u16> {
        self.code
    }

    /// The response the server sent, including its body.
    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{msg}"),
            None => write!(f, "Server error"),
        }
    }
}

impl std::error::Error for ServerError {}

/// An error caused by the network connection.
///
/// Carries the response received before the failure, or an empty response
/// with no status code when nothing came back at all.
#[derive(Debug)]
pub struct ConnectionError {
    message: String,
    url: Option<String>,
    code: Option<u16>,
    response: Response,
    failure: Option<TransportFailure>,
}

impl ConnectionError {
    /// Create a connection error from an optional transport response.
    ///
    /// When `message` is absent or empty, the string form of the response is
    /// used instead.
    pub fn new(
        response: Option<Box<dyn TransportResponse>>,
        message: Option<String>,
    ) -> Self {
        let (response, url) = match response {
            Some(transport) => {
                let url = transport.url().map(str::to_string);
                (Response::from_transport_lossy(transport), url)
            }
            None => (Response::new(None, Bytes::new()), None),
        };
        let message = message
            .filter(|msg| !msg.is_empty())
            .unwrap_or_else(|| response.to_string());

        Self {
            message,
            url,
            code: response.code(),
            response,
            failure: None,
        }
    }

    /// Create a connection error from a transport failure.
    ///
    /// A partial response held by the failure is materialized; the failure
    /// itself becomes the error source.
    pub fn from_failure(mut failure: TransportFailure) -> Self {
        let partial = failure.take_response();
        let mut err = Self::new(partial, None);
        err.failure = Some(failure);
        err
    }

    /// Human readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The URL of the partial response, if there was one.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// The status code of the partial response, if there was one.
    pub fn code(&self) -> Option<u16> {
        self.code
    }

    /// The (possibly synthesized) response.
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// The underlying transport failure.
    pub fn failure(&self) -> Option<&TransportFailure> {
        self.failure.as_ref()
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failure
            .as_ref()
            .map(|failure| failure as &(dyn std::error::Error + 'static))
    }
}
