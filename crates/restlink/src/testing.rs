//! An in-memory transport for tests.
//!
//! [`FakeTransport`] answers requests from a table of canned responses keyed
//! by method and path (including the query string) and records every request
//! it receives. Code built on top of a [`Connection`](crate::Connection) can
//! be exercised without a network:
//!
//! ```ignore
//! use std::sync::Arc;
//! use restlink::{Connection, HttpMethod};
//! use restlink::testing::FakeTransport;
//!
//! let fake = Arc::new(FakeTransport::new());
//! fake.respond_to(HttpMethod::Get, "/people.json", &[], r#"[{"id":1}]"#, 200);
//!
//! let connection = Connection::builder("http://localhost")
//!     .transport(fake.clone())
//!     .build()?;
//! let response = connection.get("/people.json", None)?;
//! assert_eq!(fake.requests().len(), 1);
//! ```

use bytes::Bytes;
use parking_lot::Mutex;

use crate::response::TransportResponse;
use crate::transport::{FailureKind, HttpMethod, Transport, TransportFailure, TransportRequest};

/// A canned transport response.
#[derive(Clone, Debug)]
pub struct FakeResponse {
    status: u16,
    reason: String,
    url: Option<String>,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
}

impl FakeResponse {
    /// Create a response; the reason is the canonical text of the status.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        let reason = http::StatusCode::from_u16(status)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or_default();
        Self {
            status,
            reason: reason.to_string(),
            url: None,
            headers: Vec::new(),
            body: Some(body.into()),
        }
    }

    /// Override the status text.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Set the URL the response claims to come from.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Add a header. Repeated names are kept as separate entries.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

impl TransportResponse for FakeResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn reason(&self) -> &str {
        &self.reason
    }

    fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    fn read_body(&mut self) -> Result<Bytes, TransportFailure> {
        self.body
            .take()
            .ok_or_else(|| TransportFailure::new(FailureKind::Body, "response body already consumed"))
    }
}

#[derive(Debug)]
enum Outcome {
    Respond(FakeResponse),
    Fail {
        kind: FailureKind,
        message: String,
        partial: Option<FakeResponse>,
    },
}

#[derive(Debug)]
struct Route {
    method: HttpMethod,
    path: String,
    outcome: Outcome,
}

/// A [`Transport`] that serves registered responses from memory.
#[derive(Debug, Default)]
pub struct FakeTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl FakeTransport {
    /// Create a transport with no registered responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a response for `method` and `path`.
    ///
    /// `path` is matched against the request path plus query string. A later
    /// registration for the same pair replaces the earlier one.
    pub fn respond_to(
        &self,
        method: HttpMethod,
        path: &str,
        headers: &[(&str, &str)],
        body: impl Into<Bytes>,
        status: u16,
    ) {
        let response = headers
            .iter()
            .fold(FakeResponse::new(status, body), |response, (name, value)| {
                response.with_header(*name, *value)
            });
        self.register(method, path, Outcome::Respond(response));
    }

    /// Make requests for `method` and `path` fail without a response.
    pub fn fail_with(&self, method: HttpMethod, path: &str, kind: FailureKind, message: &str) {
        self.register(
            method,
            path,
            Outcome::Fail {
                kind,
                message: message.to_string(),
                partial: None,
            },
        );
    }

    /// Make requests for `method` and `path` fail after receiving `partial`.
    pub fn fail_with_response(
        &self,
        method: HttpMethod,
        path: &str,
        kind: FailureKind,
        message: &str,
        partial: FakeResponse,
    ) {
        self.register(
            method,
            path,
            Outcome::Fail {
                kind,
                message: message.to_string(),
                partial: Some(partial),
            },
        );
    }

    /// All requests received so far, oldest first.
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<TransportRequest> {
        self.requests.lock().last().cloned()
    }

    fn register(&self, method: HttpMethod, path: &str, outcome: Outcome) {
        let mut routes = self.routes.lock();
        routes.retain(|route| !(route.method == method && route.path == path));
        routes.push(Route {
            method,
            path: path.to_string(),
            outcome,
        });
    }
}

/// The path and query of an absolute URL.
fn request_path(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        },
        Err(_) => url.to_string(),
    }
}

impl Transport for FakeTransport {
    fn execute(
        &self,
        request: TransportRequest,
    ) -> Result<Box<dyn TransportResponse>, TransportFailure> {
        let method = request.method;
        let path = request_path(&request.url);
        self.requests.lock().push(request.clone());

        let routes = self.routes.lock();
        let route = routes
            .iter()
            .find(|route| route.method == method && route.path == path)
            .ok_or_else(|| {
                TransportFailure::new(
                    FailureKind::Connect,
                    format!("no response registered for {method} {path}"),
                )
            })?;

        match &route.outcome {
            Outcome::Respond(response) => {
                Ok(Box::new(response.clone().with_url(request.url)))
            }
            Outcome::Fail {
                kind,
                message,
                partial,
            } => {
                let failure = TransportFailure::new(*kind, message.clone());
                Err(match partial {
                    Some(partial) => {
                        failure.with_response(Box::new(partial.clone().with_url(request.url)))
                    }
                    None => failure,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: HttpMethod, url: &str) -> TransportRequest {
        TransportRequest {
            method,
            url: url.to_string(),
            headers: http::HeaderMap::new(),
            body: None,
            timeout: None,
        }
    }

    #[test]
    fn test_fake_response_reason() {
        assert_eq!(FakeResponse::new(404, "").reason(), "Not Found");
        assert_eq!(FakeResponse::new(299, "").reason(), "");
        assert_eq!(FakeResponse::new(200, "").with_reason("Fine").reason(), "Fine");
    }

    #[test]
    fn test_respond_to_matches_path_and_query() {
        let fake = FakeTransport::new();
        fake.respond_to(HttpMethod::Get, "/people.json?name=Matz", &[], "[]", 200);

        let mut response = fake
            .execute(request(HttpMethod::Get, "http://localhost/people.json?name=Matz"))
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.url(), Some("http://localhost/people.json?name=Matz"));
        assert_eq!(response.read_body().unwrap(), Bytes::from("[]"));

        // Different query, method or path has no response
        assert!(fake.execute(request(HttpMethod::Get, "http://localhost/people.json")).is_err());
        assert!(fake
            .execute(request(HttpMethod::Post, "http://localhost/people.json?name=Matz"))
            .is_err());
        assert_eq!(fake.requests().len(), 3);
    }

    #[test]
    fn test_later_registration_wins() {
        let fake = FakeTransport::new();
        fake.respond_to(HttpMethod::Get, "/a", &[], "first", 200);
        fake.respond_to(HttpMethod::Get, "/a", &[("X-Version", "2")], "second", 202);

        let mut response = fake.execute(request(HttpMethod::Get, "http://localhost/a")).unwrap();
        assert_eq!(response.status(), 202);
        assert_eq!(response.headers(), &[("X-Version".to_string(), "2".to_string())]);
        assert_eq!(response.read_body().unwrap(), Bytes::from("second"));
    }

    #[test]
    fn test_fail_with_partial_response() {
        let fake = FakeTransport::new();
        fake.fail_with_response(
            HttpMethod::Get,
            "/slow",
            FailureKind::Body,
            "connection reset",
            FakeResponse::new(200, "par"),
        );

        let err = fake
            .execute(request(HttpMethod::Get, "http://localhost/slow"))
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Body);
        assert_eq!(err.response().and_then(|r| r.url()), Some("http://localhost/slow"));
    }
}
