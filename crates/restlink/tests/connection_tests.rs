//! Integration tests for connections over real HTTP.
//!
//! A wiremock server runs on the shared runtime; requests go through the
//! default reqwest transport from plain synchronous tests.

use std::net::TcpListener;
use std::time::Duration;

use restlink::transport::runtime;
use restlink::{Connection, Error, FailureKind, HttpMethod};
use wiremock::matchers::{body_string, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn start_server() -> MockServer {
    runtime::block_on(MockServer::start()).expect("Failed to start runtime")
}

fn mount(server: &MockServer, mock: Mock) {
    runtime::block_on(mock.mount(server)).expect("Failed to start runtime");
}

#[test]
fn test_get_request() {
    let server = start_server();
    mount(
        &server,
        Mock::given(method("GET"))
            .and(path("/people/1.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(r#"{"id":1,"name":"Matz"}"#, "application/json"),
            ),
    );

    let connection = Connection::new(server.uri()).expect("Failed to build connection");
    let response = connection
        .get("/people/1.json", None)
        .expect("Request failed");

    assert_eq!(response.code(), Some(200));
    assert_eq!(response.msg(), "OK");
    assert_eq!(response.url(), Some(format!("{}/people/1.json", server.uri()).as_str()));
    assert_eq!(response.get("content-type", ""), "application/json");

    let data: serde_json::Value = serde_json::from_slice(response.body()).expect("Invalid JSON");
    assert_eq!(data["name"], "Matz");
}

#[test]
fn test_query_string_is_kept() {
    let server = start_server();
    mount(
        &server,
        Mock::given(method("GET"))
            .and(path("/people.json"))
            .and(query_param("name", "Matz"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]")),
    );

    let connection = Connection::new(server.uri()).expect("Failed to build connection");
    let response = connection
        .get("/people.json?name=Matz", None)
        .expect("Request failed");
    assert_eq!(response.text(), "[]");
}

#[test]
fn test_basic_auth_from_site_url() {
    let server = start_server();
    mount(
        &server,
        Mock::given(method("GET"))
            .and(path("/secure.json"))
            .and(header("Authorization", "Basic dXNlcjpwYXNz"))
            .respond_with(ResponseTemplate::new(200)),
    );

    let site = server.uri().replacen("http://", "http://user:pass@", 1);
    let connection = Connection::new(site).expect("Failed to build connection");
    assert_eq!(connection.site().as_str(), server.uri());

    let response = connection.get("/secure.json", None).expect("Request failed");
    assert_eq!(response.code(), Some(200));
}

#[test]
fn test_post_created() {
    let server = start_server();
    mount(
        &server,
        Mock::given(method("POST"))
            .and(path("/people.json"))
            .and(header("Content-Type", "application/json"))
            .and(body_string(r#"{"name":"Matz"}"#))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("Location", "/people/5.json")
                    .set_body_string(r#"{"id":5}"#),
            ),
    );

    let connection = Connection::new(server.uri()).expect("Failed to build connection");
    let response = connection
        .post("/people.json", None, r#"{"name":"Matz"}"#)
        .expect("Request failed");

    assert_eq!(response.code(), Some(201));
    assert_eq!(response.text(), r#"{"id":5}"#);
    assert_eq!(response.get("location", ""), "/people/5.json");
}

#[test]
fn test_delete_sends_no_body() {
    let server = start_server();
    mount(
        &server,
        Mock::given(method("DELETE"))
            .and(path("/people/1.json"))
            .and(body_string(""))
            .respond_with(ResponseTemplate::new(200)),
    );

    let connection = Connection::new(server.uri()).expect("Failed to build connection");
    let response = connection
        .perform_request(HttpMethod::Delete, "/people/1.json", None, Some("ignored".into()))
        .expect("Request failed");
    assert_eq!(response.code(), Some(200));
}

#[test]
fn test_default_headers_sent() {
    let server = start_server();
    mount(
        &server,
        Mock::given(method("GET"))
            .and(path("/people.json"))
            .and(header("X-Api-Version", "2"))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(200)),
    );

    let connection = Connection::builder(server.uri())
        .default_header("X-Api-Version", "2")
        .expect("Invalid header")
        .build()
        .expect("Failed to build connection");
    let response = connection.get("/people.json", None).expect("Request failed");
    assert_eq!(response.code(), Some(200));
}

#[test]
fn test_client_error_is_a_response() {
    let server = start_server();
    mount(
        &server,
        Mock::given(method("PUT"))
            .and(path("/people/1.json"))
            .respond_with(ResponseTemplate::new(422).set_body_string(r#"{"errors":["name"]}"#)),
    );

    let connection = Connection::new(server.uri()).expect("Failed to build connection");
    let response = connection
        .put("/people/1.json", None, "{}")
        .expect("4xx should not be an error");
    assert_eq!(response.code(), Some(422));
    assert!(response.is_client_error());
}

#[test]
fn test_server_error() {
    let server = start_server();
    mount(
        &server,
        Mock::given(method("GET"))
            .and(path("/path"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down")),
    );

    let connection = Connection::new(server.uri()).expect("Failed to build connection");
    let err = connection.get("/path", None).unwrap_err();

    let Error::Server(server_error) = &err else {
        panic!("expected server error, got {err:?}");
    };
    assert_eq!(server_error.code(), Some(503));
    assert_eq!(server_error.message(), Some("Service Unavailable"));
    let expected_url = format!("{}/path", server.uri());
    assert_eq!(server_error.url(), Some(expected_url.as_str()));
    assert_eq!(server_error.response().map(|r| r.text()), Some("down".to_string()));
}

#[test]
fn test_timeout() {
    let server = start_server();
    mount(
        &server,
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500))),
    );

    let connection = Connection::builder(server.uri())
        .timeout(Duration::from_millis(50))
        .build()
        .expect("Failed to build connection");
    let err = connection.get("/slow", None).unwrap_err();

    let Error::Connection(conn) = &err else {
        panic!("expected connection error, got {err:?}");
    };
    assert_eq!(conn.code(), None);
    assert_eq!(conn.url(), None);
    assert_eq!(conn.message(), r#"Response(code=None, body="", headers={}, msg="")"#);
    assert_eq!(conn.failure().map(|f| f.kind()), Some(FailureKind::Timeout));
}

#[test]
fn test_connection_refused() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
        listener.local_addr().expect("No local address").port()
    };

    let connection =
        Connection::new(format!("http://127.0.0.1:{port}")).expect("Failed to build connection");
    let err = connection.get("/people.json", None).unwrap_err();

    assert!(err.is_connection());
    assert_eq!(err.code(), None);
    assert_eq!(err.url(), None);
}

#[test]
fn test_connection_shared_across_threads() {
    let server = start_server();
    mount(
        &server,
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(204))
            .expect(4),
    );

    let connection = Connection::new(server.uri()).expect("Failed to build connection");
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let connection = connection.clone();
            std::thread::spawn(move || connection.get("/ping", None).map(|r| r.code()))
        })
        .collect();

    for handle in handles {
        let code = handle.join().expect("Thread panicked").expect("Request failed");
        assert_eq!(code, Some(204));
    }
}
