//! Integration tests for the reqwest-backed transport.

use ideacap_core::{Error, HttpRequest, ReqwestTransport, Transport};
use wiremock::matchers::{body_bytes, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_transport_sends_headers_and_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/upload"))
        .and(header("x-upsert", "true"))
        .and(body_bytes(vec![1u8, 2, 3]))
        .respond_with(ResponseTemplate::new(201).set_body_string("created"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = ReqwestTransport::new(5).expect("Failed to create transport");
    let request = HttpRequest::put(format!("{}/upload", mock_server.uri()))
        .header("x-upsert", "true")
        .body(vec![1, 2, 3]);

    let response = transport.send(request).await.expect("Request should succeed");
    assert_eq!(response.status, 201);
    assert_eq!(response.text(), "created");
    assert!(response.is_success());
}

#[tokio::test]
async fn test_transport_does_not_interpret_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
        .mount(&mock_server)
        .await;

    let transport = ReqwestTransport::new(5).unwrap();
    let response = transport
        .send(HttpRequest::get(format!("{}/missing", mock_server.uri())))
        .await
        .expect("Non-2xx is still a response");

    assert_eq!(response.status, 404);
    assert_eq!(response.text(), "nope");
}

#[tokio::test]
async fn test_transport_connection_failure() {
    // Nothing listens on port 9 of localhost in test environments.
    let transport = ReqwestTransport::new(2).unwrap();
    let result = transport
        .send(HttpRequest::get("http://127.0.0.1:9/unreachable"))
        .await;

    assert!(matches!(result, Err(Error::Transport(_))));
}
