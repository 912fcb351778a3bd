//! End-to-end tests for protocol-negotiated dispatch over real TLS.

use std::time::Duration;

use hyper::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use nextproto::bindings::{Http09Binding, HTTP09_PROTOCOL};
use nextproto::{NextProtoRegistry, ServerConfig};

mod common;

/// Advertise an unhandled protocol and HTTP/0.9, bind only the latter.
fn next_proto_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.tls.next_protos = vec!["unhandled-proto".into(), HTTP09_PROTOCOL.into()];
    config
}

fn http09_registry() -> NextProtoRegistry {
    let mut registry = NextProtoRegistry::new();
    registry.register(HTTP09_PROTOCOL, Http09Binding);
    registry
}

#[tokio::test]
async fn plain_request_without_alpn() {
    let server = common::start_server(next_proto_config(), http09_registry()).await;

    let stream = common::connect(&server, &[]).await.unwrap();
    assert_eq!(stream.get_ref().1.alpn_protocol(), None);

    let (status, body) = common::http1_get(stream, "/").await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "path=/,proto=");

    server.shutdown.trigger();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn unhandled_protocol_gets_no_response() {
    let server = common::start_server(next_proto_config(), http09_registry()).await;

    let outcome: Result<_, common::BoxError> = async {
        let stream = common::connect(&server, &["unhandled-proto"]).await?;
        common::http1_get(stream, "/").await
    }
    .await;
    assert!(outcome.is_err(), "expected error, got {outcome:?}");

    server.shutdown.trigger();
}

#[tokio::test]
async fn unhandled_protocol_writes_zero_bytes() {
    let server = common::start_server(next_proto_config(), http09_registry()).await;

    let mut stream = common::connect(&server, &["unhandled-proto"]).await.unwrap();
    assert_eq!(
        stream.get_ref().1.alpn_protocol(),
        Some(b"unhandled-proto".as_slice())
    );

    let _ = stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await;
    let mut received = Vec::new();
    let _ = stream.read_to_end(&mut received).await;
    assert!(received.is_empty(), "got {received:?}");

    server.shutdown.trigger();
}

#[tokio::test]
async fn registered_protocol_uses_binding() {
    let server = common::start_server(next_proto_config(), http09_registry()).await;

    let mut stream = common::connect(&server, &[HTTP09_PROTOCOL]).await.unwrap();
    assert_eq!(
        stream.get_ref().1.alpn_protocol(),
        Some(HTTP09_PROTOCOL.as_bytes())
    );

    stream.write_all(b"GET /foo\n").await.unwrap();
    let mut body = String::new();
    stream.read_to_string(&mut body).await.unwrap();
    assert_eq!(body, "path=/foo,proto=tls-0.9");

    server.shutdown.trigger();
}

#[tokio::test]
async fn http11_alpn_reaches_default_pipeline() {
    let server = common::start_server(next_proto_config(), http09_registry()).await;

    let stream = common::connect(&server, &["h2", "http/1.1"]).await.unwrap();
    assert_eq!(stream.get_ref().1.alpn_protocol(), Some(b"http/1.1".as_slice()));

    let (status, body) = common::http1_get(stream, "/bar").await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "path=/bar,proto=http/1.1");

    server.shutdown.trigger();
}

#[tokio::test]
async fn h2_served_when_enabled() {
    let mut config = next_proto_config();
    config.http2 = true;
    let server = common::start_server(config, http09_registry()).await;

    let stream = common::connect(&server, &["h2", "http/1.1"]).await.unwrap();
    assert_eq!(stream.get_ref().1.alpn_protocol(), Some(b"h2".as_slice()));

    let (status, body) = common::http2_get(stream, "/two").await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "path=/two,proto=h2");

    server.shutdown.trigger();
}

#[tokio::test]
async fn malformed_http09_line_closes_silently() {
    let server = common::start_server(next_proto_config(), http09_registry()).await;

    let mut stream = common::connect(&server, &[HTTP09_PROTOCOL]).await.unwrap();
    stream.write_all(b"POST /foo\n").await.unwrap();
    let mut received = Vec::new();
    let _ = stream.read_to_end(&mut received).await;
    assert!(received.is_empty(), "got {received:?}");

    server.shutdown.trigger();
}

#[tokio::test]
async fn shutdown_unblocks_waiting_binding() {
    let mut config = next_proto_config();
    config.timeouts.shutdown_grace_secs = 5;
    let server = common::start_server(config, http09_registry()).await;

    let mut stream = common::connect(&server, &[HTTP09_PROTOCOL]).await.unwrap();
    // Give the server a moment to reach the binding's blocking read.
    tokio::time::sleep(Duration::from_millis(100)).await;

    server.shutdown.trigger();

    let mut received = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut received)).await;
    assert!(read.is_ok(), "binding read was not cancelled");
    assert!(received.is_empty());

    let stopped = tokio::time::timeout(Duration::from_secs(5), server.task).await;
    assert!(matches!(stopped, Ok(Ok(Ok(())))));
}
