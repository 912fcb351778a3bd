//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::header::HOST;
use hyper::{Request, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use rustls::pki_types::{CertificateDer, PrivatePkcs8KeyDer, ServerName};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

use nextproto::http::{PathEcho, ServerError};
use nextproto::net::{Listener, TlsIdentity};
use nextproto::{NextProtoRegistry, ServerConfig, Shutdown, TlsServer};

pub type BoxError = Box<dyn Error + Send + Sync>;

/// A server running on an ephemeral port with a throwaway certificate.
pub struct TestServer {
    pub addr: SocketAddr,
    pub root: CertificateDer<'static>,
    pub shutdown: Shutdown,
    pub task: JoinHandle<Result<(), ServerError>>,
}

/// Start a `TlsServer` serving [`PathEcho`] with `registry`.
pub async fn start_server(config: ServerConfig, registry: NextProtoRegistry) -> TestServer {
    let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let root = certified.cert.der().clone();
    let key = PrivatePkcs8KeyDer::from(certified.key_pair.serialize_der());
    let identity = TlsIdentity::from_der(vec![root.clone()], key.into());

    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = tcp.local_addr().unwrap();
    let listener = Listener::from_tcp(tcp, 64).unwrap();

    let server = TlsServer::new(config, identity, registry, PathEcho).unwrap();
    let shutdown = Shutdown::new();
    let task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        root,
        shutdown,
        task,
    }
}

/// TLS-connect to `server`, offering `alpn` (nothing when empty).
pub async fn connect(server: &TestServer, alpn: &[&str]) -> Result<TlsStream<TcpStream>, BoxError> {
    let mut roots = rustls::RootCertStore::empty();
    roots.add(server.root.clone())?;

    let mut config = rustls::ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()?
    .with_root_certificates(roots)
    .with_no_client_auth();
    config.alpn_protocols = alpn.iter().map(|p| p.as_bytes().to_vec()).collect();

    let tcp = TcpStream::connect(server.addr).await?;
    let name = ServerName::try_from("localhost")?;
    let stream = TlsConnector::from(Arc::new(config)).connect(name, tcp).await?;
    Ok(stream)
}

/// Issue one HTTP/1.1 GET over `stream`.
pub async fn http1_get(
    stream: TlsStream<TcpStream>,
    path: &str,
) -> Result<(StatusCode, String), BoxError> {
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;
    tokio::spawn(conn);

    let request = Request::get(path)
        .header(HOST, "localhost")
        .body(Empty::<Bytes>::new())?;
    let response = sender.send_request(request).await?;
    let status = response.status();
    let body = response.into_body().collect().await?.to_bytes();
    Ok((status, String::from_utf8(body.to_vec())?))
}

/// Issue one HTTP/2 GET over `stream`.
pub async fn http2_get(
    stream: TlsStream<TcpStream>,
    path: &str,
) -> Result<(StatusCode, String), BoxError> {
    let (mut sender, conn) =
        hyper::client::conn::http2::handshake(TokioExecutor::new(), TokioIo::new(stream)).await?;
    tokio::spawn(conn);

    let request = Request::get(format!("https://localhost{path}"))
        .body(Empty::<Bytes>::new())?;
    let response = sender.send_request(request).await?;
    let status = response.status();
    let body = response.into_body().collect().await?.to_bytes();
    Ok((status, String::from_utf8(body.to_vec())?))
}
