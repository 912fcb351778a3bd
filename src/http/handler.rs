//! Request handling interface shared by every protocol.
//!
//! A [`RequestHandler`] receives a fully buffered [`Request<Bytes>`] and
//! writes its answer into a [`ResponseSink`]. Each protocol decides what the
//! sink does with status, headers and body: the HTTP pipelines send all of
//! it, line-framed protocols keep only the body.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures_util::future::BoxFuture;
use http_body_util::Full;
use hyper::{HeaderMap, Request, Response, StatusCode};

use crate::net::Connection;

/// Destination for a handler's response.
pub trait ResponseSink: Send {
    /// Response headers. Sinks without header framing may drop them.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Set the response status. Defaults to `200 OK`.
    fn set_status(&mut self, status: StatusCode);

    /// Append body bytes.
    fn write(&mut self, chunk: &[u8]);

    fn write_str(&mut self, text: &str) {
        self.write(text.as_bytes());
    }
}

/// Application-level request processing.
pub trait RequestHandler: Send + Sync + 'static {
    fn serve<'a>(
        &'a self,
        sink: &'a mut dyn ResponseSink,
        request: Request<Bytes>,
    ) -> BoxFuture<'a, ()>;
}

/// Handler shared between the accept loop and every connection task.
pub type SharedHandler = Arc<dyn RequestHandler>;

/// Adapter turning a synchronous closure into a [`RequestHandler`].
pub struct HandlerFn<F> {
    f: F,
}

/// Wrap `f` as a [`RequestHandler`].
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&mut dyn ResponseSink, &Request<Bytes>) + Send + Sync + 'static,
{
    HandlerFn { f }
}

impl<F> RequestHandler for HandlerFn<F>
where
    F: Fn(&mut dyn ResponseSink, &Request<Bytes>) + Send + Sync + 'static,
{
    fn serve<'a>(
        &'a self,
        sink: &'a mut dyn ResponseSink,
        request: Request<Bytes>,
    ) -> BoxFuture<'a, ()> {
        (self.f)(sink, &request);
        Box::pin(std::future::ready(()))
    }
}

/// Transport facts attached to every request as an extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub remote_addr: SocketAddr,
    /// ALPN protocol of the carrying connection, `""` if none.
    pub negotiated_protocol: String,
}

impl From<&Connection> for ConnectionInfo {
    fn from(conn: &Connection) -> Self {
        Self {
            remote_addr: conn.remote_addr(),
            negotiated_protocol: conn.negotiated_protocol().to_string(),
        }
    }
}

/// Sink that keeps the full response in memory for an HTTP pipeline.
#[derive(Debug, Default)]
pub struct BufferedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(self.body.freeze()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl ResponseSink for BufferedResponse {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn write(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }
}
