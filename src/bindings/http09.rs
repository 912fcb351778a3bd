//! HTTP/0.9 over TLS.
//!
//! The client sends one line, `GET <path>\n`; the server answers with the
//! bare response body and closes. There are no status lines or headers in
//! either direction.

use bytes::{Bytes, BytesMut};
use futures_util::future::BoxFuture;
use hyper::{HeaderMap, Method, Request, StatusCode, Uri, Version};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};

use crate::dispatch::{ProtocolBinding, ServerContext};
use crate::http::handler::{ConnectionInfo, ResponseSink, SharedHandler};
use crate::http::safe_path;
use crate::net::Connection;

/// ALPN name the demo server registers this binding under.
pub const HTTP09_PROTOCOL: &str = "tls-0.9";

#[derive(Debug, Clone, Copy, Default)]
pub struct Http09Binding;

impl ProtocolBinding for Http09Binding {
    fn serve(
        &self,
        ctx: ServerContext,
        conn: Connection,
        handler: SharedHandler,
    ) -> BoxFuture<'static, ()> {
        Box::pin(serve(ctx, conn, handler))
    }
}

async fn serve(ctx: ServerContext, conn: Connection, handler: SharedHandler) {
    let connection_id = conn.id();
    let info = ConnectionInfo::from(&conn);
    let max_line = ctx.config().limits.max_line_bytes;

    let mut reader = BufReader::new(conn);
    let line = match read_line(&mut reader, max_line).await {
        Ok(Some(line)) => line,
        Ok(None) => {
            tracing::debug!(connection_id = %connection_id, "Malformed HTTP/0.9 request line");
            return;
        }
        Err(e) => {
            tracing::debug!(connection_id = %connection_id, error = %e, "Failed to read HTTP/0.9 request");
            return;
        }
    };

    let Some(request) = parse_request(&line, info) else {
        tracing::debug!(connection_id = %connection_id, line = %line.trim(), "Rejected HTTP/0.9 request");
        return;
    };

    let mut writer = Http09Writer::new();
    handler.serve(&mut writer, request).await;

    let mut conn = reader.into_inner();
    if let Err(e) = conn.write_all(&writer.into_body()).await {
        tracing::debug!(connection_id = %connection_id, error = %e, "Failed to write HTTP/0.9 response");
        return;
    }
    let _ = conn.shutdown().await;
}

/// Read one `\n`-terminated line of at most `max_len` bytes.
///
/// `Ok(None)` when the line is unterminated, too long, or not UTF-8.
async fn read_line(
    reader: &mut BufReader<Connection>,
    max_len: usize,
) -> std::io::Result<Option<String>> {
    let mut buf = Vec::new();
    reader
        .take(max_len as u64)
        .read_until(b'\n', &mut buf)
        .await?;

    if buf.last() != Some(&b'\n') {
        return Ok(None);
    }
    Ok(String::from_utf8(buf).ok())
}

fn parse_request(line: &str, info: ConnectionInfo) -> Option<Request<Bytes>> {
    let path = line.trim().strip_prefix("GET ")?;
    let path = safe_path::localize(path).ok()?;
    let uri: Uri = path.parse().ok()?;

    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .version(Version::HTTP_09)
        .extension(info)
        .body(Bytes::new())
        .ok()
}

/// Response sink for a protocol without header framing.
///
/// Status and headers are accepted and thrown away; only body bytes reach
/// the client. This loss is the protocol, not an accident.
#[derive(Debug, Default)]
pub struct Http09Writer {
    discarded_headers: HeaderMap,
    body: BytesMut,
}

impl Http09Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_body(self) -> Bytes {
        self.body.freeze()
    }
}

impl ResponseSink for Http09Writer {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.discarded_headers
    }

    fn set_status(&mut self, _status: StatusCode) {}

    fn write(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }
}
