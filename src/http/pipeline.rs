//! Default request pipeline.
//!
//! # Responsibilities
//! - Drive HTTP/1.1 (and HTTP/2 for the `h2` binding) over a raw connection
//! - Buffer each request body up to `limits.max_body_size`
//! - Hand the request to the [`RequestHandler`] with a [`BufferedResponse`]
//!
//! Framing is hyper's; nothing here parses HTTP itself.

use std::convert::Infallible;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::{http1, http2};
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};

use crate::dispatch::ServerContext;
use crate::http::handler::{BufferedResponse, ConnectionInfo, SharedHandler};
use crate::net::Connection;

/// Serve HTTP/1.1 requests until the peer closes the connection.
pub async fn serve_http1(ctx: &ServerContext, conn: Connection, handler: SharedHandler) {
    let connection_id = conn.id();
    let info = ConnectionInfo::from(&conn);
    let max_body = ctx.config().limits.max_body_size;

    let service = service_fn(move |req: Request<Incoming>| {
        let handler = handler.clone();
        let info = info.clone();
        async move { handle(&handler, info, max_body, req).await }
    });

    if let Err(e) = http1::Builder::new()
        .serve_connection(TokioIo::new(conn), service)
        .await
    {
        tracing::debug!(connection_id = %connection_id, error = %e, "HTTP/1.1 connection error");
    }
}

/// Serve HTTP/2 streams until the peer closes the connection.
pub async fn serve_http2(ctx: &ServerContext, conn: Connection, handler: SharedHandler) {
    let connection_id = conn.id();
    let info = ConnectionInfo::from(&conn);
    let max_body = ctx.config().limits.max_body_size;

    let service = service_fn(move |req: Request<Incoming>| {
        let handler = handler.clone();
        let info = info.clone();
        async move { handle(&handler, info, max_body, req).await }
    });

    if let Err(e) = http2::Builder::new(TokioExecutor::new())
        .serve_connection(TokioIo::new(conn), service)
        .await
    {
        tracing::debug!(connection_id = %connection_id, error = %e, "HTTP/2 connection error");
    }
}

async fn handle(
    handler: &SharedHandler,
    info: ConnectionInfo,
    max_body: usize,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();

    let body = match Limited::new(body, max_body).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            tracing::debug!(limit = max_body, "Request body too large");
            return Ok(status_only(StatusCode::PAYLOAD_TOO_LARGE));
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to read request body");
            return Ok(status_only(StatusCode::BAD_REQUEST));
        }
    };

    let mut request = Request::from_parts(parts, body);
    request.extensions_mut().insert(info);

    let mut sink = BufferedResponse::new();
    handler.serve(&mut sink, request).await;
    Ok(sink.into_response())
}

fn status_only(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}
