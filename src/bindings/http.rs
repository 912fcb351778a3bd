//! Bindings for the standard HTTP protocol names.

use futures_util::future::BoxFuture;

use crate::dispatch::{ProtocolBinding, ServerContext};
use crate::http::handler::SharedHandler;
use crate::http::pipeline;
use crate::net::Connection;

/// `http/1.1`: the default pipeline, reached through ALPN.
#[derive(Debug, Clone, Copy, Default)]
pub struct Http1Binding;

impl ProtocolBinding for Http1Binding {
    fn serve(
        &self,
        ctx: ServerContext,
        conn: Connection,
        handler: SharedHandler,
    ) -> BoxFuture<'static, ()> {
        Box::pin(async move { pipeline::serve_http1(&ctx, conn, handler).await })
    }
}

/// `h2`: HTTP/2 with the same handler and buffered responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct Http2Binding;

impl ProtocolBinding for Http2Binding {
    fn serve(
        &self,
        ctx: ServerContext,
        conn: Connection,
        handler: SharedHandler,
    ) -> BoxFuture<'static, ()> {
        Box::pin(async move { pipeline::serve_http2(&ctx, conn, handler).await })
    }
}
