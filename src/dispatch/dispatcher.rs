//! Per-connection routing on the negotiated protocol.
//!
//! ```text
//! negotiated ""            → default HTTP/1.1 pipeline
//! negotiated, registered   → that binding (and nothing else)
//! negotiated, unregistered → close, no bytes written
//! ```

use std::sync::Arc;

use tokio::io::AsyncWriteExt;

use super::{NextProtoRegistry, ProtocolBinding, ServerContext};
use crate::http::handler::SharedHandler;
use crate::http::pipeline;
use crate::net::{Connection, ConnectionState};
use crate::observability::metrics;

/// Where a connection goes, decided once after the handshake.
pub enum Route {
    Default,
    Bound(Arc<dyn ProtocolBinding>),
    Unhandled,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::Default => f.write_str("Default"),
            Route::Bound(_) => f.write_str("Bound"),
            Route::Unhandled => f.write_str("Unhandled"),
        }
    }
}

/// Routes handshake-complete connections using a frozen registry.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<NextProtoRegistry>,
}

impl Dispatcher {
    pub fn new(registry: NextProtoRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &NextProtoRegistry {
        &self.registry
    }

    /// Resolve the route for a negotiated protocol name.
    pub fn route(&self, negotiated: &str) -> Route {
        if negotiated.is_empty() {
            return Route::Default;
        }
        match self.registry.lookup(negotiated) {
            Some(binding) => Route::Bound(binding),
            None => Route::Unhandled,
        }
    }

    /// Serve `conn` to completion and return the state it ended in.
    pub async fn dispatch(
        &self,
        ctx: ServerContext,
        mut conn: Connection,
        handler: SharedHandler,
    ) -> ConnectionState {
        match self.route(conn.negotiated_protocol()) {
            Route::Default => {
                conn.transition(ConnectionState::DefaultPipeline);
                metrics::record_connection("default");
                tracing::debug!(connection_id = %conn.id(), "Serving default pipeline");

                pipeline::serve_http1(&ctx, conn, handler).await;
                ConnectionState::DefaultPipeline
            }
            Route::Bound(binding) => {
                conn.transition(ConnectionState::BoundProtocol);
                metrics::record_connection("bound");
                tracing::debug!(
                    connection_id = %conn.id(),
                    protocol = %conn.negotiated_protocol(),
                    "Handing connection to protocol binding"
                );

                binding.serve(ctx, conn, handler).await;
                ConnectionState::BoundProtocol
            }
            Route::Unhandled => {
                conn.transition(ConnectionState::ClosedUnhandled);
                metrics::record_connection("unhandled");
                tracing::warn!(
                    connection_id = %conn.id(),
                    peer_addr = %conn.remote_addr(),
                    protocol = %conn.negotiated_protocol(),
                    "No binding for negotiated protocol, closing connection"
                );

                if let Err(e) = conn.shutdown().await {
                    tracing::debug!(connection_id = %conn.id(), error = %e, "Close failed");
                }
                ConnectionState::ClosedUnhandled
            }
        }
    }
}
