//! TLS server setup and accept loop.
//!
//! # Responsibilities
//! - Install the built-in `http/1.1` (and optionally `h2`) bindings
//! - Advertise ALPN protocols and build the TLS acceptor
//! - Accept connections under the listener's connection limit
//! - Complete each TLS handshake within the configured deadline
//! - Hand every handshake-complete connection to the dispatcher
//! - Cancel in-flight connections and drain on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio_rustls::TlsAcceptor;
use tracing::Instrument;

use crate::bindings::{Http1Binding, Http2Binding};
use crate::config::{ServerConfig, H2_PROTOCOL, HTTP11_PROTOCOL};
use crate::dispatch::{Dispatcher, NextProtoRegistry, ServerContext};
use crate::http::handler::{RequestHandler, SharedHandler};
use crate::lifecycle::shutdown;
use crate::net::{tls, Connection, ConnectionTracker, Listener, ListenerError, TlsError, TlsIdentity};
use crate::observability::metrics;

/// Error type for building or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// TLS server routing connections by negotiated protocol.
pub struct TlsServer {
    config: Arc<ServerConfig>,
    acceptor: TlsAcceptor,
    dispatcher: Dispatcher,
    handler: SharedHandler,
    tracker: ConnectionTracker,
}

impl TlsServer {
    /// Build a server. `registry` is frozen from here on.
    pub fn new(
        config: ServerConfig,
        identity: TlsIdentity,
        mut registry: NextProtoRegistry,
        handler: impl RequestHandler,
    ) -> Result<Self, ServerError> {
        registry.register_if_absent(HTTP11_PROTOCOL, Http1Binding);
        if config.http2 {
            registry.register_if_absent(H2_PROTOCOL, Http2Binding);
        }

        let advertised = config.advertised_protocols();
        for proto in &advertised {
            if registry.lookup(proto).is_none() {
                tracing::warn!(protocol = %proto, "Advertised protocol has no binding");
            }
        }

        let acceptor = tls::acceptor(identity, &advertised)?;

        tracing::info!(
            advertised = ?advertised,
            registered = ?registry.protocols(),
            "Protocol bindings configured"
        );

        Ok(Self {
            config: Arc::new(config),
            acceptor,
            dispatcher: Dispatcher::new(registry),
            handler: Arc::new(handler),
            tracker: ConnectionTracker::new(),
        })
    }

    /// Live connection count, shared with the running accept loop.
    pub fn tracker(&self) -> ConnectionTracker {
        self.tracker.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Accept connections until `shutdown` fires, then drain.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        tracing::info!(address = %local_addr, "TLS server starting");

        let ctx = ServerContext::new(self.config.clone()).with_local_addr(local_addr);
        let handshake_timeout = Duration::from_secs(self.config.timeouts.handshake_secs);

        loop {
            let accepted = tokio::select! {
                _ = shutdown::requested(&mut shutdown) => break,
                accepted = listener.accept() => accepted,
            };

            let (stream, peer_addr, permit) = match accepted {
                Ok(accepted) => accepted,
                Err(ListenerError::Accept(e)) => {
                    tracing::warn!(error = %e, "Accept failed");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let task = ConnectionTask {
                acceptor: self.acceptor.clone(),
                dispatcher: self.dispatcher.clone(),
                handler: self.handler.clone(),
                ctx: ctx.clone(),
                handshake_timeout,
            };
            let guard = self.tracker.track();
            let mut cancel = shutdown.resubscribe();

            tokio::spawn(async move {
                let _permit = permit;
                let _guard = guard;
                tokio::select! {
                    _ = task.run(stream, peer_addr) => {}
                    _ = shutdown::requested(&mut cancel) => {
                        tracing::debug!(peer_addr = %peer_addr, "Connection cancelled by shutdown");
                    }
                }
            });
        }

        drop(listener);
        tracing::info!(
            active_connections = self.tracker.active_count(),
            "Stopped accepting, draining connections"
        );

        let grace = Duration::from_secs(self.config.timeouts.shutdown_grace_secs);
        if !self.tracker.wait_for_drain(grace).await {
            tracing::warn!(
                active_connections = self.tracker.active_count(),
                "Drain deadline passed with connections still open"
            );
        }

        tracing::info!("TLS server stopped");
        Ok(())
    }
}

/// Everything one connection task needs.
struct ConnectionTask {
    acceptor: TlsAcceptor,
    dispatcher: Dispatcher,
    handler: SharedHandler,
    ctx: ServerContext,
    handshake_timeout: Duration,
}

impl ConnectionTask {
    async fn run(self, stream: TcpStream, peer_addr: SocketAddr) {
        let tls = match tokio::time::timeout(self.handshake_timeout, self.acceptor.accept(stream))
            .await
        {
            Ok(Ok(tls)) => tls,
            Ok(Err(e)) => {
                metrics::record_handshake_failure();
                tracing::debug!(peer_addr = %peer_addr, error = %e, "TLS handshake failed");
                return;
            }
            Err(_) => {
                metrics::record_handshake_failure();
                tracing::debug!(peer_addr = %peer_addr, "TLS handshake timed out");
                return;
            }
        };

        let negotiated = tls
            .get_ref()
            .1
            .alpn_protocol()
            .map(|proto| String::from_utf8_lossy(proto).into_owned())
            .unwrap_or_default();

        let conn = Connection::new(tls, peer_addr, negotiated);
        let span = tracing::debug_span!(
            "connection",
            connection_id = %conn.id(),
            peer_addr = %peer_addr,
            protocol = %conn.negotiated_protocol(),
        );

        let state = self
            .dispatcher
            .dispatch(self.ctx, conn, self.handler)
            .instrument(span)
            .await;
        tracing::trace!(peer_addr = %peer_addr, state = ?state, "Connection finished");
    }
}
