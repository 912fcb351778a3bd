//! Connection state machine and lifecycle tracking.
//!
//! # Responsibilities
//! - Own one handshake-complete byte stream and its negotiated protocol
//! - Track connection state (Accepted → HandshakeComplete → terminal route)
//! - Generate unique connection IDs for tracing
//! - Count live connections for graceful shutdown

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::observability::metrics;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Per-connection lifecycle.
///
/// ```text
/// Accepted → HandshakeComplete → DefaultPipeline
///                              → BoundProtocol
///                              → ClosedUnhandled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// TCP accepted, TLS not yet complete.
    Accepted,
    /// Handshake done, protocol known, not yet routed.
    HandshakeComplete,
    /// Served by the default HTTP/1.1 pipeline.
    DefaultPipeline,
    /// Handed to a registered protocol binding.
    BoundProtocol,
    /// Negotiated protocol had no binding; closed without a response.
    ClosedUnhandled,
}

impl ConnectionState {
    /// Whether no further transition is allowed.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ConnectionState::DefaultPipeline
                | ConnectionState::BoundProtocol
                | ConnectionState::ClosedUnhandled
        )
    }

    /// Whether `self → next` is an edge of the lifecycle.
    pub fn can_transition_to(self, next: ConnectionState) -> bool {
        match self {
            ConnectionState::Accepted => next == ConnectionState::HandshakeComplete,
            ConnectionState::HandshakeComplete => next.is_terminal(),
            _ => false,
        }
    }
}

/// Any bidirectional byte stream a connection can carry.
pub trait RawStream: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T> RawStream for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

/// One accepted, handshake-complete transport stream.
///
/// Exclusively owned by the task serving it. Reads and writes go straight
/// to the underlying stream.
pub struct Connection {
    id: ConnectionId,
    remote_addr: SocketAddr,
    negotiated_protocol: String,
    state: ConnectionState,
    io: Box<dyn RawStream>,
}

impl Connection {
    /// Wrap a stream whose handshake produced `negotiated_protocol`
    /// (empty when nothing was negotiated).
    pub fn new(
        io: impl RawStream,
        remote_addr: SocketAddr,
        negotiated_protocol: impl Into<String>,
    ) -> Self {
        Self {
            id: ConnectionId::new(),
            remote_addr,
            negotiated_protocol: negotiated_protocol.into(),
            state: ConnectionState::HandshakeComplete,
            io: Box::new(io),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// The ALPN protocol agreed during the handshake, or `""`.
    pub fn negotiated_protocol(&self) -> &str {
        &self.negotiated_protocol
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Move to `next`. Invalid transitions are ignored and logged.
    pub(crate) fn transition(&mut self, next: ConnectionState) {
        if self.state.can_transition_to(next) {
            tracing::trace!(
                connection_id = %self.id,
                from = ?self.state,
                to = ?next,
                "Connection state change"
            );
            self.state = next;
        } else {
            tracing::warn!(
                connection_id = %self.id,
                from = ?self.state,
                to = ?next,
                "Rejected connection state change"
            );
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("remote_addr", &self.remote_addr)
            .field("negotiated_protocol", &self.negotiated_protocol)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl AsyncRead for Connection {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.io).poll_read(cx, buf)
    }
}

impl AsyncWrite for Connection {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.io).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.io).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.io).poll_shutdown(cx)
    }

    fn poll_write_vectored(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.io).poll_write_vectored(cx, bufs)
    }

    fn is_write_vectored(&self) -> bool {
        self.io.is_write_vectored()
    }
}

/// Tracks active connections for graceful shutdown.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    /// Current count of active connections.
    active_count: Arc<AtomicU64>,
}

impl ConnectionTracker {
    /// Create a new connection tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new active connection. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        let active = self.active_count.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::record_active_connections(active);
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
        }
    }

    /// Get current active connection count.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait until all connections are closed or `grace` elapses.
    ///
    /// Returns `true` when every connection drained in time.
    pub async fn wait_for_drain(&self, grace: Duration) -> bool {
        let drained = async {
            while self.active_count.load(Ordering::SeqCst) > 0 {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        };
        tokio::time::timeout(grace, drained).await.is_ok()
    }
}

/// Guard that tracks a connection's lifetime.
/// Decrements active count when dropped.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let active = self.active_count.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::record_active_connections(active);
    }
}
