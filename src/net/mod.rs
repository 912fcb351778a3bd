//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → tls.rs (TLS handshake, ALPN advertisement)
//!     → connection.rs (lifecycle tracking, state machine)
//!     → Hand off to the dispatcher
//!
//! Connection States:
//!     Accepted → HandshakeComplete → DefaultPipeline | BoundProtocol | ClosedUnhandled
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Each connection tracked for graceful shutdown
//! - Connections carry a boxed stream so dispatch can be driven without TLS

pub mod connection;
pub mod listener;
pub mod tls;

pub use connection::{Connection, ConnectionId, ConnectionState, ConnectionTracker, RawStream};
pub use listener::{Listener, ListenerError};
pub use tls::{TlsError, TlsIdentity};
