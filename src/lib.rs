//! TLS server that routes each connection by its negotiated ALPN protocol.
//!
//! ```text
//! accept → TLS handshake → negotiated protocol
//!     ""            → default HTTP/1.1 pipeline
//!     registered    → protocol binding
//!     unregistered  → close without a response
//! ```

pub mod bindings;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::ServerConfig;
pub use dispatch::{binding_fn, Dispatcher, NextProtoRegistry, ProtocolBinding, ServerContext};
pub use http::{handler_fn, RequestHandler, ResponseSink, TlsServer};
pub use lifecycle::Shutdown;
