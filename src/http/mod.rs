//! HTTP-facing pieces of the server.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (accept loop, TLS handshake)
//!     → [dispatch decides default pipeline / binding / close]
//!     → pipeline.rs (hyper HTTP/1.1 or HTTP/2, buffered bodies)
//!     → handler.rs (RequestHandler writes into a ResponseSink)
//!     → Send to client
//! ```

pub mod echo;
pub mod handler;
pub mod pipeline;
pub mod safe_path;
pub mod server;

pub use echo::PathEcho;
pub use handler::{
    handler_fn, BufferedResponse, ConnectionInfo, HandlerFn, RequestHandler, ResponseSink,
    SharedHandler,
};
pub use server::{ServerError, TlsServer};
