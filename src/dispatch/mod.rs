//! Protocol-negotiating connection dispatch.
//!
//! # Data Flow
//! ```text
//! configuration time:
//!     NextProtoRegistry::register(name, binding)
//!     → moved into Dispatcher (Arc, read-only from here on)
//!
//! per connection:
//!     TLS handshake complete
//!     → dispatcher.rs reads negotiated protocol
//!     → Route::{Default | Bound | Unhandled}
//!     → default pipeline, the binding, or close
//! ```
//!
//! # Design Decisions
//! - The registry is injected, never global, so several servers (and tests)
//!   can run with independent registries
//! - At most one of binding / default pipeline ever sees a connection
//! - An unknown protocol is fatal for that connection only

pub mod context;
pub mod dispatcher;
pub mod registry;

pub use context::ServerContext;
pub use dispatcher::{Dispatcher, Route};
pub use registry::{binding_fn, BindingFn, NextProtoRegistry, ProtocolBinding};
