//! Protocol bindings shipped with the server.
//!
//! - `http.rs`: `http/1.1` and `h2`, installed by the server itself
//! - `http09.rs`: HTTP/0.9 over TLS, a line-framed protocol registered by
//!   the demo binary

pub mod http;
pub mod http09;

pub use http::{Http1Binding, Http2Binding};
pub use http09::{Http09Binding, Http09Writer, HTTP09_PROTOCOL};
