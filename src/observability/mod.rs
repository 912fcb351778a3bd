//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Accept loop, dispatcher and bindings produce:
//!     → logging.rs (structured log events, connection_id / protocol fields)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
