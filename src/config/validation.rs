//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0, addresses parse)
//! - Validate advertised protocol names (non-empty, fit in an ALPN entry)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// ALPN protocol identifiers are length-prefixed by a single byte.
const MAX_PROTOCOL_NAME_LEN: usize = 255;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    InvalidBindAddress(String),

    #[error("listener.max_connections must be greater than zero")]
    ZeroMaxConnections,

    #[error("tls.next_protos contains an empty protocol name")]
    EmptyProtocolName,

    #[error("tls.next_protos entry {0:?} exceeds 255 bytes")]
    ProtocolNameTooLong(String),

    #[error("timeouts.handshake_secs must be greater than zero")]
    ZeroHandshakeTimeout,

    #[error("limits.{0} must be greater than zero")]
    ZeroLimit(&'static str),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    }

    for proto in &config.tls.next_protos {
        if proto.is_empty() {
            errors.push(ValidationError::EmptyProtocolName);
        } else if proto.len() > MAX_PROTOCOL_NAME_LEN {
            errors.push(ValidationError::ProtocolNameTooLong(proto.clone()));
        }
    }

    if config.timeouts.handshake_secs == 0 {
        errors.push(ValidationError::ZeroHandshakeTimeout);
    }
    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::ZeroLimit("max_body_size"));
    }
    if config.limits.max_line_bytes == 0 {
        errors.push(ValidationError::ZeroLimit("max_line_bytes"));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
