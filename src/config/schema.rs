//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// ALPN identifier for plain HTTP/1.1.
pub const HTTP11_PROTOCOL: &str = "http/1.1";

/// ALPN identifier for HTTP/2 over TLS.
pub const H2_PROTOCOL: &str = "h2";

/// Root configuration for the TLS server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// Certificate locations and advertised application protocols.
    pub tls: TlsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Input size limits.
    pub limits: LimitsConfig,

    /// Serve HTTP/2 when a client negotiates `h2`.
    pub http2: bool,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ServerConfig {
    /// ALPN protocol list in server preference order.
    ///
    /// `h2` leads when enabled, configured protocols follow, and `http/1.1`
    /// always closes the list so standard clients keep working.
    pub fn advertised_protocols(&self) -> Vec<String> {
        let mut protocols = Vec::with_capacity(self.tls.next_protos.len() + 2);
        if self.http2 {
            protocols.push(H2_PROTOCOL.to_string());
        }
        for proto in &self.tls.next_protos {
            if !protocols.contains(proto) && proto != HTTP11_PROTOCOL {
                protocols.push(proto.clone());
            }
        }
        protocols.push(HTTP11_PROTOCOL.to_string());
        protocols
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8443").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8443".to_string(),
            max_connections: 10_000,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Path to certificate chain file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,

    /// Application protocols advertised during the handshake, in preference
    /// order. Advertising a name does not register a handler for it.
    pub next_protos: Vec<String>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_path: "cert.pem".to_string(),
            key_path: "key.pem".to_string(),
            next_protos: Vec::new(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// TLS handshake deadline in seconds.
    pub handshake_secs: u64,

    /// How long shutdown waits for connections to drain, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            handshake_secs: 10,
            shutdown_grace_secs: 30,
        }
    }
}

/// Input size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes for the HTTP pipelines.
    pub max_body_size: usize,

    /// Maximum request line length for line-framed protocols.
    pub max_line_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
            max_line_bytes: 8 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http11_always_advertised_last() {
        let mut config = ServerConfig::default();
        config.tls.next_protos = vec!["unhandled-proto".into(), "tls-0.9".into()];

        assert_eq!(
            config.advertised_protocols(),
            vec!["unhandled-proto", "tls-0.9", "http/1.1"]
        );
    }

    #[test]
    fn h2_leads_when_enabled() {
        let mut config = ServerConfig::default();
        config.http2 = true;
        config.tls.next_protos = vec!["http/1.1".into(), "h2".into(), "x".into()];

        assert_eq!(config.advertised_protocols(), vec!["h2", "x", "http/1.1"]);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            http2 = true

            [tls]
            next_protos = ["tls-0.9"]
            "#,
        )
        .unwrap();

        assert!(config.http2);
        assert_eq!(config.tls.next_protos, vec!["tls-0.9"]);
        assert_eq!(config.tls.cert_path, "cert.pem");
        assert_eq!(config.listener.max_connections, 10_000);
        assert_eq!(config.limits.max_line_bytes, 8 * 1024);
    }
}
