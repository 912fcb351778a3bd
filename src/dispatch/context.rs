//! Server state handed to protocol bindings.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::ServerConfig;

/// Cheap-clone view of the running server.
#[derive(Debug, Clone)]
pub struct ServerContext {
    config: Arc<ServerConfig>,
    local_addr: Option<SocketAddr>,
}

impl ServerContext {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self {
            config,
            local_addr: None,
        }
    }

    pub fn with_local_addr(mut self, addr: SocketAddr) -> Self {
        self.local_addr = Some(addr);
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Address the accept loop is bound to, if known.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}
