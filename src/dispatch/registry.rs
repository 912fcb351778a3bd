//! Protocol binding registry.
//!
//! Maps negotiated ALPN protocol names to the binding that owns connections
//! speaking that protocol. Names are compared byte-for-byte: no case folding,
//! no trimming.
//!
//! # Example
//!
//! ```ignore
//! use nextproto::bindings::Http09Binding;
//! use nextproto::dispatch::NextProtoRegistry;
//!
//! let mut registry = NextProtoRegistry::new();
//! registry.register("tls-0.9", Http09Binding);
//! assert!(registry.lookup("tls-0.9").is_some());
//! assert!(registry.lookup("TLS-0.9").is_none());
//! ```
//!
//! The registry is filled before the server is built and moved into it;
//! after that it is only reachable through a shared reference.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use super::ServerContext;
use crate::http::handler::SharedHandler;
use crate::net::Connection;

/// Owner of every connection that negotiated a given protocol.
///
/// The binding receives the default handler so it can still deliver
/// requests to the application.
pub trait ProtocolBinding: Send + Sync + 'static {
    fn serve(
        &self,
        ctx: ServerContext,
        conn: Connection,
        handler: SharedHandler,
    ) -> BoxFuture<'static, ()>;
}

/// Adapter turning an async closure into a [`ProtocolBinding`].
pub struct BindingFn<F> {
    f: F,
}

/// Wrap `f` as a [`ProtocolBinding`].
pub fn binding_fn<F, Fut>(f: F) -> BindingFn<F>
where
    F: Fn(ServerContext, Connection, SharedHandler) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    BindingFn { f }
}

impl<F, Fut> ProtocolBinding for BindingFn<F>
where
    F: Fn(ServerContext, Connection, SharedHandler) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn serve(
        &self,
        ctx: ServerContext,
        conn: Connection,
        handler: SharedHandler,
    ) -> BoxFuture<'static, ()> {
        Box::pin((self.f)(ctx, conn, handler))
    }
}

/// Registry mapping protocol names to bindings.
#[derive(Clone, Default)]
pub struct NextProtoRegistry {
    bindings: HashMap<String, Arc<dyn ProtocolBinding>>,
}

impl NextProtoRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `binding`, replacing any earlier binding for it.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        binding: impl ProtocolBinding,
    ) -> &mut Self {
        let name = name.into();
        if name.is_empty() {
            // Empty means "nothing negotiated" and always takes the default route.
            tracing::warn!("Binding registered for empty protocol name will never be used");
        }
        if self
            .bindings
            .insert(name.clone(), Arc::new(binding))
            .is_some()
        {
            tracing::debug!(protocol = %name, "Replaced protocol binding");
        }
        self
    }

    /// Bind `name` only if nothing is bound to it yet.
    ///
    /// Returns whether the binding was installed.
    pub fn register_if_absent(
        &mut self,
        name: impl Into<String>,
        binding: impl ProtocolBinding,
    ) -> bool {
        let name = name.into();
        if self.bindings.contains_key(&name) {
            return false;
        }
        self.bindings.insert(name, Arc::new(binding));
        true
    }

    /// Exact-match lookup.
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn ProtocolBinding>> {
        self.bindings.get(name).cloned()
    }

    /// Registered protocol names, sorted.
    pub fn protocols(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.bindings.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl std::fmt::Debug for NextProtoRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NextProtoRegistry")
            .field("protocols", &self.protocols())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> impl ProtocolBinding {
        binding_fn(|_ctx, _conn, _handler| async {})
    }

    #[test]
    fn lookup_is_exact() {
        let mut registry = NextProtoRegistry::new();
        registry.register("tls-0.9", noop());

        assert!(registry.lookup("tls-0.9").is_some());
        assert!(registry.lookup("TLS-0.9").is_none());
        assert!(registry.lookup(" tls-0.9").is_none());
        assert!(registry.lookup("tls-0.9 ").is_none());
        assert!(registry.lookup("tls").is_none());
        assert!(registry.lookup("").is_none());
    }

    #[test]
    fn last_registration_wins() {
        let first: Arc<dyn ProtocolBinding> = Arc::new(noop());
        let mut registry = NextProtoRegistry::new();
        registry.bindings.insert("x".into(), first.clone());
        registry.register("x", noop());

        let found = registry.lookup("x").unwrap();
        assert!(!Arc::ptr_eq(&found, &first));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn register_if_absent_keeps_existing() {
        let mut registry = NextProtoRegistry::new();
        assert!(registry.register_if_absent("http/1.1", noop()));
        let original = registry.lookup("http/1.1").unwrap();

        assert!(!registry.register_if_absent("http/1.1", noop()));
        assert!(Arc::ptr_eq(&registry.lookup("http/1.1").unwrap(), &original));
    }

    #[test]
    fn protocols_are_sorted() {
        let mut registry = NextProtoRegistry::new();
        registry.register("tls-0.9", noop()).register("h2", noop());
        assert_eq!(registry.protocols(), vec!["h2", "tls-0.9"]);
        assert!(!registry.is_empty());
    }
}
