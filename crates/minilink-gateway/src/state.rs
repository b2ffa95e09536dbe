use std::sync::Arc;

use minilink_core::{AliasCache, IdentityStore, Resolver, Shortener};
use minilink_redirector::ResolverService;
use minilink_shortener::ShortenerService;

#[derive(Clone)]
pub struct AppState {
    shortener: Arc<dyn Shortener>,
    resolver: Arc<dyn Resolver>,
}

impl AppState {
    pub fn new(shortener: Arc<dyn Shortener>, resolver: Arc<dyn Resolver>) -> Self {
        Self {
            shortener,
            resolver,
        }
    }

    /// Wires both services over one shared store and cache.
    pub fn from_backends<S: IdentityStore, C: AliasCache>(store: Arc<S>, cache: Arc<C>) -> Self {
        Self::new(
            Arc::new(ShortenerService::new(store.clone(), cache.clone())),
            Arc::new(ResolverService::new(store, cache)),
        )
    }

    pub fn shortener(&self) -> &dyn Shortener {
        self.shortener.as_ref()
    }

    pub fn resolver(&self) -> &dyn Resolver {
        self.resolver.as_ref()
    }
}
