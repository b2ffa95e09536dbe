//! Alias resolution service.
//!
//! [`ResolverService`] answers `Resolve(alias)` from the cache when it can and
//! falls back to the identity store, repopulating the cache on a live hit.
//!
//! ```rust
//! use std::sync::Arc;
//! use minilink_cache::MokaAliasCache;
//! use minilink_core::{Resolution, Resolver, Shortener};
//! use minilink_redirector::ResolverService;
//! use minilink_shortener::ShortenerService;
//! use minilink_storage::InMemoryIdentityStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(InMemoryIdentityStore::new());
//! let cache = Arc::new(MokaAliasCache::new());
//!
//! let shortener = ShortenerService::new(store.clone(), cache.clone());
//! let resolver = ResolverService::new(store, cache);
//!
//! let alias = shortener.shorten("https://www.example.com/docs", 60).await?;
//! if let Resolution::Found(url) = resolver.resolve(&alias).await? {
//!     println!("Redirect to: {url}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod service;

pub use minilink_core::{Resolution, Resolver};
pub use service::ResolverService;
