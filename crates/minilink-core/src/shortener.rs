use crate::alias::Alias;
use crate::error::Result;
use crate::normalize::NormalizedUrl;
use async_trait::async_trait;

/// Outcome of resolving an alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The alias maps to this URL.
    Found(NormalizedUrl),
    /// No entry was ever issued under the alias.
    NotFound,
    /// The alias existed but its liveness window has elapsed.
    Expired,
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Issues an alias for `long_url`, valid for `ttl_seconds`.
    ///
    /// While a previous alias for the same normalized URL is live, that alias
    /// is returned instead of allocating a new one.
    async fn shorten(&self, long_url: &str, ttl_seconds: u64) -> Result<Alias>;
}

#[async_trait]
pub trait Resolver: Send + Sync + 'static {
    /// Resolves an alias to the URL it was issued for.
    async fn resolve(&self, alias: &Alias) -> Result<Resolution>;
}
