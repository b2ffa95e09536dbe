use crate::alias::Alias;
use crate::error::CacheError;
use crate::normalize::NormalizedUrl;
use async_trait::async_trait;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, CacheError>;

/// A TTL-capable cache mapping aliases to normalized URLs.
///
/// The cache is an accelerator in front of the identity store and is never
/// authoritative: entries may vanish at any time, and a hit is only as fresh
/// as the TTL set when the entry was written.
#[async_trait]
pub trait AliasCache: Send + Sync + 'static {
    /// Get the URL cached for `alias`.
    ///
    /// Returns `Ok(None)` on a miss, including entries whose TTL has run out.
    async fn get(&self, alias: &Alias) -> Result<Option<NormalizedUrl>>;

    /// Store `url` under `alias`, replacing any existing value and restarting
    /// the TTL countdown.
    ///
    /// A zero `ttl` removes the key instead, since such an entry would already
    /// be expired.
    async fn set(&self, alias: &Alias, url: &NormalizedUrl, ttl: Duration) -> Result<()>;

    /// Remove the entry for `alias`. It is not an error if the key does not exist.
    async fn del(&self, alias: &Alias) -> Result<()>;
}
