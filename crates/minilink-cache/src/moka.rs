use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use minilink_core::cache::{AliasCache, Result};
use minilink_core::{Alias, Clock, NormalizedUrl, SystemClock};
use moka::future::Cache;
use moka::Expiry;
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

const DEFAULT_MAX_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone)]
struct CachedUrl {
    url: NormalizedUrl,
    ttl: Duration,
    /// Deadline on the cache's clock. `None` when it does not fit a timestamp.
    expires_at: Option<Timestamp>,
}

impl CachedUrl {
    fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

/// Evicts each entry after its own TTL, restarted on every write.
struct PerEntryTtl;

impl Expiry<String, CachedUrl> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedUrl,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedUrl,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// An in-process [`AliasCache`] backed by Moka.
///
/// Every entry carries the TTL it was written with. Moka evicts it after that
/// long in real time, and reads additionally compare the entry's deadline
/// against the injected [`Clock`], so a simulated clock expires entries too.
#[derive(Clone)]
pub struct MokaAliasCache<K: Clock = SystemClock> {
    cache: Cache<String, CachedUrl>,
    clock: K,
}

impl<K: Clock + std::fmt::Debug> std::fmt::Debug for MokaAliasCache<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaAliasCache")
            .field("entry_count", &self.cache.entry_count())
            .field("clock", &self.clock)
            .finish()
    }
}

impl MokaAliasCache {
    /// Creates a cache holding at most 10,000 entries, timed by the system clock.
    pub fn new() -> Self {
        Self::from(MokaCacheConfig::default())
    }

    /// Creates a cache holding at most `max_capacity` entries.
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self::from(MokaCacheConfig::builder().max_capacity(max_capacity).build())
    }

    /// Returns a builder for a custom cache configuration.
    pub fn builder() -> MokaCacheConfigBuilder {
        MokaCacheConfig::builder()
    }
}

impl Default for MokaAliasCache {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clock> MokaAliasCache<K> {
    /// Creates a cache from `config` whose logical expiry follows `clock`.
    pub fn with_clock(config: MokaCacheConfig, clock: K) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { cache, clock }
    }

    /// Number of entries currently held, including ones pending eviction.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl<K: Clock> AliasCache for MokaAliasCache<K> {
    async fn get(&self, alias: &Alias) -> Result<Option<NormalizedUrl>> {
        trace!(alias = %alias, "Fetching URL from Moka cache");

        let Some(cached) = self.cache.get(alias.as_str()).await else {
            trace!(alias = %alias, "Cache miss in Moka");
            return Ok(None);
        };

        if cached.is_expired_at(self.clock.now()) {
            debug!(alias = %alias, "Cached URL expired");
            self.cache.invalidate(alias.as_str()).await;
            return Ok(None);
        }

        debug!(alias = %alias, "Cache hit in Moka");
        Ok(Some(cached.url))
    }

    async fn set(&self, alias: &Alias, url: &NormalizedUrl, ttl: Duration) -> Result<()> {
        if ttl.is_zero() {
            trace!(alias = %alias, "Zero TTL, dropping cached URL instead");
            return self.del(alias).await;
        }

        let expires_at = SignedDuration::try_from(ttl)
            .ok()
            .and_then(|ttl| self.clock.now().checked_add(ttl).ok());

        self.cache
            .insert(
                alias.as_str().to_owned(),
                CachedUrl {
                    url: url.clone(),
                    ttl,
                    expires_at,
                },
            )
            .await;
        debug!(alias = %alias, ttl_secs = ttl.as_secs(), "Cached URL in Moka");
        Ok(())
    }

    async fn del(&self, alias: &Alias) -> Result<()> {
        self.cache.invalidate(alias.as_str()).await;
        debug!(alias = %alias, "Removed URL from Moka cache (if present)");
        Ok(())
    }
}

/// Configuration for a [`MokaAliasCache`].
#[derive(Debug, Clone, TypedBuilder)]
pub struct MokaCacheConfig {
    /// Maximum number of entries the cache can hold.
    #[builder(default = DEFAULT_MAX_CAPACITY)]
    pub max_capacity: u64,
}

impl Default for MokaCacheConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl From<MokaCacheConfig> for MokaAliasCache {
    fn from(config: MokaCacheConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}
