use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use minilink_core::{
    Alias, AliasCache, Clock, IdentityStore, Resolution, Resolver, Result, SystemClock,
};
use tracing::{debug, error, trace};

/// Service for resolving aliases back to their URLs.
///
/// Cache hits are returned as-is. On a miss the store decides, and a live
/// entry is written back to the cache with the TTL it was created with.
pub struct ResolverService<S, C, K = SystemClock> {
    store: Arc<S>,
    cache: Arc<C>,
    clock: K,
}

impl<S: IdentityStore, C: AliasCache> ResolverService<S, C> {
    /// Creates a new `ResolverService` timed by the system clock.
    pub fn new(store: Arc<S>, cache: Arc<C>) -> Self {
        Self::with_clock(store, cache, SystemClock)
    }
}

impl<S: IdentityStore, C: AliasCache, K: Clock> ResolverService<S, C, K> {
    pub fn with_clock(store: Arc<S>, cache: Arc<C>, clock: K) -> Self {
        Self {
            store,
            cache,
            clock,
        }
    }

    async fn lookup(&self, alias: &Alias) -> Result<Resolution> {
        if let Some(url) = self.cache.get(alias).await? {
            debug!(alias = %alias, url = %url, "Resolved from cache");
            return Ok(Resolution::Found(url));
        }

        let Some(entry) = self.store.find_by_alias(alias).await? else {
            trace!(alias = %alias, "Alias not found");
            return Ok(Resolution::NotFound);
        };

        if !entry.is_live_at(self.clock.now()) {
            debug!(alias = %alias, id = entry.id, "Alias has expired");
            return Ok(Resolution::Expired);
        }

        self.cache
            .set(alias, &entry.long_url, Duration::from_secs(entry.ttl_seconds))
            .await?;
        debug!(alias = %alias, url = %entry.long_url, "Resolved from store");
        Ok(Resolution::Found(entry.long_url))
    }
}

#[async_trait]
impl<S: IdentityStore, C: AliasCache, K: Clock> Resolver for ResolverService<S, C, K> {
    async fn resolve(&self, alias: &Alias) -> Result<Resolution> {
        trace!(alias = %alias, "Resolving alias");
        self.lookup(alias)
            .await
            .inspect_err(|e| error!(alias = %alias, error = %e, "Failed to resolve alias"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::{SignedDuration, Timestamp};
    use minilink_cache::{MokaAliasCache, MokaCacheConfig};
    use minilink_core::{CacheError, CoreError, ManualClock, NormalizedUrl, Reservation};
    use minilink_storage::InMemoryIdentityStore;

    struct Harness {
        resolver: ResolverService<InMemoryIdentityStore, MokaAliasCache<ManualClock>, ManualClock>,
        store: Arc<InMemoryIdentityStore>,
        cache: Arc<MokaAliasCache<ManualClock>>,
        clock: ManualClock,
    }

    fn t0() -> Timestamp {
        Timestamp::from_second(1_700_000_000).unwrap()
    }

    fn harness() -> Harness {
        let clock = ManualClock::new(t0());
        let store = Arc::new(InMemoryIdentityStore::new());
        let cache = Arc::new(MokaAliasCache::with_clock(
            MokaCacheConfig::default(),
            clock.clone(),
        ));
        let resolver = ResolverService::with_clock(store.clone(), cache.clone(), clock.clone());
        Harness {
            resolver,
            store,
            cache,
            clock,
        }
    }

    fn url(s: &str) -> NormalizedUrl {
        NormalizedUrl::new_unchecked(s)
    }

    /// Writes an entry straight into the store, bypassing the cache.
    async fn seed(store: &InMemoryIdentityStore, long_url: &str, ttl_seconds: u64) -> Alias {
        let mut reservation = store.insert(&url(long_url), ttl_seconds, t0()).await.unwrap();
        let alias = Alias::from_id(reservation.id());
        reservation.assign_alias(&alias).await.unwrap();
        reservation.commit().await.unwrap();
        alias
    }

    #[tokio::test]
    async fn unknown_alias_is_not_found() {
        let h = harness();

        let resolution = h.resolver.resolve(&Alias::new_unchecked("zzz")).await.unwrap();

        assert_eq!(resolution, Resolution::NotFound);
    }

    #[tokio::test]
    async fn cache_hit_skips_the_store() {
        let h = harness();
        let alias = Alias::new_unchecked("cached");
        h.cache
            .set(&alias, &url("http://a.com"), Duration::from_secs(60))
            .await
            .unwrap();

        let resolution = h.resolver.resolve(&alias).await.unwrap();

        assert_eq!(resolution, Resolution::Found(url("http://a.com")));
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn cache_miss_repopulates_with_original_ttl() {
        let h = harness();
        let alias = seed(&h.store, "http://a.com/x", 60).await;

        h.clock.advance(SignedDuration::from_secs(30));
        assert_eq!(
            h.resolver.resolve(&alias).await.unwrap(),
            Resolution::Found(url("http://a.com/x"))
        );
        assert_eq!(h.cache.get(&alias).await.unwrap(), Some(url("http://a.com/x")));

        // The entry died at t0+60, but the cache was refilled at t0+30 for 60s.
        h.clock.advance(SignedDuration::from_secs(59));
        assert!(h.cache.get(&alias).await.unwrap().is_some());
        h.clock.advance(SignedDuration::from_secs(1));
        assert!(h.cache.get(&alias).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn live_through_the_last_second() {
        let h = harness();
        let alias = seed(&h.store, "http://a.com/x", 60).await;

        h.clock.advance(SignedDuration::from_secs(60));

        assert_eq!(
            h.resolver.resolve(&alias).await.unwrap(),
            Resolution::Found(url("http://a.com/x"))
        );
    }

    #[tokio::test]
    async fn expired_entry_is_reported_and_not_cached() {
        let h = harness();
        let alias = seed(&h.store, "http://a.com/x", 60).await;

        h.clock.advance(SignedDuration::from_secs(61));

        assert_eq!(h.resolver.resolve(&alias).await.unwrap(), Resolution::Expired);
        assert!(h.cache.get(&alias).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn zero_ttl_entry_expires_right_after_creation() {
        let h = harness();
        let alias = seed(&h.store, "http://a.com/x", 0).await;

        assert_eq!(
            h.resolver.resolve(&alias).await.unwrap(),
            Resolution::Found(url("http://a.com/x"))
        );
        assert!(h.cache.get(&alias).await.unwrap().is_none());

        h.clock.advance(SignedDuration::from_secs(1));
        assert_eq!(h.resolver.resolve(&alias).await.unwrap(), Resolution::Expired);
    }

    struct DownCache;

    #[async_trait]
    impl AliasCache for DownCache {
        async fn get(
            &self,
            _alias: &Alias,
        ) -> std::result::Result<Option<NormalizedUrl>, CacheError> {
            Err(CacheError::Timeout("read timed out".to_string()))
        }

        async fn set(
            &self,
            _alias: &Alias,
            _url: &NormalizedUrl,
            _ttl: Duration,
        ) -> std::result::Result<(), CacheError> {
            Err(CacheError::Timeout("write timed out".to_string()))
        }

        async fn del(&self, _alias: &Alias) -> std::result::Result<(), CacheError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn cache_failure_propagates_as_internal() {
        let store = Arc::new(InMemoryIdentityStore::new());
        let alias = seed(&store, "http://a.com", 60).await;
        let resolver = ResolverService::new(store, Arc::new(DownCache));

        let err = resolver.resolve(&alias).await.unwrap_err();

        assert!(matches!(err, CoreError::Cache(CacheError::Timeout(_))));
        assert!(err.is_internal());
    }
}
