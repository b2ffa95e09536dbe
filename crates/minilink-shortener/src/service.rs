use async_trait::async_trait;
use minilink_core::{
    normalize, Alias, AliasCache, Clock, IdentityStore, KeyedMutex, NormalizedUrl, Reservation,
    Result, Shortener, SystemClock,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// A concrete implementation of the [`Shortener`] trait.
///
/// Aliases are derived from the identity the store hands out, so creating an
/// entry is a two-step write (reserve, then assign the alias) that commits only
/// when both steps succeed. While an entry for the same normalized URL is
/// still live its alias is reused. Calls for the same URL are serialized, so
/// concurrent requests converge on a single alias.
pub struct ShortenerService<S, C, K = SystemClock> {
    store: Arc<S>,
    cache: Arc<C>,
    clock: K,
    in_flight: KeyedMutex,
}

impl<S: IdentityStore, C: AliasCache> ShortenerService<S, C> {
    /// Creates a service timed by the system clock.
    pub fn new(store: Arc<S>, cache: Arc<C>) -> Self {
        Self::with_clock(store, cache, SystemClock)
    }
}

impl<S: IdentityStore, C: AliasCache, K: Clock> ShortenerService<S, C, K> {
    pub fn with_clock(store: Arc<S>, cache: Arc<C>, clock: K) -> Self {
        Self {
            store,
            cache,
            clock,
            in_flight: KeyedMutex::new(),
        }
    }

    /// Returns the live alias for `url`, or creates a new entry for it.
    ///
    /// Must run under the `in_flight` lock for `url`.
    async fn issue(&self, url: &NormalizedUrl, ttl_seconds: u64) -> Result<Alias> {
        let now = self.clock.now();

        if let Some(alias) = self
            .store
            .find_live_by_url(url, now)
            .await?
            .and_then(|entry| entry.alias)
        {
            debug!(url = %url, alias = %alias, "Reusing live alias");
            return Ok(alias);
        }

        // Dropping the reservation on any early return rolls the row back.
        let mut reservation = self.store.insert(url, ttl_seconds, now).await?;
        let alias = Alias::from_id(reservation.id());
        reservation.assign_alias(&alias).await?;
        let entry = reservation.commit().await?;

        self.cache
            .set(&alias, url, Duration::from_secs(ttl_seconds))
            .await?;

        info!(id = entry.id, alias = %alias, url = %url, ttl_seconds, "Issued alias");
        Ok(alias)
    }
}

#[async_trait]
impl<S: IdentityStore, C: AliasCache, K: Clock> Shortener for ShortenerService<S, C, K> {
    async fn shorten(&self, long_url: &str, ttl_seconds: u64) -> Result<Alias> {
        let url = normalize(long_url).inspect_err(|e| debug!(error = %e, "Rejected url"))?;

        let _guard = self.in_flight.lock(url.as_str()).await;
        self.issue(&url, ttl_seconds)
            .await
            .inspect_err(|e| error!(url = %url, error = %e, "Failed to shorten url"))
    }
}
