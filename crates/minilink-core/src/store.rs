use crate::alias::Alias;
use crate::error::StorageError;
use crate::normalize::NormalizedUrl;
use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

/// Result type for identity store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// One shortened URL as recorded by the identity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlEntry {
    /// Identity allocated by the store, strictly increasing in creation order.
    pub id: u64,
    /// The normalized URL this entry points to.
    pub long_url: NormalizedUrl,
    /// Alias derived from `id`; `None` only while the entry is being created.
    pub alias: Option<Alias>,
    /// When the entry was inserted.
    pub created_at: Timestamp,
    /// Seconds the mapping stays valid after `created_at`.
    pub ttl_seconds: u64,
}

impl UrlEntry {
    /// The last instant at which the entry is still live.
    ///
    /// Returns `None` when the deadline lies beyond the representable time
    /// range, in which case the entry never expires.
    pub fn expires_at(&self) -> Option<Timestamp> {
        let ttl = i64::try_from(self.ttl_seconds).ok()?;
        let ttl = SignedDuration::from_secs(ttl);
        self.created_at.checked_add(ttl).ok()
    }

    /// Whether the entry is live at `now`, i.e. `now <= created_at + ttl`.
    pub fn is_live_at(&self, now: Timestamp) -> bool {
        self.expires_at().is_none_or(|deadline| now <= deadline)
    }
}

/// Durable record store that hands out identities for shortened URLs.
///
/// Creating an entry is a two-step transaction: [`IdentityStore::insert`]
/// allocates the identity and returns a [`Reservation`], the caller derives the
/// alias from that identity and assigns it, then commits. Nothing is visible to
/// the lookup methods until the commit succeeds.
#[async_trait]
pub trait IdentityStore: Send + Sync + 'static {
    type Reservation: Reservation;

    /// Returns the most recently created entry for `long_url` if it is still
    /// live at `now`. Ties on `created_at` go to the highest identity.
    async fn find_live_by_url(
        &self,
        long_url: &NormalizedUrl,
        now: Timestamp,
    ) -> Result<Option<UrlEntry>>;

    /// Allocates the next identity for a new entry created at `created_at`.
    async fn insert(
        &self,
        long_url: &NormalizedUrl,
        ttl_seconds: u64,
        created_at: Timestamp,
    ) -> Result<Self::Reservation>;

    /// Looks up an entry by alias regardless of liveness.
    async fn find_by_alias(&self, alias: &Alias) -> Result<Option<UrlEntry>>;

    /// Returns every committed entry ordered by identity.
    async fn entries(&self) -> Result<Vec<UrlEntry>>;
}

/// An entry whose identity is allocated but which is not yet visible.
///
/// Dropping a reservation without committing rolls the entry back.
#[async_trait]
pub trait Reservation: Send + 'static {
    /// The identity allocated for this entry.
    fn id(&self) -> u64;

    /// Records the alias for this entry.
    ///
    /// Assigning the same alias twice is a no-op; assigning a different one
    /// fails with [`StorageError::Conflict`].
    async fn assign_alias(&mut self, alias: &Alias) -> Result<()>;

    /// Makes the entry visible. Fails if no alias was assigned.
    async fn commit(self) -> Result<UrlEntry>;
}
