use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jiff::Timestamp;
use minilink_core::store::{IdentityStore, Reservation, Result, UrlEntry};
use minilink_core::{Alias, NormalizedUrl, StorageError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct Inner {
    next_id: AtomicU64,
    rows: DashMap<u64, UrlEntry>,
    by_alias: DashMap<Alias, u64>,
    /// Most recent entry per URL by `(created_at, id)`.
    latest_by_url: DashMap<NormalizedUrl, u64>,
}

impl Inner {
    fn is_newer(&self, candidate: &UrlEntry, current_id: u64) -> bool {
        match self.rows.get(&current_id) {
            Some(current) => (candidate.created_at, candidate.id) > (current.created_at, current.id),
            None => true,
        }
    }
}

/// In-memory identity store backed by DashMap.
///
/// Identities come from an atomic counter starting at 1, so concurrent
/// inserts never share one. A rolled-back reservation leaves a gap in the
/// sequence, like an auto-increment column would.
#[derive(Debug, Clone)]
pub struct InMemoryIdentityStore {
    inner: Arc<Inner>,
}

impl InMemoryIdentityStore {
    /// Creates a new in-memory store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                next_id: AtomicU64::new(1),
                rows: DashMap::new(),
                by_alias: DashMap::new(),
                latest_by_url: DashMap::new(),
            }),
        }
    }

    /// Number of committed entries.
    pub fn len(&self) -> usize {
        self.inner.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.rows.is_empty()
    }
}

impl Default for InMemoryIdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    type Reservation = InMemoryReservation;

    async fn find_live_by_url(
        &self,
        long_url: &NormalizedUrl,
        now: Timestamp,
    ) -> Result<Option<UrlEntry>> {
        let Some(id) = self.inner.latest_by_url.get(long_url).map(|id| *id) else {
            return Ok(None);
        };

        let latest = self.inner.rows.get(&id).map(|entry| entry.clone());
        Ok(latest.filter(|entry| entry.is_live_at(now)))
    }

    async fn insert(
        &self,
        long_url: &NormalizedUrl,
        ttl_seconds: u64,
        created_at: Timestamp,
    ) -> Result<InMemoryReservation> {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);

        Ok(InMemoryReservation {
            inner: Arc::clone(&self.inner),
            entry: UrlEntry {
                id,
                long_url: long_url.clone(),
                alias: None,
                created_at,
                ttl_seconds,
            },
        })
    }

    async fn find_by_alias(&self, alias: &Alias) -> Result<Option<UrlEntry>> {
        let Some(id) = self.inner.by_alias.get(alias).map(|id| *id) else {
            return Ok(None);
        };

        Ok(self.inner.rows.get(&id).map(|entry| entry.clone()))
    }

    async fn entries(&self) -> Result<Vec<UrlEntry>> {
        let mut entries: Vec<UrlEntry> = self
            .inner
            .rows
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        entries.sort_by_key(|entry| entry.id);
        Ok(entries)
    }
}

/// Pending entry of an [`InMemoryIdentityStore`].
///
/// Nothing is written to the store until [`Reservation::commit`], so dropping
/// the reservation is all a rollback takes.
#[derive(Debug)]
pub struct InMemoryReservation {
    inner: Arc<Inner>,
    entry: UrlEntry,
}

#[async_trait]
impl Reservation for InMemoryReservation {
    fn id(&self) -> u64 {
        self.entry.id
    }

    async fn assign_alias(&mut self, alias: &Alias) -> Result<()> {
        match &self.entry.alias {
            Some(existing) if existing != alias => Err(StorageError::Conflict(format!(
                "entry {} already has alias '{}'",
                self.entry.id, existing
            ))),
            _ => {
                self.entry.alias = Some(alias.clone());
                Ok(())
            }
        }
    }

    async fn commit(self) -> Result<UrlEntry> {
        let Self { inner, entry } = self;

        let Some(alias) = entry.alias.clone() else {
            return Err(StorageError::InvalidData(format!(
                "entry {} has no alias assigned",
                entry.id
            )));
        };

        inner.rows.insert(entry.id, entry.clone());

        match inner.by_alias.entry(alias.clone()) {
            Entry::Occupied(taken) if *taken.get() != entry.id => {
                drop(taken);
                inner.rows.remove(&entry.id);
                return Err(StorageError::Conflict(alias.to_string()));
            }
            Entry::Occupied(_) => {}
            Entry::Vacant(slot) => {
                slot.insert(entry.id);
            }
        }

        match inner.latest_by_url.entry(entry.long_url.clone()) {
            Entry::Occupied(mut latest) => {
                if inner.is_newer(&entry, *latest.get()) {
                    latest.insert(entry.id);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(entry.id);
            }
        }

        Ok(entry)
    }
}
