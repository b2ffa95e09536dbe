use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use jiff::{SignedDuration, Timestamp};
use minilink_core::{Alias, NormalizedUrl};
use minilink_storage::{IdentityStore, Reservation, SqliteIdentityStore, StorageError, UrlEntry};

static NEXT_DB: AtomicUsize = AtomicUsize::new(0);

struct Fixture {
    path: PathBuf,
    store: SqliteIdentityStore,
}

impl Fixture {
    async fn start() -> Self {
        let path = std::env::temp_dir().join(format!(
            "minilink-store-{}-{}.db",
            std::process::id(),
            NEXT_DB.fetch_add(1, Ordering::SeqCst)
        ));
        let store = SqliteIdentityStore::connect(&Self::url_for(&path))
            .await
            .expect("open sqlite");
        store.migrate().await.expect("apply migrations");

        Self { path, store }
    }

    fn url_for(path: &PathBuf) -> String {
        format!("sqlite://{}", path.display())
    }

    async fn reopen(&self) -> SqliteIdentityStore {
        let store = SqliteIdentityStore::connect(&Self::url_for(&self.path))
            .await
            .expect("reopen sqlite");
        store.migrate().await.expect("migrations are idempotent");
        store
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm", "-journal"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", self.path.display()));
        }
    }
}

fn url(value: &str) -> NormalizedUrl {
    NormalizedUrl::new_unchecked(value)
}

fn t(second: i64) -> Timestamp {
    Timestamp::from_second(1_700_000_000 + second).unwrap()
}

async fn create(store: &SqliteIdentityStore, long_url: &str, ttl: u64, at: Timestamp) -> UrlEntry {
    let mut reservation = store.insert(&url(long_url), ttl, at).await.unwrap();
    let alias = Alias::from_id(reservation.id());
    reservation.assign_alias(&alias).await.unwrap();
    reservation.commit().await.unwrap()
}

#[tokio::test]
async fn insert_assign_commit_and_find_by_alias() {
    let fixture = Fixture::start().await;

    let entry = create(&fixture.store, "http://a.com/x", 60, t(0)).await;
    assert_eq!(entry.id, 1);
    assert_eq!(entry.alias, Some(Alias::from_id(1)));

    let found = fixture
        .store
        .find_by_alias(&Alias::from_id(1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found, entry);
}

#[tokio::test]
async fn find_by_alias_returns_none_for_unknown_alias() {
    let fixture = Fixture::start().await;

    let found = fixture
        .store
        .find_by_alias(&Alias::new_unchecked("Z"))
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn created_at_round_trips_with_millisecond_precision() {
    let fixture = Fixture::start().await;
    let created_at = t(0) + SignedDuration::from_millis(250);

    let entry = create(&fixture.store, "http://a.com", 60, created_at).await;
    let found = fixture
        .store
        .find_by_alias(entry.alias.as_ref().unwrap())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.created_at, created_at);
}

#[tokio::test]
async fn find_live_by_url_respects_the_window() {
    let fixture = Fixture::start().await;
    let entry = create(&fixture.store, "http://a.com/x", 60, t(0)).await;

    let live = fixture
        .store
        .find_live_by_url(&url("http://a.com/x"), t(60))
        .await
        .unwrap();
    assert_eq!(live, Some(entry));

    let expired = fixture
        .store
        .find_live_by_url(&url("http://a.com/x"), t(61))
        .await
        .unwrap();
    assert!(expired.is_none());
}

#[tokio::test]
async fn find_live_by_url_prefers_latest_then_highest_id() {
    let fixture = Fixture::start().await;
    create(&fixture.store, "http://a.com", 60, t(0)).await;
    create(&fixture.store, "http://a.com", 60, t(10)).await;
    let tie = create(&fixture.store, "http://a.com", 60, t(10)).await;

    let found = fixture
        .store
        .find_live_by_url(&url("http://a.com"), t(20))
        .await
        .unwrap();
    assert_eq!(found.map(|e| e.id), Some(tie.id));
}

#[tokio::test]
async fn uncommitted_entry_is_invisible() {
    let fixture = Fixture::start().await;

    let mut reservation = fixture.store.insert(&url("http://a.com"), 60, t(0)).await.unwrap();
    let alias = Alias::from_id(reservation.id());
    reservation.assign_alias(&alias).await.unwrap();

    assert!(fixture.store.find_by_alias(&alias).await.unwrap().is_none());
    assert!(fixture.store.entries().await.unwrap().is_empty());

    reservation.commit().await.unwrap();
    assert!(fixture.store.find_by_alias(&alias).await.unwrap().is_some());
}

#[tokio::test]
async fn dropped_reservation_rolls_back() {
    let fixture = Fixture::start().await;

    let mut reservation = fixture.store.insert(&url("http://a.com"), 60, t(0)).await.unwrap();
    let alias = Alias::from_id(reservation.id());
    reservation.assign_alias(&alias).await.unwrap();
    drop(reservation);

    assert!(fixture.store.entries().await.unwrap().is_empty());

    // The store stays writable after the rollback.
    let entry = create(&fixture.store, "http://a.com", 60, t(1)).await;
    assert_eq!(fixture.store.entries().await.unwrap(), vec![entry]);
}

#[tokio::test]
async fn commit_without_alias_is_rejected() {
    let fixture = Fixture::start().await;

    let reservation = fixture.store.insert(&url("http://a.com"), 60, t(0)).await.unwrap();
    let err = reservation.commit().await.unwrap_err();

    assert!(matches!(err, StorageError::InvalidData(_)));
    assert!(fixture.store.entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn assigning_a_taken_alias_conflicts() {
    let fixture = Fixture::start().await;
    create(&fixture.store, "http://a.com", 60, t(0)).await;

    let mut reservation = fixture.store.insert(&url("http://b.com"), 60, t(0)).await.unwrap();
    let err = reservation
        .assign_alias(&Alias::from_id(1))
        .await
        .unwrap_err();

    assert!(matches!(err, StorageError::Conflict(_)));
}

#[tokio::test]
async fn assign_alias_is_idempotent_for_the_same_value() {
    let fixture = Fixture::start().await;

    let mut reservation = fixture.store.insert(&url("http://a.com"), 60, t(0)).await.unwrap();
    let alias = Alias::from_id(reservation.id());
    reservation.assign_alias(&alias).await.unwrap();
    reservation.assign_alias(&alias).await.unwrap();

    let err = reservation
        .assign_alias(&Alias::new_unchecked("other"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict(_)));
}

#[tokio::test]
async fn entries_survive_reconnect_in_identity_order() {
    let fixture = Fixture::start().await;
    let first = create(&fixture.store, "http://a.com", 1, t(0)).await;
    let second = create(&fixture.store, "http://a.com", 60, t(5)).await;

    let reopened = fixture.reopen().await;
    assert_eq!(reopened.entries().await.unwrap(), vec![first, second]);
}
