use async_trait::async_trait;
use jiff::Timestamp;
use minilink_core::store::{IdentityStore, Reservation, Result, UrlEntry};
use minilink_core::{Alias, NormalizedUrl, StorageError};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use std::str::FromStr;
use tracing::{debug, trace};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite implementation of the identity store, over the `url_mapping` table.
///
/// Identities come from an `AUTOINCREMENT` primary key, so they are strictly
/// increasing and a committed identity is never handed out again. Creating an
/// entry runs inside one transaction: the row is inserted when the reservation
/// is made, the alias is written into it, and the transaction commits only
/// once both succeeded.
#[derive(Debug, Clone)]
pub struct SqliteIdentityStore {
    pool: SqlitePool,
}

impl SqliteIdentityStore {
    /// Creates a store from an existing SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a pool for `database_url`, creating the database file if needed.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(map_sqlx_error)?
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Operation(format!("failed to apply migrations: {e}")))
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Configuration(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

fn to_db_ttl(ttl_seconds: u64) -> Result<i64> {
    i64::try_from(ttl_seconds)
        .map_err(|_| StorageError::InvalidData(format!("ttl {ttl_seconds}s is out of range")))
}

fn entry_from_row(row: &SqliteRow) -> Result<UrlEntry> {
    let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
    let long_url: String = row.try_get("long_url").map_err(map_sqlx_error)?;
    let short_url: Option<String> = row.try_get("short_url").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let expires_in: i64 = row.try_get("expires_in").map_err(map_sqlx_error)?;

    let created_at = Timestamp::from_millisecond(created_at).map_err(|e| {
        StorageError::InvalidData(format!("invalid created_at '{created_at}' for id {id}: {e}"))
    })?;

    Ok(UrlEntry {
        id: u64::try_from(id)
            .map_err(|_| StorageError::InvalidData(format!("negative id {id}")))?,
        long_url: NormalizedUrl::new_unchecked(long_url),
        alias: short_url.filter(|s| !s.is_empty()).map(Alias::new_unchecked),
        created_at,
        ttl_seconds: u64::try_from(expires_in).map_err(|_| {
            StorageError::InvalidData(format!("negative expires_in {expires_in} for id {id}"))
        })?,
    })
}

#[async_trait]
impl IdentityStore for SqliteIdentityStore {
    type Reservation = SqliteReservation;

    async fn find_live_by_url(
        &self,
        long_url: &NormalizedUrl,
        now: Timestamp,
    ) -> Result<Option<UrlEntry>> {
        let row = sqlx::query(
            r#"
            SELECT id, long_url, short_url, created_at, expires_in
            FROM url_mapping
            WHERE long_url = ?
              AND short_url IS NOT NULL
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(long_url.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let entry = entry_from_row(&row)?;
        if !entry.is_live_at(now) {
            trace!(id = entry.id, url = %long_url, "Latest entry for url has expired");
            return Ok(None);
        }
        Ok(Some(entry))
    }

    async fn insert(
        &self,
        long_url: &NormalizedUrl,
        ttl_seconds: u64,
        created_at: Timestamp,
    ) -> Result<SqliteReservation> {
        let expires_in = to_db_ttl(ttl_seconds)?;
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let result = sqlx::query(
            r#"
            INSERT INTO url_mapping (long_url, short_url, created_at, expires_in)
            VALUES (?, NULL, ?, ?)
            "#,
        )
        .bind(long_url.as_str())
        .bind(created_at.as_millisecond())
        .bind(expires_in)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let id = u64::try_from(result.last_insert_rowid()).map_err(|_| {
            StorageError::InvalidData(format!(
                "invalid row id {}",
                result.last_insert_rowid()
            ))
        })?;
        debug!(id, url = %long_url, "Reserved identity");

        Ok(SqliteReservation {
            tx,
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
        let row = sqlx::query(
            r#"
            SELECT id, long_url, short_url, created_at, expires_in
            FROM url_mapping
            WHERE short_url = ?
            LIMIT 1
            "#,
        )
        .bind(alias.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(entry_from_row).transpose()
    }

    async fn entries(&self) -> Result<Vec<UrlEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, long_url, short_url, created_at, expires_in
            FROM url_mapping
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(entry_from_row).collect()
    }
}

/// Pending entry of a [`SqliteIdentityStore`], holding its open transaction.
///
/// Dropping the reservation drops the transaction, which rolls the inserted
/// row back.
pub struct SqliteReservation {
    tx: Transaction<'static, Sqlite>,
    entry: UrlEntry,
}

impl std::fmt::Debug for SqliteReservation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteReservation")
            .field("entry", &self.entry)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Reservation for SqliteReservation {
    fn id(&self) -> u64 {
        self.entry.id
    }

    async fn assign_alias(&mut self, alias: &Alias) -> Result<()> {
        let id = i64::try_from(self.entry.id)
            .map_err(|_| StorageError::InvalidData(format!("id {} out of range", self.entry.id)))?;

        let result = sqlx::query(
            r#"
            UPDATE url_mapping
            SET short_url = ?
            WHERE id = ?
              AND (short_url IS NULL OR short_url = ?)
            "#,
        )
        .bind(alias.as_str())
        .bind(id)
        .bind(alias.as_str())
        .execute(&mut *self.tx)
        .await;

        match result {
            Ok(done) if done.rows_affected() > 0 => {
                self.entry.alias = Some(alias.clone());
                Ok(())
            }
            Ok(_) => Err(StorageError::Conflict(format!(
                "entry {} already has a different alias",
                self.entry.id
            ))),
            Err(err) if is_unique_violation(&err) => Err(StorageError::Conflict(alias.to_string())),
            Err(err) => Err(map_sqlx_error(err)),
        }
    }

    async fn commit(self) -> Result<UrlEntry> {
        let Self { tx, entry } = self;

        if entry.alias.is_none() {
            return Err(StorageError::InvalidData(format!(
                "entry {} has no alias assigned",
                entry.id
            )));
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        debug!(id = entry.id, "Committed entry");
        Ok(entry)
    }
}
