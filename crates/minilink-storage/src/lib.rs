//! Identity store backends for minilink.

pub mod memory;
pub mod sqlite;

pub use memory::{InMemoryIdentityStore, InMemoryReservation};
pub use minilink_core::store::{IdentityStore, Reservation, Result, UrlEntry};
pub use minilink_core::StorageError;
pub use sqlite::{SqliteIdentityStore, SqliteReservation};
