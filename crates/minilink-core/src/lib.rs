//! Core types and traits for the minilink URL shortener.
//!
//! This crate provides the alias codec, the URL normalizer and the storage,
//! cache and service contracts shared by the shortener and the redirector.

pub mod alias;
pub mod cache;
pub mod clock;
pub mod error;
pub mod keyed_lock;
pub mod normalize;
pub mod shortener;
pub mod store;

pub use alias::Alias;
pub use cache::AliasCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CacheError, CoreError, Result, StorageError};
pub use keyed_lock::KeyedMutex;
pub use normalize::{normalize, NormalizedUrl};
pub use shortener::{Resolution, Resolver, Shortener};
pub use store::{IdentityStore, Reservation, UrlEntry};
