//! Alias cache implementations for minilink.

pub mod moka;
pub mod redis;

pub use self::moka::{MokaAliasCache, MokaCacheConfig};
pub use self::redis::RedisAliasCache;
pub use minilink_core::cache::{AliasCache, Result};
pub use minilink_core::CacheError;
