//! URL shortening service.
//!
//! [`ShortenerService`] turns long URLs into aliases on top of an
//! [`IdentityStore`](minilink_core::IdentityStore) and an
//! [`AliasCache`](minilink_core::AliasCache). Core types are re-exported from
//! `minilink_core`.

pub mod service;

pub use minilink_core::{Alias, CoreError, Result, Shortener};
pub use service::ShortenerService;
