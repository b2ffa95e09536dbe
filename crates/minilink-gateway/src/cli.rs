use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

pub const LISTEN_ADDR_ENV: &str = "MINILINK_LISTEN_ADDR";
pub const STORAGE_BACKEND_ENV: &str = "MINILINK_STORAGE_BACKEND";
pub const DATABASE_URL_ENV: &str = "MINILINK_DATABASE_URL";
pub const CACHE_BACKEND_ENV: &str = "MINILINK_CACHE_BACKEND";
pub const REDIS_URL_ENV: &str = "MINILINK_REDIS_URL";
pub const REDIS_KEY_PREFIX_ENV: &str = "MINILINK_REDIS_KEY_PREFIX";
pub const MOKA_CAPACITY_ENV: &str = "MINILINK_MOKA_CAPACITY";
pub const LOG_JSON_ENV: &str = "MINILINK_LOG_JSON";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5000";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://minilink.db";
pub const DEFAULT_REDIS_KEY_PREFIX: &str = minilink_cache::redis::DEFAULT_KEY_PREFIX;
pub const DEFAULT_MOKA_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "sqlite")]
    Sqlite,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Sqlite => write!(f, "sqlite"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackendArg {
    #[value(name = "moka")]
    Moka,
    #[value(name = "redis")]
    Redis,
}

impl Display for CacheBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackendArg::Moka => write!(f, "moka"),
            CacheBackendArg::Redis => write!(f, "redis"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "minilink", version, about = "Identity-backed URL shortener")]
pub struct CLI {
    /// Emit logs as JSON lines instead of human-readable text.
    #[arg(long, env = LOG_JSON_ENV, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP gateway.
    Serve(ServeArgs),
    /// Print every stored mapping as a table.
    Dump(DumpArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = DATABASE_URL_ENV, default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    #[arg(
        long,
        env = CACHE_BACKEND_ENV,
        value_enum,
        default_value_t = CacheBackendArg::Moka
    )]
    pub cache: CacheBackendArg,

    #[arg(long, env = REDIS_URL_ENV, required_if_eq("cache", "redis"))]
    pub redis_url: Option<String>,

    #[arg(long, env = REDIS_KEY_PREFIX_ENV, default_value = DEFAULT_REDIS_KEY_PREFIX)]
    pub redis_key_prefix: String,

    #[arg(long, env = MOKA_CAPACITY_ENV, default_value_t = DEFAULT_MOKA_CAPACITY)]
    pub moka_capacity: u64,
}

#[derive(Debug, Args)]
pub struct DumpArgs {
    #[arg(long, env = DATABASE_URL_ENV, default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,
}
