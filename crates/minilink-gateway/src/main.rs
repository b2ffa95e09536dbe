use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use minilink_cache::{MokaAliasCache, MokaCacheConfig, RedisAliasCache};
use minilink_core::IdentityStore;
use minilink_gateway::cli::{CacheBackendArg, Command, DumpArgs, ServeArgs, StorageBackendArg, CLI};
use minilink_gateway::{dump, logging, App, AppState};
use minilink_storage::{InMemoryIdentityStore, SqliteIdentityStore};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    logging::init(config.log_json)?;

    match config.command {
        Command::Serve(args) => run_serve(args).await,
        Command::Dump(args) => run_dump(args).await,
    }
}

async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    info!(
        listen_addr = %args.listen_addr,
        storage_backend = %args.storage,
        cache_backend = %args.cache,
        "starting minilink gateway"
    );

    let state = match args.storage {
        StorageBackendArg::InMemory => {
            with_cache(Arc::new(InMemoryIdentityStore::new()), &args).await?
        }
        StorageBackendArg::Sqlite => {
            let store = open_sqlite(&args.database_url).await?;
            with_cache(Arc::new(store), &args).await?
        }
    };

    let listener = tokio::net::TcpListener::bind(args.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", args.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "gateway listening");

    axum::serve(listener, App::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn with_cache<S: IdentityStore>(store: Arc<S>, args: &ServeArgs) -> anyhow::Result<AppState> {
    match args.cache {
        CacheBackendArg::Moka => {
            let config = MokaCacheConfig::builder()
                .max_capacity(args.moka_capacity)
                .build();
            Ok(AppState::from_backends(
                store,
                Arc::new(MokaAliasCache::from(config)),
            ))
        }
        CacheBackendArg::Redis => {
            let redis_url = args
                .redis_url
                .as_deref()
                .context("redis url is required when cache backend is redis")?;
            let cache = RedisAliasCache::connect(redis_url, args.redis_key_prefix.clone())
                .await
                .context("failed to connect to redis")?;
            Ok(AppState::from_backends(store, Arc::new(cache)))
        }
    }
}

async fn open_sqlite(database_url: &str) -> anyhow::Result<SqliteIdentityStore> {
    let store = SqliteIdentityStore::connect(database_url)
        .await
        .with_context(|| format!("failed to open {database_url}"))?;
    store.migrate().await?;
    Ok(store)
}

async fn run_dump(args: DumpArgs) -> anyhow::Result<()> {
    let store = open_sqlite(&args.database_url).await?;
    let entries = store.entries().await?;
    print!("{}", dump::render(&entries));
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
    info!("shutting down");
}
