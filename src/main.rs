mod ballot;
mod config;
mod entities;
mod http;
mod models;
mod roster;
mod state;
mod store;
mod tally;

use std::sync::Arc;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::state::{ApiCache, AppState};
use crate::store::{DatabaseStore, MemoryStore, VoteStore};
use anyhow::{Context, Result};
use axum::Router;
use migration::MigratorTrait;
use sea_orm::ConnectOptions;
use sea_orm::Database;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let config = ApiConfig::load().context("Failed to load configuration")?;
    let store = open_store(&config).await?;

    if store
        .seed_roster(&config.roster)
        .await
        .context("Failed to seed roster")?
    {
        info!("Roster loaded from configuration");
    }

    let cache = Arc::new(ApiCache::new(&config.cache));
    let app_state = AppState::new(store, cache, config.voting);

    let listener = TcpListener::bind(config.server.address())
        .await
        .context("Failed to bind HTTP listener")?;
    let local_addr = listener
        .local_addr()
        .context("Failed to obtain listener address")?;
    info!("Classroom vote API listening on {local_addr}");

    let router: Router = http::router(app_state);
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server exited with error")?;

    Ok(())
}

fn init_tracing() {
    let default_filter = "info";
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string());
    assert!(!filter.is_empty(), "Tracing filter must not be empty");
    assert!(filter.len() < 256, "Tracing filter length exceeds bounds");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .compact()
        .init();
}

async fn open_store(config: &ApiConfig) -> Result<Arc<dyn VoteStore>> {
    if config.database.is_memory() {
        warn!("Using in-memory vote store, votes are lost on restart");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let database = connect_database(config).await?;
    run_migrations(&database).await?;
    Ok(Arc::new(DatabaseStore::new(database)))
}

async fn connect_database(config: &ApiConfig) -> Result<sea_orm::DatabaseConnection> {
    let mut options = ConnectOptions::new(config.database.url.clone());
    options
        .max_connections(config.database.max_connections)
        .sqlx_logging(true)
        .sqlx_logging_level(tracing::log::LevelFilter::Debug)
        .acquire_timeout(Duration::from_secs(10));

    if let Some(min) = config.database.min_connections {
        options.min_connections(min);
    }

    Database::connect(options)
        .await
        .context("Failed to connect to PostgreSQL")
}

async fn run_migrations(database: &sea_orm::DatabaseConnection) -> Result<()> {
    migration::Migrator::up(database, None)
        .await
        .context("Database migrations failed")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {err}");
        return;
    }
    info!("Shutdown signal received");
}
