use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, StoreKind};
use crate::routes;
use crate::store::{MemoryStore, SharedStore, SqliteStore};
use crate::Result;

/// Runs the service described by `config` until Ctrl-C is received.
pub async fn run(config: Config) -> Result<()> {
    init_tracing();

    let store = open_store(&config).await?;
    let listener = TcpListener::bind(config.listen).await?;

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl-C, shutting down");
            }
            shutdown.cancel();
        }
    });

    serve(listener, store, shutdown).await
}

/// Serves the students API on an already bound listener until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    store: SharedStore,
    shutdown: CancellationToken,
) -> Result<()> {
    info!("Students server listening on {}", listener.local_addr()?);

    axum::serve(listener, routes::router(store))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("Server stopped");
    Ok(())
}

#[instrument(skip(config), fields(store = %config.store))]
pub async fn open_store(config: &Config) -> Result<SharedStore> {
    let store: SharedStore = match config.store {
        StoreKind::Memory => Arc::new(MemoryStore::new()),
        StoreKind::Sqlite => Arc::new(SqliteStore::connect(&config.database_url).await?),
    };

    info!("Opened {} store", config.store);
    Ok(store)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));
}
