use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use classroom_server::config::AppConfig;
use classroom_server::realtime::RealtimeHub;
use classroom_server::state::AppState;
use classroom_server::{build_router, database, seed};
use common::storage::filesystem::FilesystemObjectStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,classroom_server=debug")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = database::init_db(&config.database)
        .await
        .context("Failed to connect to database")?;
    seed::ensure_indexes(&db)
        .await
        .context("Failed to create indexes")?;

    let objects = FilesystemObjectStore::new(
        config.storage.data_dir.clone(),
        config.storage.max_object_size,
    )
    .await
    .context("Failed to initialize object storage")?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        db,
        realtime: RealtimeHub::new(config.realtime.channel_capacity),
        objects: Arc::new(objects),
        config,
    };

    let app = build_router(state);

    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
