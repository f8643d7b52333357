use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tagvote::{
    api, auth,
    config::AppConfig,
    state::AppState,
    stats_store::{FileStatsStore, MemoryStatsStore, StatsStore},
    store::{CatalogSeed, MemoryStore, SnapshotFile},
};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tagvote=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting tagvote...");

    let config = AppConfig::from_env();
    let auth_config = Arc::new(auth::AuthConfig::from_env());

    let mut snapshot = config.snapshot_path.clone().map(SnapshotFile::new);
    let store = load_store(&config, snapshot.as_mut()).await;
    let stats: Arc<dyn StatsStore> = match &config.stats_dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "Visitor stats stored on disk");
            Arc::new(FileStatsStore::new(dir))
        }
        None => {
            tracing::info!("Visitor stats kept in memory");
            Arc::new(MemoryStatsStore::new())
        }
    };

    let state = Arc::new(AppState::new(Arc::new(store.clone()), stats));

    let app = api::router(state, auth_config)
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %config.bind_addr, "Failed to bind: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Listening on http://{}", config.bind_addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
    }

    if let Some(snapshot) = &snapshot {
        if let Err(e) = snapshot.save(&store).await {
            tracing::error!(path = %snapshot.path().display(), "Failed to write snapshot: {}", e);
        }
    }
}

/// Seed catalog first, then the snapshot (which carries the event log) if one exists
async fn load_store(config: &AppConfig, snapshot: Option<&mut SnapshotFile>) -> MemoryStore {
    let store = match CatalogSeed::load(&config.catalog_path).await {
        Ok(seed) => {
            tracing::info!(
                characters = seed.characters.len(),
                path = %config.catalog_path.display(),
                "Catalog loaded"
            );
            MemoryStore::from_seed(seed).unwrap_or_default()
        }
        Err(e) => {
            tracing::warn!(
                path = %config.catalog_path.display(),
                "No catalog loaded ({}), starting empty",
                e
            );
            MemoryStore::new()
        }
    };

    if let Some(snapshot) = snapshot {
        match snapshot.restore(&store).await {
            Ok(true) => {}
            Ok(false) => tracing::info!(path = %snapshot.path().display(), "No snapshot yet"),
            Err(e) => tracing::error!(
                path = %snapshot.path().display(),
                "Snapshot not restored, keeping the file untouched: {}",
                e
            ),
        }
    }

    store
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
