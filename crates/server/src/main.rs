use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hlsrelay_core::{
    load_config, load_config_from_env, validate_config, OverlayStore, SqliteOverlayStore,
    StreamManager,
};
use hlsrelay_server::api::create_router;
use hlsrelay_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // A config file is optional; defaults and environment always apply
    let config = match std::env::var("HLSRELAY_CONFIG") {
        Ok(path) => {
            let config_path = PathBuf::from(path);
            info!("Loading configuration from {:?}", config_path);
            load_config(&config_path)
                .with_context(|| format!("Failed to load config from {:?}", config_path))?
        }
        Err(_) => {
            info!("Loading configuration from environment");
            load_config_from_env().context("Failed to load config from environment")?
        }
    };

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("HLS output root: {:?}", config.streams.output_root);
    info!("HLS public URL: {}", config.streams.public_base_url);
    info!("Database path: {:?}", config.database.path);

    std::fs::create_dir_all(&config.streams.output_root).with_context(|| {
        format!(
            "Failed to create HLS output root {:?}",
            config.streams.output_root
        )
    })?;

    // Create SQLite overlay store
    let overlays: Arc<dyn OverlayStore> = Arc::new(
        SqliteOverlayStore::new(&config.database.path)
            .context("Failed to create overlay store")?,
    );
    info!("Overlay store initialized");

    let streams = Arc::new(StreamManager::new(config.streams.clone()));
    info!("Stream manager initialized (transcoder: {})", config.streams.transcoder.binary);

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::clone(&streams),
        overlays,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // No transcoder outlives the service
    info!("Server shutting down, stopping active streams...");
    let stopped = streams.stop_all().await;
    info!("Stopped {} active stream(s)", stopped);

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
