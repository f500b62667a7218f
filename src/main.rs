//! Lectern Server
//!
//! Hosts one document viewer over HTTP, backed by MuPDF for parsing and
//! thumbnail rendering.

use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lectern::config::Config;
use lectern::error::validate_mount_point;
use lectern::pdf::MupdfLoader;
use lectern::routes;
use lectern::viewer::{RuntimeTimeouts, Viewer, ViewerRuntime};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "lectern=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let mount = validate_mount_point(&config.viewer.mount)?;
    let bridge = config.bridge.build()?;
    let catalog = config.catalog();

    tracing::info!("Starting Lectern v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Viewer mounted at {}", mount);
    tracing::info!("Catalog has {} papers", catalog.len());

    match &bridge {
        Some(bridge) if bridge.is_available().await => {
            tracing::info!("Smart search enabled via {} bridge", bridge.name());
        }
        Some(bridge) => {
            tracing::warn!(
                "{} bridge is not reachable yet; searches will fail until it is",
                bridge.name()
            );
        }
        None => tracing::info!("Smart search disabled (no bridge configured)"),
    }

    let viewer = Viewer::new(
        config.thumbnail_config(),
        config.viewer.context_budget,
        bridge.is_some(),
    );
    let timeouts = RuntimeTimeouts {
        bridge: config.bridge.timeout(),
        ..RuntimeTimeouts::default()
    };
    let handle = ViewerRuntime::spawn_with_timeouts(
        viewer,
        Arc::new(MupdfLoader::new()),
        bridge,
        catalog,
        timeouts,
    );

    if let Err(e) = handle.load_paper(&config.viewer.default_paper).await {
        tracing::warn!("Initial paper load failed: {}", e);
    }

    let app = routes::app(handle, &mount);

    // Start server with graceful shutdown
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Lectern listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
