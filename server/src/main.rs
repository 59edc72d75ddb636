//! GCounter Server - HTTP node of a replicated grow-only counter.

use gcounter_server::config::Config;
use gcounter_server::error::AppError;
use gcounter_server::{app, sync, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gcounter_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    tracing::info!(
        node_id = %config.node_id,
        peers = config.peers.len(),
        "Starting GCounter node on {}:{}",
        config.host,
        config.port
    );

    let state = AppState::from_config(config.clone())?;

    if let Some(interval) = config.sync_interval {
        tracing::info!(?interval, "Background sync enabled");
        sync::spawn_background(state.sync.clone(), state.store.clone(), interval);
    }

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
