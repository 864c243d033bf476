//! # backlot-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for the BackLot back office.
//! Binds to configurable port (default 8080).

use backlot_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Build configuration from environment.
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let auth_token = std::env::var("AUTH_TOKEN").ok();
    if auth_token.is_none() {
        tracing::warn!("AUTH_TOKEN not set — authentication is disabled");
    }
    let config = AppConfig { port, auth_token };

    // Initialize database pool (optional — absent means in-memory only).
    let db_pool = backlot_api::db::init_pool().await.map_err(|e| {
        tracing::error!("Database initialization failed: {e}");
        e
    })?;

    let state = AppState::with_config(config, db_pool);

    // Hydrate in-memory stores from database (if connected).
    state.hydrate_from_db().await.map_err(|e| {
        tracing::error!("Database hydration failed: {e}");
        e
    })?;

    let app = backlot_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("BackLot API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
