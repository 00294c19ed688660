//! Main Entrypoint for the Tutor API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Loading the content file (fatal if missing or malformed).
//! 3. Constructing the Axum router and applying middleware.
//! 4. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use tutor_api::{config::Config, router::create_router, state::AppState};

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        return;
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Loading content...");

    // --- 3. Load Content and Shared Services ---
    let bind_address = config.bind_address;
    let app_state = Arc::new(AppState::from_config(config)?);
    info!(
        concepts = app_state.store.len(),
        path = %app_state.config.content_path.display(),
        default_mode = %app_state.config.session.default_mode,
        next_at_end = %app_state.config.session.end_of_list,
        "Content loaded."
    );

    // --- 4. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 5. Start Server ---
    info!(bind_address = %bind_address, "Service configured. Starting server...");
    let listener = tokio::net::TcpListener::bind(bind_address).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
