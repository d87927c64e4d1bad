mod config;
mod docs;
mod handlers;
mod models;
mod routes;
mod ws;

use std::panic;
use std::sync::Arc;

use config::Config;
use routes::create_app;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use ws::registry::ChannelRegistry;

#[tokio::main(flavor = "current_thread")]
async fn main() {

    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            // Default to info level, but allow debug for our app
            "doc_relay=debug,tower_http=debug,axum::rejection=trace,info".into()
        }))
        .init();

    info!("Starting server...");

    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
        Config::default()
    });

    if config.record_history {
        warn!("Channel history recording is enabled - event logs grow unbounded for the channel lifetime");
    }

    // The channel registry is the single shared service object; every
    // session task gets it through axum state.
    let registry = Arc::new(ChannelRegistry::new(config.record_history));

    let app = create_app(registry.clone());

    let listener = tokio::net::TcpListener::bind(config.server_address())
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", config.server_address()));

    info!("🚀 Server running on http://{}", config.server_address());
    info!("📡 WebSocket available at ws://{}/ws/:channel_id", config.server_address());
    info!("📚 Swagger UI available at http://{}/swagger", config.server_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(registry))
        .await
        .expect("Server failed to start");
}

/// Wait for ctrl-c, then tell every connected client the relay is going away.
async fn shutdown_signal(registry: Arc<ChannelRegistry>) {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");
    info!("Shutdown signal received, notifying connected clients");
    registry.broadcast_system("Server is shutting down").await;
}
