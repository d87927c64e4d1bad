use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::handlers::{diagnostics, health_check, ready_check};
use crate::ws::registry::ChannelRegistry;
use crate::ws::session::ws_handler;

/// Create API routes
pub fn create_api_routes(registry: Arc<ChannelRegistry>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/v1/diagnostics", get(diagnostics))
        .with_state(registry)
}

/// Assemble the full application router: liveness root, API routes, the
/// WebSocket endpoint and the Swagger UI.
pub fn create_app(registry: Arc<ChannelRegistry>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/ws/:channel_id", get(ws_handler))
        .with_state(registry.clone())
        // Mount API routes
        .nest("/api", create_api_routes(registry))
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        // Add tracing layer
        .layer(TraceLayer::new_for_http())
}
