use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::info;

use crate::models::DiagnosticsResponse;
use crate::ws::registry::ChannelRegistry;

/// Live channel and connection counts for the relay
pub async fn diagnostics(
    State(registry): State<Arc<ChannelRegistry>>,
) -> Json<DiagnosticsResponse> {
    let channels = registry.snapshot().await;
    let n_conn: u32 = channels.iter().map(|c| c.user_count).sum();
    let n_channels = channels.len() as u32;

    info!("Diagnostics: {} channels, {} connections", n_channels, n_conn);

    Json(DiagnosticsResponse {
        n_channels,
        n_conn,
        channels,
    })
}
