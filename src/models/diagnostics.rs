use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One live channel as seen by the diagnostics endpoint
#[derive(Serialize, Deserialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub channel_id: String,
    pub user_count: u32,
    pub history_len: u32,
}

/// Aggregate relay diagnostics
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsResponse {
    pub n_channels: u32,
    pub n_conn: u32,
    pub channels: Vec<ChannelInfo>,
}
