
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ContentMessage {
    pub content: String,
}

/// Snapshot sent to a connection right after it joins a channel.
/// `user_count` includes the joiner itself.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InitMessage {
    pub content: String,
    pub user_count: usize,
}

/// Content update as relayed to the other participants of a channel.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ContentBroadcastMessage {
    pub content: String,
    pub user_count: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PresenceMessage {
    pub user_count: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SystemMessage {
    pub message: String,
}

/// Messages accepted from clients. Anything with an unknown `type` fails
/// deserialization and is dropped by the session loop.
#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "content")]
    Content(ContentMessage),
}

/// Messages pushed to clients.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "init")]
    Init(InitMessage),
    #[serde(rename = "content")]
    Content(ContentBroadcastMessage),
    #[serde(rename = "user_joined")]
    UserJoined(PresenceMessage),
    #[serde(rename = "user_left")]
    UserLeft(PresenceMessage),
    #[serde(rename = "system")]
    System(SystemMessage),
}
