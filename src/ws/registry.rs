use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::models::{ChannelInfo, ServerMessage, SystemMessage};

use super::channel::{Channel, ConnectionId};

pub type SharedChannel = Arc<Mutex<Channel>>;

/// Process-wide table of channel id -> live channel.
///
/// Channels are created on first join and removed the instant their last
/// participant leaves; an empty channel never outlives the leave that
/// emptied it. Membership transitions hold the map write lock, so lookup
/// and mutation are one critical section; content updates only take the
/// per-channel mutex. Lock order is always map, then channel.
pub struct ChannelRegistry {
    channels: RwLock<HashMap<String, SharedChannel>>,
    record_history: bool,
}

impl ChannelRegistry {
    pub fn new(record_history: bool) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            record_history,
        }
    }

    /// Add a connection to a channel, creating the channel if this is its
    /// first participant. Emits the `init` snapshot and the `user_joined`
    /// presence event as part of the same critical section.
    pub async fn join(
        &self,
        channel_id: &str,
        connection_id: ConnectionId,
        tx: UnboundedSender<ServerMessage>,
    ) -> SharedChannel {
        let mut channels = self.channels.write().await;
        let channel = channels
            .entry(channel_id.to_string())
            .or_insert_with(|| {
                info!("Creating channel {}", channel_id);
                Arc::new(Mutex::new(Channel::new(self.record_history)))
            })
            .clone();
        channel.lock().await.join(connection_id, tx);
        channel
    }

    /// Remove a connection from a channel and return how many participants
    /// remain. Remaining participants get a `user_left` event; a channel
    /// left empty is dropped from the table before the lock is released.
    /// Leaving a channel id that is not present is a no-op.
    pub async fn leave(&self, channel_id: &str, connection_id: ConnectionId) -> usize {
        let mut channels = self.channels.write().await;
        let Some(channel) = channels.get(channel_id) else {
            debug!("Leave for unknown channel {}, nothing to do", channel_id);
            return 0;
        };
        let remaining = channel.lock().await.leave(connection_id);
        if remaining == 0 {
            channels.remove(channel_id);
            info!("Channel {} is empty, dropping it", channel_id);
        }
        remaining
    }

    /// Whether a channel currently exists (i.e. has at least one participant).
    pub async fn contains(&self, channel_id: &str) -> bool {
        self.channels.read().await.contains_key(channel_id)
    }

    /// Per-channel counts for the diagnostics endpoint, sorted by id.
    pub async fn snapshot(&self) -> Vec<ChannelInfo> {
        let channels = self.channels.read().await;
        let mut infos = Vec::with_capacity(channels.len());
        for (channel_id, channel) in channels.iter() {
            let channel = channel.lock().await;
            infos.push(ChannelInfo {
                channel_id: channel_id.clone(),
                user_count: channel.user_count() as u32,
                history_len: channel.history_len() as u32,
            });
        }
        infos.sort_by(|a, b| a.channel_id.cmp(&b.channel_id));
        infos
    }

    /// Send a `system` message to every participant of every channel.
    pub async fn broadcast_system(&self, message: &str) {
        let channels = self.channels.read().await;
        for channel in channels.values() {
            channel.lock().await.broadcast(
                ServerMessage::System(SystemMessage {
                    message: message.to_string(),
                }),
                None,
            );
        }
    }
}
