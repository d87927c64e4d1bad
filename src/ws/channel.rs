use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;
use uuid::Uuid;

use crate::models::{ContentBroadcastMessage, InitMessage, PresenceMessage, ServerMessage};

/// Stable identifier for one participant connection, assigned at upgrade
/// time. Identity is the id, never the socket reference.
pub type ConnectionId = Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Join,
    Leave,
    Content,
}

/// One entry of a channel's append-only in-memory event log.
#[derive(Clone, Debug)]
pub struct ChannelEvent {
    pub kind: EventKind,
    pub content: String,
    pub at: DateTime<Utc>,
}

/// Live state of one document channel: the latest full content plus the
/// outbound queue of every connected participant.
///
/// All methods assume the caller holds the channel's mutex; broadcasts only
/// push onto unbounded queues, so no method ever awaits.
#[derive(Debug)]
pub struct Channel {
    content: String,
    participants: HashMap<ConnectionId, UnboundedSender<ServerMessage>>,
    history: Option<Vec<ChannelEvent>>,
}

impl Channel {
    pub fn new(record_history: bool) -> Self {
        Self {
            content: String::new(),
            participants: HashMap::new(),
            history: record_history.then(Vec::new),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn user_count(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn history(&self) -> Option<&[ChannelEvent]> {
        self.history.as_deref()
    }

    pub fn history_len(&self) -> usize {
        self.history.as_ref().map_or(0, Vec::len)
    }

    /// Add a participant. The joiner gets an `init` snapshot on its own
    /// queue; everyone else gets `user_joined` with the new count. Both go
    /// out under the same lock, so the counts are exact.
    pub fn join(&mut self, id: ConnectionId, tx: UnboundedSender<ServerMessage>) {
        self.participants.insert(id, tx);
        let user_count = self.participants.len();

        if let Some(tx) = self.participants.get(&id) {
            let _ = tx.send(ServerMessage::Init(InitMessage {
                content: self.content.clone(),
                user_count,
            }));
        }
        self.broadcast(
            ServerMessage::UserJoined(PresenceMessage { user_count }),
            Some(id),
        );
        self.record(EventKind::Join, String::new());
    }

    /// Remove a participant and return how many remain. If any do, they
    /// all get `user_left` with the new count; an empty channel has no one
    /// left to notify and must be pruned by the caller.
    pub fn leave(&mut self, id: ConnectionId) -> usize {
        self.participants.remove(&id);
        let user_count = self.participants.len();
        if user_count > 0 {
            self.broadcast(ServerMessage::UserLeft(PresenceMessage { user_count }), None);
            self.record(EventKind::Leave, String::new());
        }
        user_count
    }

    /// Overwrite the channel content in full (last writer wins) and relay
    /// the update to every participant except the author.
    pub fn update_content(&mut self, sender: ConnectionId, content: String) {
        self.content = content.clone();
        self.record(EventKind::Content, content.clone());
        let user_count = self.participants.len();
        self.broadcast(
            ServerMessage::Content(ContentBroadcastMessage { content, user_count }),
            Some(sender),
        );
    }

    /// Queue `msg` for every participant except `exclude`. Best-effort per
    /// recipient: a dropped receiver is skipped, delivery to the rest
    /// continues, and that participant's own session handles its teardown.
    pub fn broadcast(&self, msg: ServerMessage, exclude: Option<ConnectionId>) {
        for (id, tx) in &self.participants {
            if Some(*id) == exclude {
                continue;
            }
            if tx.send(msg.clone()).is_err() {
                debug!("Participant {} has a closed outbound queue, skipping", id);
            }
        }
    }

    fn record(&mut self, kind: EventKind, content: String) {
        if let Some(history) = &mut self.history {
            history.push(ChannelEvent {
                kind,
                content,
                at: Utc::now(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn member() -> (ConnectionId, UnboundedSender<ServerMessage>, UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Uuid::new_v4(), tx, rx)
    }

    #[test]
    fn join_sends_exact_snapshot_to_joiner() {
        let mut channel = Channel::new(false);
        let (a_id, a_tx, mut a_rx) = member();
        channel.join(a_id, a_tx);

        match a_rx.try_recv().unwrap() {
            ServerMessage::Init(init) => {
                assert_eq!(init.content, "");
                assert_eq!(init.user_count, 1);
            }
            other => panic!("expected init, got {:?}", other),
        }
        assert!(a_rx.try_recv().is_err(), "joiner must not see its own join");
    }

    #[test]
    fn second_join_notifies_existing_participants() {
        let mut channel = Channel::new(false);
        let (a_id, a_tx, mut a_rx) = member();
        let (b_id, b_tx, mut b_rx) = member();
        channel.join(a_id, a_tx);
        channel.update_content(a_id, "draft".to_string());
        let _ = a_rx.try_recv(); // a's init

        channel.join(b_id, b_tx);

        match b_rx.try_recv().unwrap() {
            ServerMessage::Init(init) => {
                assert_eq!(init.content, "draft");
                assert_eq!(init.user_count, 2);
            }
            other => panic!("expected init, got {:?}", other),
        }
        match a_rx.try_recv().unwrap() {
            ServerMessage::UserJoined(presence) => assert_eq!(presence.user_count, 2),
            other => panic!("expected user_joined, got {:?}", other),
        }
    }

    #[test]
    fn update_is_not_echoed_to_its_author() {
        let mut channel = Channel::new(false);
        let (a_id, a_tx, mut a_rx) = member();
        let (b_id, b_tx, mut b_rx) = member();
        channel.join(a_id, a_tx);
        channel.join(b_id, b_tx);
        let _ = a_rx.try_recv(); // init
        let _ = a_rx.try_recv(); // user_joined
        let _ = b_rx.try_recv(); // init

        channel.update_content(a_id, "hello".to_string());

        match b_rx.try_recv().unwrap() {
            ServerMessage::Content(update) => {
                assert_eq!(update.content, "hello");
                assert_eq!(update.user_count, 2);
            }
            other => panic!("expected content, got {:?}", other),
        }
        assert!(a_rx.try_recv().is_err(), "author must not receive its own update");
        assert_eq!(channel.content(), "hello");
    }

    #[test]
    fn leave_notifies_remaining_participants_only() {
        let mut channel = Channel::new(false);
        let (a_id, a_tx, mut a_rx) = member();
        let (b_id, b_tx, _b_rx) = member();
        channel.join(a_id, a_tx);
        channel.join(b_id, b_tx);
        let _ = a_rx.try_recv();
        let _ = a_rx.try_recv();

        let remaining = channel.leave(b_id);
        assert_eq!(remaining, 1);
        match a_rx.try_recv().unwrap() {
            ServerMessage::UserLeft(presence) => assert_eq!(presence.user_count, 1),
            other => panic!("expected user_left, got {:?}", other),
        }

        let remaining = channel.leave(a_id);
        assert_eq!(remaining, 0);
        assert!(channel.is_empty());
    }

    #[test]
    fn broadcast_survives_a_dropped_receiver() {
        let mut channel = Channel::new(false);
        let (a_id, a_tx, a_rx) = member();
        let (b_id, b_tx, mut b_rx) = member();
        channel.join(a_id, a_tx);
        channel.join(b_id, b_tx);
        let _ = b_rx.try_recv(); // init
        drop(a_rx);

        channel.broadcast(
            ServerMessage::System(crate::models::SystemMessage {
                message: "still here".to_string(),
            }),
            None,
        );

        match b_rx.try_recv().unwrap() {
            ServerMessage::System(system) => assert_eq!(system.message, "still here"),
            other => panic!("expected system, got {:?}", other),
        }
    }

    #[test]
    fn history_records_events_only_when_enabled() {
        let mut channel = Channel::new(true);
        let (a_id, a_tx, _a_rx) = member();
        channel.join(a_id, a_tx);
        channel.update_content(a_id, "v1".to_string());
        channel.update_content(a_id, "v2".to_string());

        let history = channel.history().unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].kind, EventKind::Join);
        assert_eq!(history[1].kind, EventKind::Content);
        assert_eq!(history[2].content, "v2");
        assert!(history[0].at <= history[2].at);

        let mut silent = Channel::new(false);
        let (b_id, b_tx, _b_rx) = member();
        silent.join(b_id, b_tx);
        silent.update_content(b_id, "v1".to_string());
        assert!(silent.history().is_none());
        assert_eq!(silent.history_len(), 0);
    }
}
