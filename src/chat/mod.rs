/*!
 * Realtime chat: the room registry, broadcast fan-out, and the wire
 * protocol spoken over the websocket.
 *
 * Room membership is process-local state owned by the `ChatHub`.
 * Cross-process fan-out is delegated to a pub/sub broker when one is
 * configured; each hub tags outbound frames with its node id and
 * rebroadcasts only frames that originated elsewhere.
 */

pub mod auto_reply;

use crate::entities::chat_message;
use crate::message_queue::{Message, MessageQueue};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, warn};
use uuid::Uuid;

/// Well-known room that support staff join out-of-band
pub const SUPPORT_ROOM: &str = "support_room";

/// Broker topic carrying cross-process chat frames
const FANOUT_TOPIC: &str = "chat.events";

/// Identifier of one websocket connection
pub type ConnId = Uuid;

/// Server-to-client events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    ChatJoined {
        session_id: String,
        username: String,
        messages: Vec<chat_message::Model>,
    },
    UserJoined {
        username: String,
        message: String,
    },
    UserLeft {
        username: String,
        message: String,
    },
    NewMessage {
        message: chat_message::Model,
    },
    UserTyping {
        username: String,
        is_typing: bool,
    },
    SupportAlert {
        session_id: String,
        username: String,
        message: String,
    },
    SupportNotified {
        message: String,
    },
    Error {
        message: String,
    },
}

/// Client-to-server events
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinChat {
        session_id: Option<String>,
        username: Option<String>,
    },
    LeaveChat {
        session_id: Option<String>,
        username: Option<String>,
    },
    SendMessage {
        session_id: Option<String>,
        message: Option<String>,
        username: Option<String>,
        #[serde(default)]
        is_support: bool,
    },
    Typing {
        session_id: Option<String>,
        username: Option<String>,
        #[serde(default)]
        is_typing: bool,
    },
    SupportRequest {
        session_id: Option<String>,
        username: Option<String>,
    },
}

/// Frame exchanged between peer processes through the broker
#[derive(Debug, Serialize, Deserialize)]
struct RemoteFrame {
    node_id: Uuid,
    room: String,
    event: ServerEvent,
    skip: Option<ConnId>,
}

struct Member {
    username: String,
    tx: mpsc::Sender<ServerEvent>,
}

/// Registry of chat rooms and their connected members, owned by the
/// connection manager. All mutation goes through explicit methods; no
/// ambient global state.
pub struct ChatHub {
    rooms: DashMap<String, HashMap<ConnId, Member>>,
    memberships: DashMap<ConnId, HashSet<String>>,
    node_id: Uuid,
    broker: Option<Arc<dyn MessageQueue>>,
    queue_capacity: usize,
}

impl ChatHub {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            memberships: DashMap::new(),
            node_id: Uuid::new_v4(),
            broker: None,
            queue_capacity,
        }
    }

    pub fn with_broker(mut self, broker: Arc<dyn MessageQueue>) -> Self {
        self.broker = Some(broker);
        self
    }

    /// Capacity for each connection's outbound event queue.
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Adds a connection to a room's broadcast group.
    pub fn join(&self, room: &str, conn_id: ConnId, username: &str, tx: mpsc::Sender<ServerEvent>) {
        self.rooms.entry(room.to_string()).or_default().insert(
            conn_id,
            Member {
                username: username.to_string(),
                tx,
            },
        );
        self.memberships
            .entry(conn_id)
            .or_default()
            .insert(room.to_string());
    }

    /// Removes a connection from one room. Returns whether it was a
    /// member.
    pub fn leave(&self, room: &str, conn_id: ConnId) -> bool {
        let removed = match self.rooms.get_mut(room) {
            Some(mut members) => members.remove(&conn_id).is_some(),
            None => false,
        };
        self.rooms.remove_if(room, |_, members| members.is_empty());

        if let Some(mut rooms) = self.memberships.get_mut(&conn_id) {
            rooms.remove(room);
        }
        self.memberships
            .remove_if(&conn_id, |_, rooms| rooms.is_empty());

        removed
    }

    /// Releases every membership of a dropped connection. No leave
    /// notice is broadcast; only an explicit leave does that.
    pub fn disconnect(&self, conn_id: ConnId) {
        if let Some((_, rooms)) = self.memberships.remove(&conn_id) {
            for room in rooms {
                if let Some(mut members) = self.rooms.get_mut(&room) {
                    members.remove(&conn_id);
                }
                self.rooms.remove_if(&room, |_, members| members.is_empty());
            }
        }
    }

    /// Number of local members in a room.
    pub fn member_count(&self, room: &str) -> usize {
        self.rooms.get(room).map(|m| m.len()).unwrap_or(0)
    }

    /// Broadcasts an event to a room, locally and (when a broker is
    /// configured) to peer processes.
    pub async fn broadcast(&self, room: &str, event: ServerEvent, skip: Option<ConnId>) {
        self.broadcast_local(room, &event, skip);

        if let Some(broker) = &self.broker {
            let frame = RemoteFrame {
                node_id: self.node_id,
                room: room.to_string(),
                event,
                skip,
            };
            match serde_json::to_value(&frame) {
                Ok(payload) => {
                    if let Err(e) = broker
                        .publish(Message::new(FANOUT_TOPIC.to_string(), payload))
                        .await
                    {
                        warn!("Chat fan-out publish failed: {}", e);
                    }
                }
                Err(e) => warn!("Chat frame serialization failed: {}", e),
            }
        }
    }

    fn broadcast_local(&self, room: &str, event: &ServerEvent, skip: Option<ConnId>) {
        let mut stale = Vec::new();

        if let Some(members) = self.rooms.get(room) {
            for (conn_id, member) in members.iter() {
                if Some(*conn_id) == skip {
                    continue;
                }
                match member.tx.try_send(event.clone()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Closed(_)) => stale.push(*conn_id),
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        // Bounded queue: drop the frame for this slow
                        // consumer rather than stall the room.
                        warn!(
                            "Dropping chat frame for slow consumer {} in room {}",
                            member.username, room
                        );
                    }
                }
            }
        }

        for conn_id in stale {
            self.leave(room, conn_id);
        }
    }

    /// Consumes frames published by peer processes and rebroadcasts
    /// them to local members. Runs until the broker subscription ends.
    pub async fn run_fanout(self: Arc<Self>) {
        let Some(broker) = self.broker.clone() else {
            return;
        };

        let mut rx = match broker.subscribe(FANOUT_TOPIC).await {
            Ok(rx) => rx,
            Err(e) => {
                error!("Chat fan-out subscription failed: {}", e);
                return;
            }
        };

        while let Some(message) = rx.recv().await {
            match serde_json::from_value::<RemoteFrame>(message.payload) {
                Ok(frame) if frame.node_id != self.node_id => {
                    self.broadcast_local(&frame.room, &frame.event, frame.skip);
                }
                Ok(_) => {} // own frame, already delivered locally
                Err(e) => warn!("Dropping malformed chat frame: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message_queue::InMemoryMessageQueue;
    use tokio::time::{sleep, Duration};

    fn typing(username: &str) -> ServerEvent {
        ServerEvent::UserTyping {
            username: username.to_string(),
            is_typing: true,
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_all_members() {
        let hub = ChatHub::new(8);
        let (tx_a, mut rx_a) = mpsc::channel(8);
        let (tx_b, mut rx_b) = mpsc::channel(8);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        hub.join("room-1", a, "alice", tx_a);
        hub.join("room-1", b, "bob", tx_b);

        hub.broadcast("room-1", typing("alice"), None).await;

        assert!(matches!(
            rx_a.try_recv(),
            Ok(ServerEvent::UserTyping { .. })
        ));
        assert!(matches!(
            rx_b.try_recv(),
            Ok(ServerEvent::UserTyping { .. })
        ));
    }

    #[tokio::test]
    async fn skip_excludes_the_sender() {
        let hub = ChatHub::new(8);
        let (tx_a, mut rx_a) = mpsc::channel(8);
        let (tx_b, mut rx_b) = mpsc::channel(8);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        hub.join("room-1", a, "alice", tx_a);
        hub.join("room-1", b, "bob", tx_b);

        hub.broadcast("room-1", typing("alice"), Some(a)).await;

        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn rooms_are_isolated() {
        let hub = ChatHub::new(8);
        let (tx_a, mut rx_a) = mpsc::channel(8);
        let (tx_b, mut rx_b) = mpsc::channel(8);

        hub.join("room-1", Uuid::new_v4(), "alice", tx_a);
        hub.join("room-2", Uuid::new_v4(), "bob", tx_b);

        hub.broadcast("room-1", typing("alice"), None).await;

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn leave_removes_membership() {
        let hub = ChatHub::new(8);
        let (tx, mut rx) = mpsc::channel(8);
        let conn = Uuid::new_v4();

        hub.join("room-1", conn, "alice", tx);
        assert_eq!(hub.member_count("room-1"), 1);

        assert!(hub.leave("room-1", conn));
        assert!(!hub.leave("room-1", conn));
        assert_eq!(hub.member_count("room-1"), 0);

        hub.broadcast("room-1", typing("bob"), None).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn disconnect_releases_every_room() {
        let hub = ChatHub::new(8);
        let (tx, _rx) = mpsc::channel(8);
        let conn = Uuid::new_v4();

        hub.join("room-1", conn, "alice", tx.clone());
        hub.join("room-2", conn, "alice", tx);

        hub.disconnect(conn);

        assert_eq!(hub.member_count("room-1"), 0);
        assert_eq!(hub.member_count("room-2"), 0);
    }

    #[tokio::test]
    async fn fanout_rebroadcasts_peer_frames_only() {
        let broker = Arc::new(InMemoryMessageQueue::new());

        let hub_a = Arc::new(ChatHub::new(8).with_broker(broker.clone()));
        let hub_b = Arc::new(ChatHub::new(8).with_broker(broker));
        tokio::spawn(hub_a.clone().run_fanout());
        tokio::spawn(hub_b.clone().run_fanout());
        sleep(Duration::from_millis(20)).await;

        let (tx_a, mut rx_a) = mpsc::channel(8);
        let (tx_b, mut rx_b) = mpsc::channel(8);
        hub_a.join("room-1", Uuid::new_v4(), "alice", tx_a);
        hub_b.join("room-1", Uuid::new_v4(), "bob", tx_b);

        hub_a.broadcast("room-1", typing("alice"), None).await;
        sleep(Duration::from_millis(50)).await;

        // Local member sees the frame exactly once; the peer hub's
        // member receives it through the broker.
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn client_events_deserialize_from_tagged_frames() {
        let frame = r#"{"event": "join_chat", "data": {"username": "alice"}}"#;
        let event: ClientEvent = serde_json::from_str(frame).unwrap();
        assert!(matches!(
            event,
            ClientEvent::JoinChat {
                session_id: None,
                ..
            }
        ));

        let frame =
            r#"{"event": "send_message", "data": {"session_id": "s1", "message": "hello"}}"#;
        let event: ClientEvent = serde_json::from_str(frame).unwrap();
        match event {
            ClientEvent::SendMessage {
                session_id,
                message,
                is_support,
                ..
            } => {
                assert_eq!(session_id.as_deref(), Some("s1"));
                assert_eq!(message.as_deref(), Some("hello"));
                assert!(!is_support);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn server_events_serialize_with_snake_case_tags() {
        let json = serde_json::to_value(typing("alice")).unwrap();
        assert_eq!(json["event"], "user_typing");
        assert_eq!(json["data"]["username"], "alice");
    }
}
