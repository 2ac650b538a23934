use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{dto::ws::ServerMessage, state::model::PlayerId};

/// Delivery primitives lobbies and matches need from the transport.
pub trait Broadcaster: Send + Sync {
    /// Deliver `message` to every connected member of `audience`.
    fn broadcast(&self, audience: &[PlayerId], message: &ServerMessage);

    /// Deliver `message` to every connected member of `audience` except `sender`.
    fn broadcast_except(&self, audience: &[PlayerId], sender: PlayerId, message: &ServerMessage);
}

#[derive(Clone)]
/// Handle used to push frames to one open socket.
pub struct PlayerConnection {
    /// Player owning the socket.
    pub player_id: PlayerId,
    /// Feeds the socket writer task.
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Registry of open player sockets keyed by a per-connection id.
#[derive(Default)]
pub struct ConnectionHub {
    connections: DashMap<Uuid, PlayerConnection>,
}

impl ConnectionHub {
    /// Hub without sockets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new socket for `player_id`, returning its connection id.
    pub fn register(&self, player_id: PlayerId, tx: mpsc::UnboundedSender<Message>) -> Uuid {
        let id = Uuid::new_v4();
        self.connections
            .insert(id, PlayerConnection { player_id, tx });
        id
    }

    /// Forget a socket; returns true when the player has no other open socket.
    pub fn unregister(&self, connection_id: Uuid) -> bool {
        let Some((_, connection)) = self.connections.remove(&connection_id) else {
            return false;
        };
        !self.is_connected(connection.player_id)
    }

    /// Whether `player_id` has at least one open socket.
    pub fn is_connected(&self, player_id: PlayerId) -> bool {
        self.connections
            .iter()
            .any(|entry| entry.player_id == player_id)
    }

    /// Number of open sockets.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Push an already serialized frame to every open socket.
    pub fn relay_to_all(&self, text: &str) {
        for entry in self.connections.iter() {
            let _ = entry.tx.send(Message::Text(text.to_owned().into()));
        }
    }

    fn deliver<F>(&self, message: &ServerMessage, mut include: F)
    where
        F: FnMut(PlayerId) -> bool,
    {
        let payload = match serde_json::to_string(message) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "failed to serialize message `{message:?}`");
                return;
            }
        };

        let mut stale = Vec::new();
        for entry in self.connections.iter() {
            if !include(entry.player_id) {
                continue;
            }
            if entry.tx.send(Message::Text(payload.clone().into())).is_err() {
                stale.push(*entry.key());
            }
        }

        // Writers that are gone are dropped here; the socket task cleans up the rest.
        for id in stale {
            debug!(connection = %id, "dropping closed connection");
            self.connections.remove(&id);
        }
    }
}

impl Broadcaster for ConnectionHub {
    fn broadcast(&self, audience: &[PlayerId], message: &ServerMessage) {
        self.deliver(message, |player| audience.contains(&player));
    }

    fn broadcast_except(&self, audience: &[PlayerId], sender: PlayerId, message: &ServerMessage) {
        self.deliver(message, |player| {
            player != sender && audience.contains(&player)
        });
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use std::sync::Mutex;

    use super::*;

    /// One recorded delivery.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Delivery {
        pub audience: Vec<PlayerId>,
        pub excluded: Option<PlayerId>,
        pub message: ServerMessage,
    }

    /// Broadcaster double keeping every delivery in order.
    #[derive(Default)]
    pub struct RecordingBroadcaster {
        deliveries: Mutex<Vec<Delivery>>,
    }

    impl RecordingBroadcaster {
        pub fn take(&self) -> Vec<Delivery> {
            std::mem::take(&mut *self.deliveries.lock().unwrap())
        }

        pub fn messages(&self) -> Vec<ServerMessage> {
            self.take().into_iter().map(|d| d.message).collect()
        }
    }

    impl Broadcaster for RecordingBroadcaster {
        fn broadcast(&self, audience: &[PlayerId], message: &ServerMessage) {
            self.deliveries.lock().unwrap().push(Delivery {
                audience: audience.to_vec(),
                excluded: None,
                message: message.clone(),
            });
        }

        fn broadcast_except(
            &self,
            audience: &[PlayerId],
            sender: PlayerId,
            message: &ServerMessage,
        ) {
            self.deliveries.lock().unwrap().push(Delivery {
                audience: audience.to_vec(),
                excluded: Some(sender),
                message: message.clone(),
            });
        }
    }
}
