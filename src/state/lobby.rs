use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    dto::ws::ServerMessage,
    state::{
        hub::Broadcaster,
        model::{Player, PlayerId, Quiz, QuizId},
    },
};

/// Waiting room for one quiz slot.
#[derive(Debug, Clone)]
pub struct Lobby {
    quiz: Arc<Quiz>,
    players: Vec<Player>,
}

impl PartialEq for Lobby {
    fn eq(&self, other: &Self) -> bool {
        self.players == other.players
    }
}

impl Lobby {
    fn new(quiz: Arc<Quiz>) -> Self {
        Self {
            quiz,
            players: Vec::new(),
        }
    }

    /// Player count that converts the lobby into a match.
    pub fn quorum(&self) -> usize {
        self.quiz.min_participants
    }

    /// Joined players in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    fn member_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|player| player.id).collect()
    }

    fn contains(&self, player: PlayerId) -> bool {
        self.players.iter().any(|joined| joined.id == player)
    }

    fn roster_message(&self) -> ServerMessage {
        ServerMessage::Lobby {
            lobby: self.member_ids(),
            nicks: self
                .players
                .iter()
                .map(|player| player.nickname.clone())
                .collect(),
        }
    }

    fn announce(&self, out: &dyn Broadcaster) {
        out.broadcast(&self.member_ids(), &self.roster_message());
    }
}

/// What a join did to its lobby.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    /// Player added; quorum not reached yet.
    Waiting {
        /// Players now waiting.
        size: usize,
        /// Players needed to start.
        quorum: usize,
    },
    /// Player was already waiting in this lobby; the roster was re-sent.
    AlreadyJoined,
    /// Quorum reached: the lobby is gone and its roster must start a match.
    Quorum {
        /// Quiz the match plays.
        quiz: Arc<Quiz>,
        /// Players in join order.
        roster: Vec<Player>,
    },
}

/// Live lobbies keyed by quiz slot.
#[derive(Default)]
pub struct LobbyRegistry {
    lobbies: Mutex<HashMap<QuizId, Lobby>>,
}

impl LobbyRegistry {
    /// Registry without lobbies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `player` to the lobby of `quiz`, creating the lobby on first join.
    ///
    /// Reaching quorum removes the lobby under the same lock and hands the
    /// roster back instead of broadcasting it.
    pub async fn join(&self, player: Player, quiz: Arc<Quiz>, out: &dyn Broadcaster) -> JoinOutcome {
        let slot = quiz.id;
        let mut lobbies = self.lobbies.lock().await;
        let lobby = lobbies
            .entry(slot)
            .or_insert_with(|| Lobby::new(quiz));

        if lobby.contains(player.id) {
            debug!(quiz_id = slot, player_id = player.id, "player already in lobby");
            lobby.announce(out);
            return JoinOutcome::AlreadyJoined;
        }

        info!(quiz_id = slot, player_id = player.id, "player joined lobby");
        lobby.players.push(player);

        let size = lobby.players.len();
        let quorum = lobby.quorum();
        if size < quorum {
            lobby.announce(out);
            return JoinOutcome::Waiting { size, quorum };
        }

        match lobbies.remove(&slot) {
            Some(lobby) => {
                info!(quiz_id = slot, players = size, "lobby reached quorum");
                JoinOutcome::Quorum {
                    quiz: lobby.quiz,
                    roster: lobby.players,
                }
            }
            None => JoinOutcome::Waiting { size, quorum },
        }
    }

    /// Remove `player` from the lobby of `slot`, or from every lobby when no slot is given.
    ///
    /// Returns the slots the player actually left; unknown slots are ignored.
    pub async fn leave(
        &self,
        player: PlayerId,
        slot: Option<QuizId>,
        out: &dyn Broadcaster,
    ) -> Vec<QuizId> {
        let mut lobbies = self.lobbies.lock().await;
        let candidates: Vec<QuizId> = match slot {
            Some(slot) => vec![slot],
            None => lobbies.keys().copied().collect(),
        };

        let mut left = Vec::new();
        for slot in candidates {
            let Some(lobby) = lobbies.get_mut(&slot) else {
                continue;
            };
            if !lobby.contains(player) {
                continue;
            }

            lobby.players.retain(|joined| joined.id != player);
            info!(quiz_id = slot, player_id = player, "player left lobby");
            left.push(slot);

            if lobby.players.is_empty() {
                debug!(quiz_id = slot, "closing empty lobby");
                lobbies.remove(&slot);
            } else {
                lobby.announce(out);
            }
        }
        left
    }

    /// Put a roster whose match could not start back into its lobby.
    ///
    /// Players who joined the slot in the meantime stay, behind the restored roster.
    pub async fn restore(&self, quiz: Arc<Quiz>, roster: Vec<Player>, out: &dyn Broadcaster) {
        let slot = quiz.id;
        let mut lobbies = self.lobbies.lock().await;
        let lobby = lobbies.entry(slot).or_insert_with(|| Lobby::new(quiz));

        let newcomers = std::mem::replace(&mut lobby.players, roster);
        for player in newcomers {
            if !lobby.contains(player.id) {
                lobby.players.push(player);
            }
        }
        warn!(quiz_id = slot, players = lobby.players.len(), "lobby restored after failed match start");
        lobby.announce(out);
    }

    /// Copy of the lobby waiting on `slot`.
    pub async fn get(&self, slot: QuizId) -> Option<Lobby> {
        self.lobbies.lock().await.get(&slot).cloned()
    }

    /// Number of open lobbies.
    pub async fn len(&self) -> usize {
        self.lobbies.lock().await.len()
    }

    /// Whether no lobby is open.
    pub async fn is_empty(&self) -> bool {
        self.lobbies.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        hub::recording::RecordingBroadcaster,
        model::fixtures::{player, quiz},
    };

    #[tokio::test]
    async fn join_broadcasts_roster_until_quorum() {
        let registry = LobbyRegistry::new();
        let out = RecordingBroadcaster::default();
        let quiz = Arc::new(quiz(1, 2, 3));

        let outcome = registry.join(player(1), quiz.clone(), &out).await;
        assert_eq!(outcome, JoinOutcome::Waiting { size: 1, quorum: 3 });
        registry.join(player(2), quiz.clone(), &out).await;

        let deliveries = out.take();
        assert_eq!(deliveries.len(), 2);
        assert_eq!(deliveries[1].audience, vec![1, 2]);
        assert_eq!(
            deliveries[1].message,
            ServerMessage::Lobby {
                lobby: vec![1, 2],
                nicks: vec!["player-1".into(), "player-2".into()],
            }
        );
    }

    #[tokio::test]
    async fn quorum_removes_the_lobby_and_returns_the_roster() {
        let registry = LobbyRegistry::new();
        let out = RecordingBroadcaster::default();
        let quiz = Arc::new(quiz(1, 2, 2));

        registry.join(player(1), quiz.clone(), &out).await;
        let outcome = registry.join(player(2), quiz.clone(), &out).await;

        let JoinOutcome::Quorum { roster, .. } = outcome else {
            panic!("expected quorum");
        };
        assert_eq!(roster, vec![player(1), player(2)]);
        assert!(registry.get(1).await.is_none());
        // Only the first join was announced as a lobby roster.
        assert_eq!(out.take().len(), 1);
    }

    #[tokio::test]
    async fn quorum_of_one_converts_on_first_join() {
        let registry = LobbyRegistry::new();
        let out = RecordingBroadcaster::default();

        let outcome = registry.join(player(1), Arc::new(quiz(4, 1, 1)), &out).await;
        assert!(matches!(outcome, JoinOutcome::Quorum { .. }));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn duplicate_join_is_idempotent() {
        let registry = LobbyRegistry::new();
        let out = RecordingBroadcaster::default();
        let quiz = Arc::new(quiz(1, 2, 2));

        registry.join(player(1), quiz.clone(), &out).await;
        let outcome = registry.join(player(1), quiz.clone(), &out).await;

        assert_eq!(outcome, JoinOutcome::AlreadyJoined);
        assert_eq!(registry.get(1).await.unwrap().players().len(), 1);
    }

    #[tokio::test]
    async fn leaving_last_player_deletes_the_lobby() {
        let registry = LobbyRegistry::new();
        let out = RecordingBroadcaster::default();
        let quiz = Arc::new(quiz(1, 2, 3));

        registry.join(player(1), quiz.clone(), &out).await;
        registry.join(player(2), quiz.clone(), &out).await;
        out.take();

        assert_eq!(registry.leave(1, Some(1), &out).await, vec![1]);
        assert_eq!(
            out.messages(),
            vec![ServerMessage::Lobby {
                lobby: vec![2],
                nicks: vec!["player-2".into()],
            }]
        );

        assert_eq!(registry.leave(2, None, &out).await, vec![1]);
        assert!(registry.get(1).await.is_none());
        assert!(out.take().is_empty());
    }

    #[tokio::test]
    async fn leaving_unknown_slot_is_a_no_op() {
        let registry = LobbyRegistry::new();
        let out = RecordingBroadcaster::default();

        assert!(registry.leave(1, Some(42), &out).await.is_empty());
        assert!(registry.leave(1, None, &out).await.is_empty());
        assert!(out.take().is_empty());
    }

    #[tokio::test]
    async fn lobbies_compare_by_roster() {
        let registry = LobbyRegistry::new();
        let out = RecordingBroadcaster::default();
        registry.join(player(1), Arc::new(quiz(1, 2, 3)), &out).await;
        registry.join(player(1), Arc::new(quiz(2, 2, 3)), &out).await;

        assert_eq!(registry.get(1).await, registry.get(2).await);
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn restored_roster_goes_ahead_of_newcomers() {
        let registry = LobbyRegistry::new();
        let out = RecordingBroadcaster::default();
        let quiz = Arc::new(quiz(1, 2, 3));

        registry.join(player(3), quiz.clone(), &out).await;
        out.take();
        registry
            .restore(quiz, vec![player(1), player(2), player(3)], &out)
            .await;

        let lobby = registry.get(1).await.unwrap();
        let ids: Vec<PlayerId> = lobby.players().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(
            out.messages(),
            vec![ServerMessage::Lobby {
                lobby: vec![1, 2, 3],
                nicks: vec!["player-1".into(), "player-2".into(), "player-3".into()],
            }]
        );
    }
}
