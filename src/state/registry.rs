use std::{collections::BTreeMap, sync::Arc};

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::state::{
    game::Match,
    jackpot::JackpotSettings,
    model::{MatchId, Player, PlayerId, Quiz},
};

/// Handle to a live match; the lock serializes every mutation of it.
pub type SharedMatch = Arc<Mutex<Match>>;

/// Every id of the configured id space is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("all {0} match ids are in use")]
pub struct RegistryFull(pub u32);

struct Entry {
    handle: SharedMatch,
    roster: Vec<PlayerId>,
}

/// Live matches keyed by id, plus a player -> match index.
pub struct MatchRegistry {
    capacity: u32,
    matches: RwLock<BTreeMap<MatchId, Entry>>,
    players: DashMap<PlayerId, MatchId>,
}

impl MatchRegistry {
    /// Registry handing out ids in `0..capacity`.
    pub fn new(capacity: u32) -> Self {
        Self {
            capacity,
            matches: RwLock::new(BTreeMap::new()),
            players: DashMap::new(),
        }
    }

    /// Register a new match for `roster` under the smallest free id.
    ///
    /// The match is returned in `AwaitingStart`; starting it is up to the caller.
    pub async fn create(
        &self,
        quiz: Arc<Quiz>,
        roster: &[Player],
        settings: JackpotSettings,
    ) -> Result<(MatchId, SharedMatch), RegistryFull> {
        let mut matches = self.matches.write().await;
        let id = smallest_free_id(&matches, self.capacity).ok_or(RegistryFull(self.capacity))?;

        let handle = Arc::new(Mutex::new(Match::new(id, quiz, roster, settings)));
        let members: Vec<PlayerId> = roster.iter().map(|player| player.id).collect();
        for player in &members {
            self.players.insert(*player, id);
        }
        matches.insert(
            id,
            Entry {
                handle: handle.clone(),
                roster: members,
            },
        );

        info!(match_id = id, live = matches.len(), "match registered");
        Ok((id, handle))
    }

    /// Handle of the live match registered under `id`.
    pub async fn get(&self, id: MatchId) -> Option<SharedMatch> {
        self.matches
            .read()
            .await
            .get(&id)
            .map(|entry| entry.handle.clone())
    }

    /// Whether `handle` is still the match registered under `id`.
    ///
    /// Ids are reused once a match is released, so an id alone does not identify a match.
    pub async fn is_registered(&self, id: MatchId, handle: &SharedMatch) -> bool {
        self.matches
            .read()
            .await
            .get(&id)
            .is_some_and(|entry| Arc::ptr_eq(&entry.handle, handle))
    }

    /// Match `player` most recently joined, if it is still live.
    pub fn match_of(&self, player: PlayerId) -> Option<MatchId> {
        self.players.get(&player).map(|entry| *entry)
    }

    /// Drop a match from the registry; players indexed to another match are left alone.
    pub async fn remove(&self, id: MatchId) -> Option<SharedMatch> {
        let entry = self.matches.write().await.remove(&id)?;
        for player in &entry.roster {
            self.players.remove_if(player, |_, indexed| *indexed == id);
        }
        debug!(match_id = id, "match removed from registry");
        Some(entry.handle)
    }

    /// Number of live matches.
    pub async fn len(&self) -> usize {
        self.matches.read().await.len()
    }

    /// Whether no match is live.
    pub async fn is_empty(&self) -> bool {
        self.matches.read().await.is_empty()
    }
}

fn smallest_free_id<V>(matches: &BTreeMap<MatchId, V>, capacity: u32) -> Option<MatchId> {
    // Keys iterate in order, so the first gap is the smallest free id.
    let mut candidate: MatchId = 0;
    for id in matches.keys() {
        if *id != candidate {
            break;
        }
        candidate += 1;
    }
    (candidate < capacity).then_some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{
        game::MatchPhase,
        model::fixtures::{player, quiz},
    };

    async fn create(registry: &MatchRegistry, players: &[PlayerId]) -> MatchId {
        let roster: Vec<Player> = players.iter().copied().map(player).collect();
        let (id, _) = registry
            .create(Arc::new(quiz(1, 2, roster.len())), &roster, JackpotSettings::default())
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    async fn ids_are_the_smallest_free_integer() {
        let registry = MatchRegistry::new(10);
        assert_eq!(create(&registry, &[1]).await, 0);
        assert_eq!(create(&registry, &[2]).await, 1);
        assert_eq!(create(&registry, &[3]).await, 2);

        registry.remove(1).await.unwrap();
        assert_eq!(create(&registry, &[4]).await, 1);
        assert_eq!(create(&registry, &[5]).await, 3);
    }

    #[tokio::test]
    async fn full_registry_refuses_new_matches() {
        let registry = MatchRegistry::new(1);
        create(&registry, &[1]).await;

        let roster = vec![player(2)];
        let result = registry
            .create(Arc::new(quiz(1, 1, 1)), &roster, JackpotSettings::default())
            .await;
        assert_eq!(result.err(), Some(RegistryFull(1)));
    }

    #[tokio::test]
    async fn created_match_waits_for_start() {
        let registry = MatchRegistry::new(4);
        let id = create(&registry, &[1, 2]).await;

        let handle = registry.get(id).await.unwrap();
        let game = handle.lock().await;
        assert_eq!(game.phase(), MatchPhase::AwaitingStart);
        assert_eq!(game.roster(), &[1, 2]);
    }

    #[tokio::test]
    async fn player_index_follows_the_latest_match() {
        let registry = MatchRegistry::new(4);
        let first = create(&registry, &[1, 2]).await;
        let second = create(&registry, &[2, 3]).await;

        assert_eq!(registry.match_of(1), Some(first));
        assert_eq!(registry.match_of(2), Some(second));

        registry.remove(first).await;
        assert_eq!(registry.match_of(1), None);
        assert_eq!(registry.match_of(2), Some(second));
        assert!(registry.get(first).await.is_none());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn reused_id_does_not_match_the_released_handle() {
        let registry = MatchRegistry::new(4);
        let roster = vec![player(1)];
        let (id, old) = registry
            .create(Arc::new(quiz(1, 1, 1)), &roster, JackpotSettings::default())
            .await
            .unwrap();
        assert!(registry.is_registered(id, &old).await);

        registry.remove(id).await.unwrap();
        let (reused, new) = registry
            .create(Arc::new(quiz(1, 1, 1)), &roster, JackpotSettings::default())
            .await
            .unwrap();
        assert_eq!(reused, id);
        assert!(!registry.is_registered(id, &old).await);
        assert!(registry.is_registered(id, &new).await);
    }

    #[test]
    fn gap_search_stops_at_capacity() {
        let mut taken = BTreeMap::new();
        taken.insert(0, ());
        taken.insert(1, ());
        assert_eq!(smallest_free_id(&taken, 2), None);
        assert_eq!(smallest_free_id(&taken, 3), Some(2));
        taken.remove(&0);
        assert_eq!(smallest_free_id(&taken, 3), Some(0));
    }
}
