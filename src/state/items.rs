use std::collections::HashMap;

use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::model::PlayerId;

/// Consumable effect a player can win by picking the hinted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ItemKind {
    /// Doubles the next score.
    #[serde(rename = "scoreX2")]
    ScoreTimesTwo,
    /// Multiplies the next score by five.
    #[serde(rename = "scoreX5")]
    ScoreTimesFive,
    /// Halves an opponent's next score.
    #[serde(rename = "score/2")]
    ScoreHalved,
    /// Shuffles opponents' answers.
    #[serde(rename = "shuffle_question")]
    ShuffleQuestion,
    /// Raises the jackpot odds.
    #[serde(rename = "jackpot")]
    Jackpot,
    /// Removes an answer from opponents' screens.
    #[serde(rename = "bomb")]
    Bomb,
    /// Moves opponents' answers around.
    #[serde(rename = "move_answers")]
    MoveAnswers,
    /// Hides the scoreboard from opponents.
    #[serde(rename = "hide_scoreboard")]
    HideScoreboard,
    /// Protects the holder's points.
    #[serde(rename = "get_points_save")]
    GetPointsSave,
}

impl ItemKind {
    /// Every effect, in hint draw order.
    pub const ALL: [ItemKind; 9] = [
        ItemKind::ScoreTimesTwo,
        ItemKind::ScoreTimesFive,
        ItemKind::ScoreHalved,
        ItemKind::ShuffleQuestion,
        ItemKind::Jackpot,
        ItemKind::Bomb,
        ItemKind::MoveAnswers,
        ItemKind::HideScoreboard,
        ItemKind::GetPointsSave,
    ];

    /// Pick an effect uniformly.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        *Self::ALL
            .choose(rng)
            .unwrap_or(&ItemKind::ScoreTimesTwo)
    }
}

/// Per-match inventory: effect kind -> player -> remaining quantity.
///
/// A zero quantity is equivalent to absence; [`ItemLedger::prune`] drops such entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemLedger {
    inventory: HashMap<ItemKind, HashMap<PlayerId, u32>>,
}

impl ItemLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Give one unit of `kind` to `player`.
    pub fn grant(&mut self, kind: ItemKind, player: PlayerId) {
        *self
            .inventory
            .entry(kind)
            .or_default()
            .entry(player)
            .or_insert(0) += 1;
    }

    /// Spend one unit of `kind`, returning whether the player had one to spend.
    pub fn consume(&mut self, kind: ItemKind, player: PlayerId) -> bool {
        match self
            .inventory
            .get_mut(&kind)
            .and_then(|holders| holders.get_mut(&player))
        {
            Some(quantity) if *quantity > 0 => {
                *quantity -= 1;
                true
            }
            _ => false,
        }
    }

    /// Remaining units of `kind` held by `player`.
    pub fn quantity(&self, kind: ItemKind, player: PlayerId) -> u32 {
        self.inventory
            .get(&kind)
            .and_then(|holders| holders.get(&player))
            .copied()
            .unwrap_or(0)
    }

    /// Drop exhausted (kind, player) entries and kinds nobody holds anymore.
    pub fn prune(&mut self) {
        self.inventory.retain(|_, holders| {
            holders.retain(|_, quantity| *quantity > 0);
            !holders.is_empty()
        });
    }

    /// Number of (kind, player) entries currently tracked, exhausted ones included.
    pub fn entry_count(&self) -> usize {
        self.inventory.values().map(HashMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    #[test]
    fn grant_then_consume_until_empty() {
        let mut ledger = ItemLedger::new();
        ledger.grant(ItemKind::Bomb, 1);

        assert!(ledger.consume(ItemKind::Bomb, 1));
        assert_eq!(ledger.quantity(ItemKind::Bomb, 1), 0);
        assert!(!ledger.consume(ItemKind::Bomb, 1));
    }

    #[test]
    fn consume_without_entry_is_refused() {
        let mut ledger = ItemLedger::new();
        ledger.grant(ItemKind::Bomb, 1);

        assert!(!ledger.consume(ItemKind::Bomb, 2));
        assert!(!ledger.consume(ItemKind::Jackpot, 1));
        assert_eq!(ledger.quantity(ItemKind::Bomb, 1), 1);
    }

    #[test]
    fn grants_accumulate_per_player() {
        let mut ledger = ItemLedger::new();
        ledger.grant(ItemKind::ScoreTimesTwo, 1);
        ledger.grant(ItemKind::ScoreTimesTwo, 1);
        ledger.grant(ItemKind::ScoreTimesTwo, 2);

        assert_eq!(ledger.quantity(ItemKind::ScoreTimesTwo, 1), 2);
        assert_eq!(ledger.quantity(ItemKind::ScoreTimesTwo, 2), 1);
    }

    #[test]
    fn prune_drops_exhausted_entries_and_empty_kinds() {
        let mut ledger = ItemLedger::new();
        ledger.grant(ItemKind::Bomb, 1);
        ledger.grant(ItemKind::HideScoreboard, 1);
        ledger.grant(ItemKind::HideScoreboard, 2);
        ledger.consume(ItemKind::Bomb, 1);
        ledger.consume(ItemKind::HideScoreboard, 2);
        assert_eq!(ledger.entry_count(), 3);

        ledger.prune();

        assert_eq!(ledger.entry_count(), 1);
        assert!(!ledger.inventory.contains_key(&ItemKind::Bomb));
        assert_eq!(ledger.quantity(ItemKind::HideScoreboard, 1), 1);
    }

    #[test]
    fn item_names_match_the_wire_format() {
        assert_eq!(
            serde_json::to_string(&ItemKind::ScoreHalved).unwrap(),
            "\"score/2\""
        );
        let parsed: ItemKind = serde_json::from_str("\"get_points_save\"").unwrap();
        assert_eq!(parsed, ItemKind::GetPointsSave);
    }

    #[test]
    fn random_kind_comes_from_the_catalogue() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..32 {
            assert!(ItemKind::ALL.contains(&ItemKind::random(&mut rng)));
        }
    }
}
