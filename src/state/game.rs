use std::{collections::HashSet, sync::Arc};

use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    dto::ws::{JackpotSnapshot, PlayedQuestion, QuestionPayload, Scoreboard, ServerMessage},
    state::{
        hub::Broadcaster,
        items::{ItemKind, ItemLedger},
        jackpot::{Jackpot, JackpotSettings},
        model::{MatchId, Player, PlayerId, Question, QuestionId, Quiz},
    },
};

/// Lifecycle of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Created, `game_start` not yet broadcast.
    AwaitingStart,
    /// Questions are being played.
    QuestionCycle,
    /// Final scoreboard broadcast; no further progression.
    Ended,
}

/// Result of one progression step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Question at `index` was broadcast.
    Question {
        /// Position of the question in the match.
        index: usize,
        /// Id of the broadcast question.
        question_id: QuestionId,
        /// Seconds players have to answer it.
        response_time: u64,
    },
    /// The final scoreboard was broadcast.
    Ended,
}

/// Reasons an answer report does not touch the match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnswerRejected {
    /// The match has not started or already ended.
    #[error("match is not playing questions")]
    NotPlaying,
    /// The player is not part of the match.
    #[error("player `{0}` is not part of the match")]
    NotInRoster(PlayerId),
    /// The answer is for a question other than the current one.
    #[error("answer for question `{got}` but the current question is {expected:?}")]
    StaleQuestion {
        /// Question currently played.
        expected: Option<QuestionId>,
        /// Question named by the answer.
        got: QuestionId,
    },
    /// The player already answered the current question.
    #[error("player `{0}` already answered the current question")]
    AlreadyAnswered(PlayerId),
}

/// Side effects of an accepted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnswerOutcome {
    /// Pool content before the payout, when this answer won the jackpot.
    pub jackpot_paid: Option<u64>,
    /// Progression triggered because every roster member has now answered.
    pub advanced: Option<Advance>,
}

/// One quiz played by a fixed roster.
///
/// Every mutation goes through `&mut self`; owners keep the match behind an
/// exclusive lock so the "everyone answered" check and the following advance
/// happen as one step.
#[derive(Debug)]
pub struct Match {
    id: MatchId,
    quiz: Arc<Quiz>,
    questions: Vec<Question>,
    roster: Vec<PlayerId>,
    scoreboard: Scoreboard,
    waiting: HashSet<PlayerId>,
    cursor: usize,
    phase: MatchPhase,
    jackpot: Jackpot,
    items: ItemLedger,
}

impl Match {
    /// Snapshot the roster and select the questions; nothing is broadcast yet.
    pub fn new(id: MatchId, quiz: Arc<Quiz>, players: &[Player], settings: JackpotSettings) -> Self {
        let roster: Vec<PlayerId> = players.iter().map(|player| player.id).collect();
        let scoreboard = roster.iter().map(|id| (*id, 0)).collect();
        let questions = quiz.match_questions();

        Self {
            id,
            quiz,
            questions,
            roster,
            scoreboard,
            waiting: HashSet::new(),
            cursor: 0,
            phase: MatchPhase::AwaitingStart,
            jackpot: Jackpot::new(settings),
            items: ItemLedger::new(),
        }
    }

    /// Registry id of the match.
    pub fn id(&self) -> MatchId {
        self.id
    }

    /// Quiz being played.
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    /// Players in join order.
    pub fn roster(&self) -> &[PlayerId] {
        &self.roster
    }

    /// Scores so far, in roster order.
    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    /// Players who answered the current question.
    pub fn waiting(&self) -> &HashSet<PlayerId> {
        &self.waiting
    }

    /// Number of progression steps taken so far.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Number of questions this match plays.
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Jackpot pool of the match.
    pub fn jackpot(&self) -> &Jackpot {
        &self.jackpot
    }

    /// Items won in this match.
    pub fn items(&self) -> &ItemLedger {
        &self.items
    }

    /// Mutable access to the item ledger.
    pub fn items_mut(&mut self) -> &mut ItemLedger {
        &mut self.items
    }

    /// Whether `player` is on the roster.
    pub fn is_member(&self, player: PlayerId) -> bool {
        self.scoreboard.contains_key(&player)
    }

    /// Question players are currently answering.
    pub fn current_question(&self) -> Option<&Question> {
        if self.phase != MatchPhase::QuestionCycle {
            return None;
        }
        self.cursor
            .checked_sub(1)
            .and_then(|index| self.questions.get(index))
    }

    /// Announce the match and broadcast the first question (or the scoreboard
    /// right away when there is nothing to play). Only the first call has an effect.
    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R, out: &dyn Broadcaster) -> Option<Advance> {
        if self.phase != MatchPhase::AwaitingStart {
            return None;
        }

        info!(match_id = self.id, players = self.roster.len(), "match started");
        out.broadcast(&self.roster, &ServerMessage::GameStart { game_id: self.id });
        self.phase = MatchPhase::QuestionCycle;
        Some(self.advance(rng, out))
    }

    fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R, out: &dyn Broadcaster) -> Advance {
        self.items.prune();

        let total = self.question_count();
        if self.cursor == total {
            self.cursor += 1;
            self.end(out);
            return Advance::Ended;
        }

        if self.cursor + 1 == total {
            self.jackpot.set_active(true);
        } else {
            self.jackpot.random_activation(rng);
        }

        let index = self.cursor;
        let question = &self.questions[index];
        let mut payload = QuestionPayload::from(question);
        let answer_count = payload.answers.len();
        if answer_count > 1 {
            let hinted = rng.random_range(1..answer_count);
            payload.answers[hinted].assigned_effect = Some(ItemKind::random(rng));
        }

        let advance = Advance::Question {
            index,
            question_id: question.id,
            response_time: question.response_time,
        };

        debug!(
            match_id = self.id,
            index,
            total,
            jackpot_active = self.jackpot.is_active(),
            "broadcasting question"
        );
        out.broadcast(
            &self.roster,
            &ServerMessage::Question {
                question: payload,
                jackpot: JackpotSnapshot {
                    amount: self.jackpot.amount(),
                    is_active: self.jackpot.is_active(),
                },
                scoreboard: self.scoreboard.clone(),
            },
        );

        self.cursor += 1;
        advance
    }

    fn end(&mut self, out: &dyn Broadcaster) {
        self.phase = MatchPhase::Ended;
        info!(match_id = self.id, scoreboard = ?self.scoreboard, "match ended");
        out.broadcast(
            &self.roster,
            &ServerMessage::Scoreboard {
                scoreboard: self.scoreboard.clone(),
            },
        );
    }

    /// Add points to a roster member; other ids are ignored.
    ///
    /// Points come from the client, so the score saturates at the `i64` bounds.
    pub fn record_answer(&mut self, player: PlayerId, points: i64) -> bool {
        match self.scoreboard.get_mut(&player) {
            Some(score) => {
                *score = score.saturating_add(points);
                true
            }
            None => false,
        }
    }

    /// Note that `player` answered; advance once the whole roster has.
    pub fn mark_waiting<R: Rng + ?Sized>(
        &mut self,
        player: PlayerId,
        rng: &mut R,
        out: &dyn Broadcaster,
    ) -> Option<Advance> {
        if self.phase != MatchPhase::QuestionCycle || !self.is_member(player) {
            return None;
        }

        self.waiting.insert(player);
        if !self.roster.iter().all(|id| self.waiting.contains(id)) {
            return None;
        }

        self.waiting.clear();
        Some(self.advance(rng, out))
    }

    /// Apply a reported answer: score, jackpot economy, item grant, then progression.
    pub fn submit_answer<R: Rng + ?Sized>(
        &mut self,
        player: PlayerId,
        question_id: QuestionId,
        played: &PlayedQuestion,
        rng: &mut R,
        out: &dyn Broadcaster,
    ) -> Result<AnswerOutcome, AnswerRejected> {
        if self.phase != MatchPhase::QuestionCycle {
            return Err(AnswerRejected::NotPlaying);
        }
        if !self.is_member(player) {
            return Err(AnswerRejected::NotInRoster(player));
        }
        let expected = self.current_question().map(|question| question.id);
        if expected != Some(question_id) {
            return Err(AnswerRejected::StaleQuestion {
                expected,
                got: question_id,
            });
        }
        if self.waiting.contains(&player) {
            return Err(AnswerRejected::AlreadyAnswered(player));
        }

        self.record_answer(player, played.score);

        let mut outcome = AnswerOutcome::default();
        if !played.is_correct {
            self.jackpot.record_wrong_answer();
        } else if played.is_jackpot && self.jackpot.is_active() {
            let paid = self.jackpot.payout();
            info!(match_id = self.id, player_id = player, paid, "jackpot paid out");
            outcome.jackpot_paid = Some(paid);
        }

        if let Some(item) = played.acquired_item {
            self.items.grant(item, player);
        }

        outcome.advanced = self.mark_waiting(player, rng, out);
        Ok(outcome)
    }

    /// Deadline expiry for the question at `index`: advance if it is still current.
    pub fn force_advance<R: Rng + ?Sized>(
        &mut self,
        index: usize,
        rng: &mut R,
        out: &dyn Broadcaster,
    ) -> Option<Advance> {
        if self.phase != MatchPhase::QuestionCycle || self.cursor != index + 1 {
            return None;
        }

        info!(
            match_id = self.id,
            index,
            missing = self.roster.len() - self.waiting.len(),
            "answer deadline elapsed; advancing"
        );
        self.waiting.clear();
        Some(self.advance(rng, out))
    }

    /// Spend an item and tell the rest of the roster about it.
    pub fn activate_item(&mut self, player: PlayerId, item: ItemKind, out: &dyn Broadcaster) -> bool {
        if !self.is_member(player) || !self.items.consume(item, player) {
            return false;
        }

        info!(match_id = self.id, player_id = player, item = ?item, "item activated");
        out.broadcast_except(&self.roster, player, &ServerMessage::ItemActivation { item });
        true
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::state::{
        hub::recording::RecordingBroadcaster,
        model::fixtures::{player, quiz},
    };

    fn new_match(length: usize, players: &[PlayerId]) -> Match {
        let roster: Vec<Player> = players.iter().copied().map(player).collect();
        Match::new(
            0,
            Arc::new(quiz(1, length, players.len())),
            &roster,
            JackpotSettings::default(),
        )
    }

    fn played(score: i64, is_correct: bool) -> PlayedQuestion {
        PlayedQuestion {
            score,
            is_correct,
            is_jackpot: false,
            acquired_item: None,
        }
    }

    fn scoreboard(entries: &[(PlayerId, i64)]) -> Scoreboard {
        entries.iter().copied().collect()
    }

    #[test]
    fn scores_saturate_at_the_bounds() {
        let mut game = new_match(1, &[1, 2]);
        assert!(game.record_answer(1, i64::MAX));
        assert!(game.record_answer(1, i64::MAX));
        assert!(game.record_answer(2, i64::MIN));
        assert!(game.record_answer(2, -1));
        assert!(!game.record_answer(3, 10));
        assert_eq!(game.scoreboard(), &scoreboard(&[(1, i64::MAX), (2, i64::MIN)]));
    }

    #[test]
    fn two_player_match_plays_through() {
        let out = RecordingBroadcaster::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut game = new_match(2, &[1, 2]);

        game.start(&mut rng, &out);
        let messages = out.messages();
        assert_eq!(messages[0], ServerMessage::GameStart { game_id: 0 });
        let ServerMessage::Question { question, scoreboard: board, .. } = &messages[1] else {
            panic!("expected first question, got {:?}", messages[1]);
        };
        assert_eq!(question.id, 1);
        assert_eq!(board, &scoreboard(&[(1, 0), (2, 0)]));

        let first = game.submit_answer(1, 1, &played(100, true), &mut rng, &out).unwrap();
        assert_eq!(first.advanced, None);
        let second = game.submit_answer(2, 1, &played(0, false), &mut rng, &out).unwrap();
        assert!(matches!(second.advanced, Some(Advance::Question { index: 1, .. })));
        assert_eq!(game.jackpot().payout_chance(), 11);
        assert!(game.waiting().is_empty());

        let messages = out.messages();
        let ServerMessage::Question { question, jackpot, scoreboard: board } = &messages[0] else {
            panic!("expected second question");
        };
        assert_eq!(question.id, 2);
        assert!(jackpot.is_active);
        assert_eq!(jackpot.amount, 1200);
        assert_eq!(board, &scoreboard(&[(1, 100), (2, 0)]));

        game.submit_answer(1, 2, &played(50, true), &mut rng, &out).unwrap();
        let last = game.submit_answer(2, 2, &played(80, true), &mut rng, &out).unwrap();
        assert_eq!(last.advanced, Some(Advance::Ended));
        assert_eq!(game.phase(), MatchPhase::Ended);
        assert_eq!(
            out.messages(),
            vec![ServerMessage::Scoreboard {
                scoreboard: scoreboard(&[(1, 150), (2, 80)])
            }]
        );
    }

    #[test]
    fn start_only_runs_once() {
        let out = RecordingBroadcaster::default();
        let mut rng = StdRng::seed_from_u64(2);
        let mut game = new_match(3, &[1]);

        assert!(game.start(&mut rng, &out).is_some());
        assert!(game.start(&mut rng, &out).is_none());
        assert_eq!(out.take().len(), 2);
    }

    #[test]
    fn empty_quiz_ends_on_start() {
        let out = RecordingBroadcaster::default();
        let mut rng = StdRng::seed_from_u64(2);
        let mut game = new_match(0, &[1, 2]);

        assert_eq!(game.start(&mut rng, &out), Some(Advance::Ended));
        assert_eq!(game.phase(), MatchPhase::Ended);
    }

    #[test]
    fn last_question_forces_jackpot_active() {
        let out = RecordingBroadcaster::default();
        let mut rng = StdRng::seed_from_u64(9);
        let mut game = new_match(1, &[1]);

        game.start(&mut rng, &out);
        assert!(game.jackpot().is_active());
    }

    #[test]
    fn hint_never_lands_on_the_first_answer() {
        for seed in 0..200 {
            let out = RecordingBroadcaster::default();
            let mut rng = StdRng::seed_from_u64(seed);
            let mut game = new_match(1, &[1]);
            game.start(&mut rng, &out);

            let question = out
                .messages()
                .into_iter()
                .find_map(|message| match message {
                    ServerMessage::Question { question, .. } => Some(question),
                    _ => None,
                })
                .unwrap();
            let hinted = question.hinted_answer().unwrap();
            assert!((1..question.answers.len()).contains(&hinted));
            assert_eq!(
                question
                    .answers
                    .iter()
                    .filter(|a| a.assigned_effect.is_some())
                    .count(),
                1
            );
        }
    }

    #[test]
    fn scoreboard_domain_is_the_roster() {
        let mut game = new_match(2, &[1, 2]);
        assert!(!game.record_answer(3, 500));
        assert!(game.record_answer(2, 5));
        assert_eq!(game.scoreboard(), &scoreboard(&[(1, 0), (2, 5)]));
    }

    #[test]
    fn waiting_set_ignores_strangers_and_clears_on_advance() {
        let out = RecordingBroadcaster::default();
        let mut rng = StdRng::seed_from_u64(4);
        let mut game = new_match(3, &[1, 2]);
        game.start(&mut rng, &out);

        assert_eq!(game.mark_waiting(9, &mut rng, &out), None);
        assert_eq!(game.mark_waiting(1, &mut rng, &out), None);
        assert_eq!(game.mark_waiting(1, &mut rng, &out), None);
        assert!(game.waiting().len() <= game.roster().len());

        let cursor = game.cursor();
        assert!(game.mark_waiting(2, &mut rng, &out).is_some());
        assert!(game.waiting().is_empty());
        assert_eq!(game.cursor(), cursor + 1);
    }

    #[test]
    fn answers_are_validated_before_touching_state() {
        let out = RecordingBroadcaster::default();
        let mut rng = StdRng::seed_from_u64(5);
        let mut game = new_match(2, &[1, 2]);

        assert_eq!(
            game.submit_answer(1, 1, &played(10, true), &mut rng, &out),
            Err(AnswerRejected::NotPlaying)
        );
        game.start(&mut rng, &out);

        assert_eq!(
            game.submit_answer(5, 1, &played(10, true), &mut rng, &out),
            Err(AnswerRejected::NotInRoster(5))
        );
        assert_eq!(
            game.submit_answer(1, 2, &played(10, true), &mut rng, &out),
            Err(AnswerRejected::StaleQuestion {
                expected: Some(1),
                got: 2
            })
        );
        game.submit_answer(1, 1, &played(10, true), &mut rng, &out)
            .unwrap();
        assert_eq!(
            game.submit_answer(1, 1, &played(10, true), &mut rng, &out),
            Err(AnswerRejected::AlreadyAnswered(1))
        );
        assert_eq!(game.scoreboard()[&1], 10);
    }

    #[test]
    fn jackpot_pays_out_only_when_active() {
        let out = RecordingBroadcaster::default();
        let mut rng = StdRng::seed_from_u64(6);
        // Single question: the jackpot is forced active.
        let mut game = new_match(1, &[1, 2]);
        game.start(&mut rng, &out);

        let mut winning = played(100, true);
        winning.is_jackpot = true;
        let outcome = game.submit_answer(1, 1, &winning, &mut rng, &out).unwrap();
        assert_eq!(outcome.jackpot_paid, Some(1000));
        assert!(!game.jackpot().is_active());
        assert_eq!(game.jackpot().payout_counter(), 1);

        let late = game.submit_answer(2, 1, &winning, &mut rng, &out).unwrap();
        assert_eq!(late.jackpot_paid, None);
        assert_eq!(game.jackpot().payout_counter(), 1);
    }

    #[test]
    fn acquired_items_are_granted_and_activated_once() {
        let out = RecordingBroadcaster::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut game = new_match(2, &[1, 2]);
        game.start(&mut rng, &out);
        out.take();

        let mut answer = played(0, true);
        answer.acquired_item = Some(ItemKind::Bomb);
        game.submit_answer(1, 1, &answer, &mut rng, &out).unwrap();
        assert_eq!(game.items().quantity(ItemKind::Bomb, 1), 1);

        assert!(game.activate_item(1, ItemKind::Bomb, &out));
        assert!(!game.activate_item(1, ItemKind::Bomb, &out));

        let deliveries = out.take();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].excluded, Some(1));
        assert_eq!(
            deliveries[0].message,
            ServerMessage::ItemActivation {
                item: ItemKind::Bomb
            }
        );
    }

    #[test]
    fn deadline_only_advances_the_question_it_was_armed_for() {
        let out = RecordingBroadcaster::default();
        let mut rng = StdRng::seed_from_u64(8);
        let mut game = new_match(3, &[1, 2]);
        game.start(&mut rng, &out);
        game.mark_waiting(1, &mut rng, &out);

        assert!(matches!(
            game.force_advance(0, &mut rng, &out),
            Some(Advance::Question { index: 1, .. })
        ));
        assert!(game.waiting().is_empty());
        assert_eq!(game.force_advance(0, &mut rng, &out), None);
    }
}
