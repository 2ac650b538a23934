use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    dto::ws::PlayedQuestion,
    error::ServiceError,
    state::{
        SharedState,
        game::{Advance, AnswerOutcome},
        items::ItemKind,
        model::{MatchId, Player, PlayerId, QuestionId, Quiz},
        registry::SharedMatch,
    },
};

/// Register a match for a lobby that reached quorum and play its first question.
pub async fn start_match(
    state: &SharedState,
    quiz: Arc<Quiz>,
    roster: Vec<Player>,
) -> Result<MatchId, ServiceError> {
    let settings = state.config().jackpot;
    let (id, handle) = state.matches().create(quiz, &roster, settings).await?;

    let advance = {
        let mut game = handle.lock().await;
        let mut rng = rand::rng();
        game.start(&mut rng, state.hub())
    };
    after_advance(state, id, &handle, advance).await;
    Ok(id)
}

/// Apply an `answered_question` event to its match.
pub async fn answer_question(
    state: &SharedState,
    player: PlayerId,
    game_id: MatchId,
    question_id: QuestionId,
    played: &PlayedQuestion,
) -> Result<AnswerOutcome, ServiceError> {
    let handle = state
        .matches()
        .get(game_id)
        .await
        .ok_or(ServiceError::UnknownMatch(game_id))?;

    let result = {
        let mut game = handle.lock().await;
        let mut rng = rand::rng();
        game.submit_answer(player, question_id, played, &mut rng, state.hub())
    };
    let outcome = result?;

    debug!(match_id = game_id, player_id = player, outcome = ?outcome, "answer recorded");
    after_advance(state, game_id, &handle, outcome.advanced).await;
    Ok(outcome)
}

/// Spend one item and notify the rest of the roster; `game_id` defaults to the player's match.
pub async fn activate_item(
    state: &SharedState,
    player: PlayerId,
    item: ItemKind,
    game_id: Option<MatchId>,
) -> Result<bool, ServiceError> {
    let game_id = game_id
        .or_else(|| state.matches().match_of(player))
        .ok_or(ServiceError::NotInMatch(player))?;
    let handle = state
        .matches()
        .get(game_id)
        .await
        .ok_or(ServiceError::UnknownMatch(game_id))?;

    let activated = handle.lock().await.activate_item(player, item, state.hub());
    if !activated {
        info!(match_id = game_id, player_id = player, item = ?item, "item activation refused");
    }
    Ok(activated)
}

/// Follow-up of a progression step: arm the next deadline or tear the match down.
async fn after_advance(
    state: &SharedState,
    id: MatchId,
    handle: &SharedMatch,
    advance: Option<Advance>,
) {
    match advance {
        Some(Advance::Question {
            index,
            response_time,
            ..
        }) => arm_deadline(state.clone(), id, handle.clone(), index, response_time),
        Some(Advance::Ended) => finish_match(state, id).await,
        None => {}
    }
}

/// Force the question at `index` forward once its time is up, repeating for every
/// question this task itself advances to.
///
/// The task stops as soon as `handle` is no longer the match registered under `id`.
fn arm_deadline(
    state: SharedState,
    id: MatchId,
    handle: SharedMatch,
    index: usize,
    response_time: u64,
) {
    let Some(wait) = state.config().question_deadline(response_time) else {
        return;
    };

    tokio::spawn(async move {
        let mut index = index;
        let mut wait = wait;
        loop {
            sleep(wait).await;
            if !state.matches().is_registered(id, &handle).await {
                debug!(match_id = id, index, "deadline outlived its match");
                return;
            }

            let advance = {
                let mut game = handle.lock().await;
                let mut rng = rand::rng();
                game.force_advance(index, &mut rng, state.hub())
            };

            match advance {
                Some(Advance::Question {
                    index: next,
                    response_time,
                    ..
                }) => match state.config().question_deadline(response_time) {
                    Some(next_wait) => {
                        index = next;
                        wait = next_wait;
                    }
                    None => return,
                },
                Some(Advance::Ended) => {
                    finish_match(&state, id).await;
                    return;
                }
                None => return,
            }
        }
    });
}

async fn finish_match(state: &SharedState, id: MatchId) {
    match state.matches().remove(id).await {
        Some(_) => info!(match_id = id, "match finished and released"),
        None => warn!(match_id = id, "finished match was already released"),
    }
}
