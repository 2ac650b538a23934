use std::sync::Arc;

use tracing::info;

use crate::{
    error::ServiceError,
    services::{match_service, quiz_service},
    state::{
        SharedState,
        lobby::JoinOutcome,
        model::{MatchId, PlayerId, QuizId},
    },
};

/// Put a player in the lobby of a quiz, starting the match when quorum is reached.
///
/// Returns the id of the match this join started, if any.
pub async fn join_lobby(
    state: &SharedState,
    player_id: PlayerId,
    quiz_id: QuizId,
) -> Result<Option<MatchId>, ServiceError> {
    let player = quiz_service::load_player(state, player_id).await?;
    let quiz = Arc::new(quiz_service::load_quiz(state, quiz_id).await?);

    match state.lobbies().join(player, quiz, state.hub()).await {
        JoinOutcome::Quorum { quiz, roster } => {
            match match_service::start_match(state, quiz.clone(), roster.clone()).await {
                Ok(id) => Ok(Some(id)),
                Err(err) => {
                    state.lobbies().restore(quiz, roster, state.hub()).await;
                    Err(err)
                }
            }
        }
        JoinOutcome::Waiting { .. } | JoinOutcome::AlreadyJoined => Ok(None),
    }
}

/// Take a player out of one lobby, or out of every lobby when `quiz_id` is absent.
pub async fn leave_lobby(
    state: &SharedState,
    player_id: PlayerId,
    quiz_id: Option<QuizId>,
) -> Vec<QuizId> {
    state.lobbies().leave(player_id, quiz_id, state.hub()).await
}

/// Clean up after the last socket of a player closed.
pub async fn player_disconnected(state: &SharedState, player_id: PlayerId) {
    let left = leave_lobby(state, player_id, None).await;
    if !left.is_empty() {
        info!(player_id, lobbies = ?left, "disconnected player removed from lobbies");
    }
}
