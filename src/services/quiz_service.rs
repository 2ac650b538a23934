use tracing::info;

use crate::{
    dao::models::NewPlayer,
    dto::quiz::{
        ItemQuantityRequest, ItemQuantityResponse, LoginResponse, QuizResponse,
        RegisterPlayerRequest, RegisterPlayerResponse,
    },
    error::ServiceError,
    state::{
        SharedState,
        model::{Player, PlayerId, Quiz, QuizId},
    },
};

/// Resolve a quiz together with its playable questions.
pub async fn load_quiz(state: &SharedState, id: QuizId) -> Result<Quiz, ServiceError> {
    let store = state.require_quiz_store().await?;
    let entity = store
        .find_quiz(id)
        .await?
        .ok_or(ServiceError::UnknownQuiz(id))?;
    let questions = store.questions_for_topic(entity.title.clone()).await?;
    Ok(Quiz::from_entities(entity, questions))
}

/// Resolve a stored player.
pub async fn load_player(state: &SharedState, id: PlayerId) -> Result<Player, ServiceError> {
    let store = state.require_quiz_store().await?;
    store
        .find_player(id)
        .await?
        .map(Player::from)
        .ok_or(ServiceError::UnknownPlayer(id))
}

/// Every stored quiz, with its questions.
pub async fn list_quizzes(state: &SharedState) -> Result<Vec<QuizResponse>, ServiceError> {
    let store = state.require_quiz_store().await?;
    let mut quizzes = Vec::new();
    for entity in store.list_quizzes().await? {
        let questions = store.questions_for_topic(entity.title.clone()).await?;
        quizzes.push(QuizResponse::from(&Quiz::from_entities(entity, questions)));
    }
    Ok(quizzes)
}

/// One quiz with its playable questions.
pub async fn get_quiz(state: &SharedState, id: QuizId) -> Result<QuizResponse, ServiceError> {
    let quiz = load_quiz(state, id).await?;
    Ok(QuizResponse::from(&quiz))
}

/// Look a nickname up; unknown nicknames are not an error.
pub async fn login(state: &SharedState, username: String) -> Result<LoginResponse, ServiceError> {
    let store = state.require_quiz_store().await?;
    let response = match store.find_player_id_by_nickname(username).await? {
        Some(id) => LoginResponse { p_id: id as i64 },
        None => LoginResponse::unknown(),
    };
    Ok(response)
}

/// Register a nickname, returning the existing id when it is taken.
pub async fn register_player(
    state: &SharedState,
    request: RegisterPlayerRequest,
) -> Result<RegisterPlayerResponse, ServiceError> {
    let store = state.require_quiz_store().await?;
    let nickname = request.nickname.clone();
    let p_id = store
        .ensure_player(NewPlayer {
            nickname: request.nickname,
            password: request.password,
            mail: request.mail,
        })
        .await?;
    info!(player_id = p_id, %nickname, "player registered");
    Ok(RegisterPlayerResponse { p_id })
}

/// Report whether the player holds at least one unit of the item in that match.
///
/// Spending happens on the `item_activation` websocket event.
pub async fn check_item_quantity(
    state: &SharedState,
    request: ItemQuantityRequest,
) -> Result<ItemQuantityResponse, ServiceError> {
    let handle = state
        .matches()
        .get(request.game_id)
        .await
        .ok_or(ServiceError::UnknownMatch(request.game_id))?;
    let game = handle.lock().await;
    Ok(ItemQuantityResponse {
        activate: game.items().quantity(request.item, request.p_id) > 0,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{NewAnswer, NewQuestion, NewQuiz},
            quiz_store::{QuizStore, memory::MemoryQuizStore},
        },
        error::ServiceError,
        state::{AppState, items::ItemKind, jackpot::JackpotSettings, model::fixtures},
    };

    fn new_question(questioning: &str, topic: &str, answers: usize) -> NewQuestion {
        NewQuestion {
            questioning: questioning.into(),
            topic: topic.into(),
            answers: (0..answers)
                .map(|index| NewAnswer {
                    content: format!("answer {index}"),
                    correct: index == 0,
                })
                .collect(),
            dynamic_difficulty: 0.5,
            static_difficulty: 0.5,
            response_time: 20,
            worth: 100,
        }
    }

    async fn seeded_state() -> SharedState {
        let store = MemoryQuizStore::new();
        store
            .ensure_quiz(NewQuiz {
                title: "Space".into(),
                length: 5,
                min_participants: 2,
            })
            .await
            .unwrap();
        store
            .ensure_question(new_question("Closest planet?", "Space", 4))
            .await
            .unwrap();
        store
            .ensure_question(new_question("Broken?", "Space", 3))
            .await
            .unwrap();
        store
            .ensure_player(NewPlayer {
                nickname: "ada".into(),
                password: None,
                mail: None,
            })
            .await
            .unwrap();

        let state = AppState::new(AppConfig::default());
        state.set_quiz_store(Arc::new(store)).await;
        state
    }

    #[tokio::test]
    async fn quiz_loading_skips_unplayable_questions() {
        let state = seeded_state().await;
        let quiz = get_quiz(&state, 1).await.unwrap();
        assert_eq!(quiz.title, "Space");
        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(list_quizzes(&state).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_quiz_is_not_found() {
        let state = seeded_state().await;
        assert!(matches!(
            get_quiz(&state, 9).await,
            Err(ServiceError::UnknownQuiz(9))
        ));
    }

    #[tokio::test]
    async fn login_returns_minus_one_for_unknown_nicknames() {
        let state = seeded_state().await;
        assert_eq!(login(&state, "ada".into()).await.unwrap(), LoginResponse { p_id: 1 });
        assert_eq!(login(&state, "bob".into()).await.unwrap(), LoginResponse::unknown());
    }

    #[tokio::test]
    async fn registration_is_idempotent() {
        let state = seeded_state().await;
        let request = || RegisterPlayerRequest {
            nickname: "grace".into(),
            password: None,
            mail: None,
        };
        let first = register_player(&state, request()).await.unwrap();
        let second = register_player(&state, request()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.p_id, 2);
    }

    #[tokio::test]
    async fn degraded_state_refuses_store_operations() {
        let state = AppState::new(AppConfig::default());
        assert!(matches!(
            login(&state, "ada".into()).await,
            Err(ServiceError::Degraded)
        ));
    }

    #[tokio::test]
    async fn item_quantity_reads_the_match_ledger() {
        let state = seeded_state().await;
        let roster = vec![fixtures::player(1), fixtures::player(2)];
        let (id, handle) = state
            .matches()
            .create(
                Arc::new(fixtures::quiz(1, 2, 2)),
                &roster,
                JackpotSettings::default(),
            )
            .await
            .unwrap();
        handle.lock().await.items_mut().grant(ItemKind::Bomb, 1);

        let ask = |p_id| ItemQuantityRequest {
            p_id,
            game_id: id,
            item: ItemKind::Bomb,
        };
        assert!(check_item_quantity(&state, ask(1)).await.unwrap().activate);
        assert!(!check_item_quantity(&state, ask(2)).await.unwrap().activate);
    }
}
