use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::quiz::{
        ItemQuantityRequest, ItemQuantityResponse, LoginRequest, LoginResponse, QuizListing,
        QuizQuery, RegisterPlayerRequest, RegisterPlayerResponse,
    },
    error::AppError,
    services::quiz_service,
    state::SharedState,
};

/// Quiz catalogue, login and item endpoints used by the player client.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/quizzes", get(get_quizzes))
        .route("/login", post(login))
        .route("/players", post(register_player))
        .route("/checkItemQuantity", post(check_item_quantity))
}

#[utoipa::path(
    get,
    path = "/quizzes",
    tag = "quizzes",
    params(QuizQuery),
    responses(
        (status = 200, description = "Every quiz, or the one selected by `id`", body = QuizListing),
        (status = 404, description = "Unknown quiz id"),
        (status = 503, description = "Storage unavailable")
    )
)]
/// List quizzes with their playable questions.
pub async fn get_quizzes(
    State(state): State<SharedState>,
    Query(query): Query<QuizQuery>,
) -> Result<Json<QuizListing>, AppError> {
    let listing = match query.id {
        Some(id) => QuizListing::One(quiz_service::get_quiz(&state, id).await?),
        None => QuizListing::All(quiz_service::list_quizzes(&state).await?),
    };
    Ok(Json(listing))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "players",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Player id, -1 for unknown nicknames", body = LoginResponse),
        (status = 400, description = "Invalid payload")
    )
)]
/// Resolve a nickname into a player id.
pub async fn login(
    State(state): State<SharedState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.validate()?;
    let response = quiz_service::login(&state, payload.username).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/players",
    tag = "players",
    request_body = RegisterPlayerRequest,
    responses(
        (status = 200, description = "Id of the new or existing player", body = RegisterPlayerResponse),
        (status = 400, description = "Invalid payload")
    )
)]
/// Register a player; an existing nickname keeps its id.
pub async fn register_player(
    State(state): State<SharedState>,
    Json(payload): Json<RegisterPlayerRequest>,
) -> Result<Json<RegisterPlayerResponse>, AppError> {
    payload.validate()?;
    let response = quiz_service::register_player(&state, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/checkItemQuantity",
    tag = "matches",
    request_body = ItemQuantityRequest,
    responses(
        (status = 200, description = "Whether the player can activate the item", body = ItemQuantityResponse),
        (status = 404, description = "Unknown match")
    )
)]
/// Tell a player whether one of their items can be activated.
pub async fn check_item_quantity(
    State(state): State<SharedState>,
    Json(payload): Json<ItemQuantityRequest>,
) -> Result<Json<ItemQuantityResponse>, AppError> {
    let response = quiz_service::check_item_quantity(&state, payload).await?;
    Ok(Json(response))
}
