use utoipa::OpenApi;

/// OpenAPI document for every REST route and WebSocket frame.
#[derive(OpenApi)]
/// Aggregated OpenAPI document for Quiz Arena.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::websocket::ws_handler,
        crate::routes::quizzes::get_quizzes,
        crate::routes::quizzes::login,
        crate::routes::quizzes::register_player,
        crate::routes::quizzes::check_item_quantity,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::ws::ClientMessage,
            crate::dto::ws::ServerMessage,
            crate::dto::ws::PlayedQuestion,
            crate::dto::ws::QuestionPayload,
            crate::dto::ws::AnswerPayload,
            crate::dto::ws::JackpotSnapshot,
            crate::state::items::ItemKind,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "quizzes", description = "Quiz catalogue"),
        (name = "players", description = "Player login and the match WebSocket"),
        (name = "matches", description = "Live match queries"),
    )
)]
pub struct ApiDoc;
