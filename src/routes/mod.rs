use axum::Router;

use crate::state::SharedState;

/// Swagger UI.
pub mod docs;
/// Health check.
pub mod health;
/// Quiz catalogue, players and items.
pub mod quizzes;
/// Player sockets.
pub mod websocket;

/// Compose all route trees and attach the shared state.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(websocket::router())
        .merge(quizzes::router())
        .merge(docs::router())
        .with_state(state)
}
