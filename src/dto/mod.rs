/// Health check payloads.
pub mod health;
/// REST bodies for quizzes, players and items.
pub mod quiz;
/// WebSocket frames.
pub mod ws;
