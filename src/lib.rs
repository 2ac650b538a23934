//! Library crate for quiz-arena, exposing modules for binaries and tests.

/// Application configuration.
pub mod config;
/// Storage backends.
pub mod dao;
/// Wire payloads.
pub mod dto;
/// Service and HTTP errors.
pub mod error;
/// HTTP and WebSocket routes.
pub mod routes;
/// Orchestration between routes, state and storage.
pub mod services;
/// In-memory domain state.
pub mod state;
