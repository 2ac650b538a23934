/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Lobby joins, leaves and disconnect cleanup.
pub mod lobby_service;
/// Match start, answers, items, deadlines and teardown.
pub mod match_service;
/// Quiz catalogue, login and item quantity queries.
pub mod quiz_service;
/// Quiz store supervision with reconnect backoff.
pub mod storage_supervisor;
/// WebSocket connection and message handling service.
pub mod websocket_service;
