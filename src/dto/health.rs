use serde::Serialize;
use utoipa::ToSchema;

/// Payload of `GET /healthcheck`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok", or "degraded" while the quiz store is unreachable.
    pub status: String,
    /// Matches currently being played.
    pub live_matches: usize,
    /// Open player sockets.
    pub connections: usize,
}

impl HealthResponse {
    /// Build the report; `degraded` selects the status string.
    pub fn new(degraded: bool, live_matches: usize, connections: usize) -> Self {
        let status = if degraded { "degraded" } else { "ok" };
        Self {
            status: status.to_string(),
            live_matches,
            connections,
        }
    }
}
