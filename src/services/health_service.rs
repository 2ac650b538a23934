use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report the service status, logging storage connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_quiz_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    HealthResponse::new(
        state.is_degraded(),
        state.matches().len().await,
        state.hub().connection_count(),
    )
}
