use axum::{
    Router,
    extract::{Path, State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};

use crate::{
    services::websocket_service,
    state::{SharedState, model::PlayerId},
};

#[utoipa::path(
    get,
    path = "/websocket/p_id/{p_id}",
    tag = "players",
    params(("p_id" = u64, Path, description = "Id of the connecting player")),
    responses((status = 101, description = "Switching protocols to WebSocket"))
)]
/// Upgrade the HTTP connection into a player WebSocket session.
pub async fn ws_handler(
    State(state): State<SharedState>,
    Path(p_id): Path<PlayerId>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| websocket_service::handle_socket(state, p_id, socket))
}

/// Configure the WebSocket endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/websocket/p_id/{p_id}", get(ws_handler))
}
