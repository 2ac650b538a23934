use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    dto::ws::{ClientMessage, InboundError},
    error::ServiceError,
    services::{lobby_service, match_service},
    state::{SharedState, model::PlayerId},
};

/// Handle the full lifecycle of one player WebSocket connection.
pub async fn handle_socket(state: SharedState, player_id: PlayerId, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let connection_id = state.hub().register(player_id, outbound_tx.clone());
    info!(player_id, connection = %connection_id, "player connected");

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                debug!(player_id, payload = %text, "received player message");
                handle_text(&state, player_id, text.as_str()).await;
            }
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(player_id, "player closed the connection");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) | Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(player_id, error = %err, "websocket error");
                break;
            }
        }
    }

    if state.hub().unregister(connection_id) {
        lobby_service::player_disconnected(&state, player_id).await;
    }
    info!(player_id, connection = %connection_id, "player disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Parse and dispatch one text frame; failures are logged and the frame dropped.
pub async fn handle_text(state: &SharedState, connection_player: PlayerId, text: &str) {
    let message = match ClientMessage::from_json_str(text) {
        Ok(message) => message,
        Err(err @ InboundError::MissingFields { .. }) => {
            debug!(player_id = connection_player, error = %err, "dropping incomplete message");
            return;
        }
        Err(err) => {
            warn!(player_id = connection_player, error = %err, "dropping player message");
            return;
        }
    };

    match dispatch(state, message, text).await {
        Ok(()) => {}
        Err(err) if err.is_not_found() => {
            info!(player_id = connection_player, error = %err, "player event ignored");
        }
        Err(err) => warn!(player_id = connection_player, error = %err, "player event failed"),
    }
}

async fn dispatch(
    state: &SharedState,
    message: ClientMessage,
    raw: &str,
) -> Result<(), ServiceError> {
    match message {
        ClientMessage::JoinLobby { p_id, q_id } => {
            lobby_service::join_lobby(state, p_id, q_id).await?;
        }
        ClientMessage::LeaveLobby { p_id, q_id } => {
            lobby_service::leave_lobby(state, p_id, q_id).await;
        }
        ClientMessage::AnsweredQuestion {
            p_id,
            game_id,
            q_id,
            played_question,
        } => {
            match_service::answer_question(state, p_id, game_id, q_id, &played_question).await?;
        }
        ClientMessage::ItemActivation {
            p_id,
            item,
            game_id,
        } => {
            match_service::activate_item(state, p_id, item, game_id).await?;
        }
        ClientMessage::UserMessage { .. } => state.hub().relay_to_all(raw),
    }
    Ok(())
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
