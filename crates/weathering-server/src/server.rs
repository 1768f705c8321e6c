//! WebSocket server and connection handling.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::session::{GameSessions, SessionError};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, sessions: Arc<GameSessions>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Weathering server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let sessions = Arc::clone(&sessions);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, sessions).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    sessions: Arc<GameSessions>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    let connection_id = Uuid::new_v4();
    info!(%connection_id, "New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let welcome = ServerMessage::Welcome { connection_id };
    ws_sender
        .send(Message::Text(serde_json::to_string(&welcome)?))
        .await?;

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let reply = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => handle_message(client_msg, &sessions).await,
                    Err(e) => {
                        warn!(%connection_id, "Invalid message: {}", text);
                        error_reply(SessionError::Malformed(e.to_string()))
                    }
                };
                ws_sender
                    .send(Message::Text(serde_json::to_string(&reply)?))
                    .await?;
            }
            Ok(Message::Close(_)) => {
                info!(%connection_id, "Client closing connection");
                break;
            }
            Err(e) => {
                error!(%connection_id, "WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    info!(%connection_id, "Connection closed");
    Ok(())
}

/// Handle a client message and build the reply.
pub async fn handle_message(msg: ClientMessage, sessions: &GameSessions) -> ServerMessage {
    let reply = match msg {
        ClientMessage::CreateGame { player_names } => sessions
            .create_game(player_names)
            .await
            .map(|state| ServerMessage::GameCreated { state }),

        ClientMessage::GetState { game_id } => sessions
            .state(&game_id)
            .await
            .map(|state| ServerMessage::GameState { state }),

        ClientMessage::Action { game_id, action } => sessions
            .perform(&game_id, action)
            .await
            .map(ServerMessage::ActionResult),

        ClientMessage::AiStep { game_id } => sessions
            .ai_step(&game_id)
            .await
            .map(ServerMessage::AiResult),

        ClientMessage::SetWeather { condition, temp_c } => Ok(ServerMessage::Weather {
            modifiers: sessions.set_weather(&condition, temp_c),
        }),

        ClientMessage::Ping => Ok(ServerMessage::Pong),
    };

    reply.unwrap_or_else(error_reply)
}

fn error_reply(err: SessionError) -> ServerMessage {
    debug!(kind = err.kind(), "request failed: {}", err);
    ServerMessage::error(err.kind(), err.to_string())
}
