//! WebSocket protocol messages for the weathering server.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use weathering_core::{ActionResponse, AiStep, EnvironmentalModifiers, GameId, GameState};

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start a new game with the given seats
    CreateGame { player_names: Vec<String> },

    /// Fetch the full state of a game
    GetState { game_id: GameId },

    /// Submit a game action for the active player
    Action {
        game_id: GameId,
        action: serde_json::Value,
    },

    /// Let the AI move for the active seat
    AiStep { game_id: GameId },

    /// Report new weather conditions
    SetWeather { condition: String, temp_c: f64 },

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Welcome message with the connection id
    Welcome { connection_id: Uuid },

    /// Game created successfully
    GameCreated { state: GameState },

    /// Current game state
    GameState { state: GameState },

    /// Action applied
    ActionResult(ActionResponse),

    /// Outcome of an AI step
    AiResult(AiStep),

    /// Weather changed
    Weather { modifiers: EnvironmentalModifiers },

    /// Request failed; `kind` is a stable error code
    Error { kind: String, message: String },

    /// Pong response
    Pong,
}

impl ServerMessage {
    pub fn error(kind: impl Into<String>, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            kind: kind.into(),
            message: message.into(),
        }
    }
}
