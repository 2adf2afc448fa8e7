//! WebSocket protocol messages for Nexus Miners multiplayer.

use nexus_core::GameSnapshot;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Join the current waiting lobby
    JoinLobby {
        #[serde(default)]
        name: String,
    },

    /// Flip this player's ready flag
    ToggleReady,

    /// Submit a game action, e.g. `{"kind": "place", "cellA": .., "cellB": ..}`
    GameAction { action: serde_json::Value },

    /// Request room list
    ListRooms,

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Welcome message with assigned player ID
    Welcome { player_id: Uuid },

    /// Lobby membership or readiness changed
    LobbyUpdate { room: RoomInfo },

    /// Game started
    GameStarted { state: GameSnapshot },

    /// Game state after a successful action
    GameUpdate { state: GameSnapshot },

    /// Game finished
    GameOver { winner: String, winner_name: String },

    /// The acting player's action was refused
    ActionError { message: String },

    /// List of waiting lobbies
    RoomList { rooms: Vec<RoomInfo> },

    /// Error occurred
    Error { message: String },

    /// Pong response
    Pong,
}

/// Room information for clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    pub id: Uuid,
    pub players: Vec<LobbyPlayer>,
    pub status: RoomStatus,
}

/// Player information in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyPlayer {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub ready: bool,
    pub connected: bool,
}

/// Room status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    Waiting,
    InGame,
    Finished,
}
