//! Game room management.

use nexus_core::{GameAction, GameConfig, GameSession, GameSnapshot, PlayerInfo, SetupError};
use thiserror::Error;
use uuid::Uuid;

use crate::protocol::{LobbyPlayer, RoomInfo, RoomStatus};

/// Player counts a lobby may start with
pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 4;

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Player not in room")]
    NotInRoom,

    #[error("Already in a room")]
    AlreadyInRoom,

    #[error("Room is full")]
    RoomFull,

    #[error("Game already started")]
    GameAlreadyStarted,

    #[error("Game not started")]
    GameNotStarted,

    #[error("Not your turn.")]
    NotYourTurn,

    /// The session refused the action; carries its status message
    #[error("{0}")]
    Rejected(String),

    #[error("Cannot start game: {0}")]
    Setup(#[from] SetupError),
}

/// A player in a game room.
#[derive(Debug, Clone)]
pub struct RoomPlayer {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub ready: bool,
    pub connected: bool,
}

impl RoomPlayer {
    pub fn new(id: Uuid, name: String, color: String) -> Self {
        Self {
            id,
            name,
            color,
            ready: false,
            connected: true,
        }
    }

    pub fn to_info(&self) -> LobbyPlayer {
        LobbyPlayer {
            id: self.id,
            name: self.name.clone(),
            color: self.color.clone(),
            ready: self.ready,
            connected: self.connected,
        }
    }

    fn to_player_info(&self) -> PlayerInfo {
        PlayerInfo::new(self.id.to_string(), self.name.clone(), self.color.clone())
    }
}

/// A lobby that turns into a running match once everyone is ready.
pub struct GameRoom {
    pub id: Uuid,
    pub status: RoomStatus,
    /// Members in join order
    pub players: Vec<RoomPlayer>,
    /// The game session (once started)
    pub game: Option<GameSession>,
}

impl GameRoom {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            status: RoomStatus::Waiting,
            players: Vec::new(),
            game: None,
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    pub fn contains(&self, player_id: Uuid) -> bool {
        self.players.iter().any(|p| p.id == player_id)
    }

    fn player_mut(&mut self, player_id: Uuid) -> Result<&mut RoomPlayer, RoomError> {
        self.players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or(RoomError::NotInRoom)
    }

    /// Add a member. Colors follow join position.
    pub fn add_player(&mut self, player_id: Uuid, name: String) -> Result<(), RoomError> {
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted);
        }
        if self.is_full() {
            return Err(RoomError::RoomFull);
        }

        let name = if name.trim().is_empty() {
            "Anonymous".to_string()
        } else {
            name
        };
        let color = PlayerInfo::lobby_color(self.players.len());
        self.players.push(RoomPlayer::new(player_id, name, color));
        Ok(())
    }

    /// Remove a member, returning whether the room is now empty
    pub fn remove_player(&mut self, player_id: Uuid) -> Result<bool, RoomError> {
        if !self.contains(player_id) {
            return Err(RoomError::NotInRoom);
        }

        self.players.retain(|p| p.id != player_id);
        Ok(self.players.is_empty())
    }

    pub fn set_player_connected(&mut self, player_id: Uuid, connected: bool) {
        if let Ok(player) = self.player_mut(player_id) {
            player.connected = connected;
        }
    }

    /// Flip a member's ready flag, returning the new value
    pub fn toggle_ready(&mut self, player_id: Uuid) -> Result<bool, RoomError> {
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted);
        }

        let player = self.player_mut(player_id)?;
        player.ready = !player.ready;
        Ok(player.ready)
    }

    /// Enough players and every one of them ready
    pub fn can_start(&self) -> bool {
        self.status == RoomStatus::Waiting
            && (MIN_PLAYERS..=MAX_PLAYERS).contains(&self.players.len())
            && self.players.iter().all(|p| p.ready)
    }

    pub fn start_game(&mut self, config: GameConfig) -> Result<(), RoomError> {
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted);
        }

        let roster = self.players.iter().map(RoomPlayer::to_player_info).collect();
        self.game = Some(GameSession::new(roster, config)?);
        self.status = RoomStatus::InGame;

        Ok(())
    }

    /// Run one action through the session.
    ///
    /// Successful actions hand the turn on unless they ended the game.
    pub fn apply_action(
        &mut self,
        player_id: Uuid,
        action: serde_json::Value,
    ) -> Result<(), RoomError> {
        if !self.contains(player_id) {
            return Err(RoomError::NotInRoom);
        }
        let game = self.game.as_mut().ok_or(RoomError::GameNotStarted)?;

        let actor = player_id.to_string();
        if game.current_player_id() != actor {
            return Err(RoomError::NotYourTurn);
        }

        if !game.submit_action(&actor, GameAction::from_json(action)) {
            return Err(RoomError::Rejected(game.message().to_string()));
        }

        if game.is_finished() {
            self.status = RoomStatus::Finished;
        } else {
            game.advance_turn();
        }

        Ok(())
    }

    pub fn snapshot(&self) -> Option<GameSnapshot> {
        self.game.as_ref().map(GameSession::snapshot)
    }

    /// Winner's ID and name
    pub fn winner(&self) -> Option<(String, String)> {
        let winner = self.game.as_ref()?.winner()?;
        Some((winner.id.clone(), winner.name.clone()))
    }

    pub fn to_info(&self) -> RoomInfo {
        RoomInfo {
            id: self.id,
            players: self.players.iter().map(RoomPlayer::to_info).collect(),
            status: self.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::HexCoord;
    use serde_json::json;

    fn ready_room(players: usize) -> (GameRoom, Vec<Uuid>) {
        let mut room = GameRoom::new(Uuid::new_v4());
        let ids: Vec<Uuid> = (0..players).map(|_| Uuid::new_v4()).collect();
        for (i, id) in ids.iter().enumerate() {
            room.add_player(*id, format!("Player {}", i + 1)).unwrap();
            room.toggle_ready(*id).unwrap();
        }
        (room, ids)
    }

    fn started_room() -> (GameRoom, Vec<Uuid>) {
        let (mut room, ids) = ready_room(2);
        room.start_game(GameConfig::with_radius(1)).unwrap();
        (room, ids)
    }

    fn current(room: &GameRoom) -> Uuid {
        let id = room.game.as_ref().unwrap().current_player_id();
        Uuid::parse_str(id).unwrap()
    }

    fn place_from_base(room: &GameRoom) -> serde_json::Value {
        let base = room.game.as_ref().unwrap().current_player().base;
        json!({
            "kind": "place",
            "cellA": {"q": base.q, "r": base.r},
            "cellB": {"q": HexCoord::CENTER.q, "r": HexCoord::CENTER.r},
        })
    }

    #[test]
    fn test_create_room() {
        let room = GameRoom::new(Uuid::new_v4());
        assert_eq!(room.player_count(), 0);
        assert!(!room.is_full());
        assert_eq!(room.status, RoomStatus::Waiting);
        assert!(!room.can_start());
    }

    #[test]
    fn test_join_assigns_colors() {
        let mut room = GameRoom::new(Uuid::new_v4());
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        room.add_player(a, "Ada".to_string()).unwrap();
        room.add_player(b, "  ".to_string()).unwrap();

        let info = room.to_info();
        assert_eq!(info.players[0].color, "hsl(0, 70%, 50%)");
        assert_eq!(info.players[1].color, "hsl(90, 70%, 50%)");
        assert_eq!(info.players[1].name, "Anonymous");
        assert!(!info.players[0].ready);
    }

    #[test]
    fn test_add_remove_players() {
        let (mut room, ids) = ready_room(4);
        assert!(room.is_full());
        assert!(matches!(
            room.add_player(Uuid::new_v4(), "Late".to_string()),
            Err(RoomError::RoomFull)
        ));

        assert!(!room.remove_player(ids[0]).unwrap());
        assert_eq!(room.player_count(), 3);
        assert!(matches!(room.remove_player(ids[0]), Err(RoomError::NotInRoom)));
    }

    #[test]
    fn test_ready_toggle_gates_start() {
        let mut room = GameRoom::new(Uuid::new_v4());
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        room.add_player(a, "A".to_string()).unwrap();
        assert!(room.toggle_ready(a).unwrap());
        // One player is never enough
        assert!(!room.can_start());

        room.add_player(b, "B".to_string()).unwrap();
        assert!(!room.can_start());
        assert!(room.toggle_ready(b).unwrap());
        assert!(room.can_start());

        assert!(!room.toggle_ready(a).unwrap());
        assert!(!room.can_start());
        assert!(matches!(
            room.toggle_ready(Uuid::new_v4()),
            Err(RoomError::NotInRoom)
        ));
    }

    #[test]
    fn test_start_game() {
        let (room, ids) = started_room();
        assert_eq!(room.status, RoomStatus::InGame);

        let snapshot = room.snapshot().unwrap();
        assert_eq!(snapshot.players.len(), 2);
        for id in &ids {
            assert!(snapshot.players.iter().any(|p| p.id == id.to_string()));
        }
        assert!(ids.contains(&current(&room)));
    }

    #[test]
    fn test_started_room_is_closed() {
        let (mut room, ids) = started_room();
        assert!(matches!(
            room.add_player(Uuid::new_v4(), "Late".to_string()),
            Err(RoomError::GameAlreadyStarted)
        ));
        assert!(matches!(
            room.toggle_ready(ids[0]),
            Err(RoomError::GameAlreadyStarted)
        ));
        assert!(matches!(
            room.start_game(GameConfig::default()),
            Err(RoomError::GameAlreadyStarted)
        ));
    }

    #[test]
    fn test_action_before_start() {
        let (mut room, ids) = ready_room(2);
        assert!(matches!(
            room.apply_action(ids[0], json!({"kind": "place"})),
            Err(RoomError::GameNotStarted)
        ));
        assert!(matches!(
            room.apply_action(Uuid::new_v4(), json!({})),
            Err(RoomError::NotInRoom)
        ));
    }

    #[test]
    fn test_action_out_of_turn() {
        let (mut room, ids) = started_room();
        let actor = current(&room);
        let idle = *ids.iter().find(|id| **id != actor).unwrap();

        let err = room.apply_action(idle, place_from_base(&room)).unwrap_err();
        assert_eq!(err.to_string(), "Not your turn.");
    }

    #[test]
    fn test_rejected_action_keeps_turn() {
        let (mut room, _) = started_room();
        let actor = current(&room);

        let err = room
            .apply_action(actor, json!({"kind": "teleport"}))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid action type.");
        assert_eq!(current(&room), actor);
        assert_eq!(room.snapshot().unwrap().turn_number, 1);
    }

    #[test]
    fn test_successful_action_advances_turn() {
        let (mut room, _) = started_room();
        let actor = current(&room);

        room.apply_action(actor, place_from_base(&room)).unwrap();

        let snapshot = room.snapshot().unwrap();
        assert_ne!(current(&room), actor);
        assert_eq!(snapshot.turn_number, 2);
        assert_eq!(snapshot.board.conduits.len(), 1);
        assert_eq!(snapshot.board.conduits[0].owner, actor.to_string());
        assert_eq!(room.status, RoomStatus::InGame);
        assert_eq!(room.winner(), None);
    }

    #[test]
    fn test_disconnect_marks_player() {
        let (mut room, ids) = started_room();
        room.set_player_connected(ids[1], false);
        let info = room.to_info();
        assert!(info.players[0].connected);
        assert!(!info.players[1].connected);
    }
}
