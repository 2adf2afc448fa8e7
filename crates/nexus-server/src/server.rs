//! WebSocket server and connection handling.

use crate::protocol::{ClientMessage, RoomInfo, RoomStatus, ServerMessage};
use crate::room::{GameRoom, RoomError};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use nexus_core::GameConfig;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Server state shared across all connections.
///
/// Each room sits behind its DashMap entry lock, so a session only ever
/// handles one action at a time. Lock order is waiting lobby, then room.
pub struct ServerState {
    /// All active rooms
    pub rooms: DashMap<Uuid, GameRoom>,
    /// Mapping from player ID to their room ID
    pub player_rooms: DashMap<Uuid, Uuid>,
    /// Mapping from player ID to their message sender
    pub player_senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
    /// The lobby new players join
    waiting_room: Mutex<Uuid>,
    /// Rules for new games
    game_config: GameConfig,
}

impl ServerState {
    pub fn new(game_config: GameConfig) -> Self {
        let waiting = Uuid::new_v4();
        let rooms = DashMap::new();
        rooms.insert(waiting, GameRoom::new(waiting));

        Self {
            rooms,
            player_rooms: DashMap::new(),
            player_senders: DashMap::new(),
            waiting_room: Mutex::new(waiting),
            game_config,
        }
    }

    fn lock_waiting_room(&self) -> MutexGuard<'_, Uuid> {
        self.waiting_room
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Send a message to a specific player.
    pub fn send_to_player(&self, player_id: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.player_senders.get(&player_id) {
            let _ = sender.send(msg);
        }
    }

    /// Send a message to a list of players.
    pub fn send_to_players(&self, players: &[Uuid], msg: ServerMessage) {
        for player_id in players {
            self.send_to_player(*player_id, msg.clone());
        }
    }

    /// Broadcast a message to all players in a room.
    pub fn broadcast_to_room(&self, room_id: Uuid, msg: ServerMessage) {
        let members = self.room_members(room_id);
        self.send_to_players(&members, msg);
    }

    fn room_members(&self, room_id: Uuid) -> Vec<Uuid> {
        self.rooms
            .get(&room_id)
            .map(|room| room.players.iter().map(|p| p.id).collect())
            .unwrap_or_default()
    }

    /// Get list of waiting rooms.
    pub fn get_waiting_rooms(&self) -> Vec<RoomInfo> {
        self.rooms
            .iter()
            .filter(|r| r.status == RoomStatus::Waiting)
            .map(|r| r.to_info())
            .collect()
    }

    /// Replace the waiting lobby with a fresh, empty one
    fn open_waiting_room(&self, waiting: &mut Uuid) {
        let fresh = Uuid::new_v4();
        self.rooms.insert(fresh, GameRoom::new(fresh));
        *waiting = fresh;
        debug!("Opened waiting lobby {}", fresh);
    }

    /// Put `player_id` in the current waiting lobby, opening another once it is full
    fn join_lobby(&self, player_id: Uuid, name: String) -> Result<RoomInfo, RoomError> {
        if self.player_rooms.contains_key(&player_id) {
            return Err(RoomError::AlreadyInRoom);
        }

        let mut waiting = self.lock_waiting_room();
        let full = self
            .rooms
            .get(&*waiting)
            .map_or(true, |room| room.is_full());
        if full {
            self.open_waiting_room(&mut waiting);
        }

        let mut room = self.rooms.get_mut(&*waiting).ok_or(RoomError::NotInRoom)?;
        room.add_player(player_id, name)?;
        self.player_rooms.insert(player_id, room.id);
        Ok(room.to_info())
    }

    /// Toggle readiness; starts the game and opens a new lobby when everyone is ready.
    fn toggle_ready(
        &self,
        player_id: Uuid,
    ) -> Result<(RoomInfo, Option<ServerMessage>), RoomError> {
        let room_id = *self.player_rooms.get(&player_id).ok_or(RoomError::NotInRoom)?;

        let mut waiting = self.lock_waiting_room();
        let mut room = self.rooms.get_mut(&room_id).ok_or(RoomError::NotInRoom)?;
        room.toggle_ready(player_id)?;

        let mut started = None;
        if room.can_start() {
            room.start_game(self.game_config.clone())?;
            if let Some(state) = room.snapshot() {
                started = Some(ServerMessage::GameStarted { state });
            }
            info!("Room {} started with {} players", room_id, room.player_count());

            if *waiting == room_id {
                // Entry guard must be released before inserting into the same map
                let info = room.to_info();
                drop(room);
                self.open_waiting_room(&mut waiting);
                return Ok((info, started));
            }
        }

        Ok((room.to_info(), started))
    }
}

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Nexus Miners server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
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
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Assign a player ID
    let player_id = Uuid::new_v4();

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.player_senders.insert(player_id, tx);

    // Send welcome message
    let welcome = ServerMessage::Welcome { player_id };
    let msg_text = serde_json::to_string(&welcome)?;
    ws_sender.send(Message::Text(msg_text.into())).await?;

    // Forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(text) => {
                    if ws_sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => error!("Failed to serialize message for {}: {}", player_id, e),
            }
        }
    });

    // Handle incoming messages
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_message(player_id, client_msg, &state),
                Err(e) => {
                    warn!("Invalid message from {}: {}", player_id, e);
                    state.send_to_player(
                        player_id,
                        ServerMessage::Error {
                            message: format!("Invalid message: {}", e),
                        },
                    );
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", player_id);
                break;
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", player_id, e);
                break;
            }
            _ => {}
        }
    }

    // Clean up on disconnect
    handle_disconnect(player_id, &state);
    state.player_senders.remove(&player_id);
    send_task.abort();

    info!("Connection closed for {}", player_id);
    Ok(())
}

fn send_error(state: &ServerState, player_id: Uuid, e: RoomError) {
    state.send_to_player(
        player_id,
        ServerMessage::Error {
            message: e.to_string(),
        },
    );
}

/// Handle a client message.
fn handle_message(player_id: Uuid, msg: ClientMessage, state: &Arc<ServerState>) {
    match msg {
        ClientMessage::JoinLobby { name } => match state.join_lobby(player_id, name) {
            Ok(room) => {
                info!("Player {} joined lobby {}", player_id, room.id);
                let room_id = room.id;
                state.broadcast_to_room(room_id, ServerMessage::LobbyUpdate { room });
            }
            Err(e) => send_error(state, player_id, e),
        },

        ClientMessage::ToggleReady => match state.toggle_ready(player_id) {
            Ok((room, started)) => {
                let room_id = room.id;
                state.broadcast_to_room(room_id, ServerMessage::LobbyUpdate { room });
                if let Some(msg) = started {
                    state.broadcast_to_room(room_id, msg);
                }
            }
            Err(e) => send_error(state, player_id, e),
        },

        ClientMessage::GameAction { action } => {
            let Some(room_id) = state.player_rooms.get(&player_id).map(|r| *r) else {
                send_error(state, player_id, RoomError::NotInRoom);
                return;
            };
            let Some(mut room) = state.rooms.get_mut(&room_id) else {
                send_error(state, player_id, RoomError::NotInRoom);
                return;
            };

            match room.apply_action(player_id, action) {
                Ok(()) => {
                    let snapshot = room.snapshot();
                    let winner = room.winner();
                    let members: Vec<Uuid> = room.players.iter().map(|p| p.id).collect();
                    drop(room);

                    if let Some(state_snapshot) = snapshot {
                        state.send_to_players(
                            &members,
                            ServerMessage::GameUpdate {
                                state: state_snapshot,
                            },
                        );
                    }

                    if let Some((winner, winner_name)) = winner {
                        info!("Room {} won by {}", room_id, winner_name);
                        state.send_to_players(
                            &members,
                            ServerMessage::GameOver {
                                winner,
                                winner_name,
                            },
                        );
                    }
                }
                Err(e) => {
                    drop(room);
                    debug!("Action from {} rejected: {}", player_id, e);
                    state.send_to_player(
                        player_id,
                        ServerMessage::ActionError {
                            message: e.to_string(),
                        },
                    );
                }
            }
        }

        ClientMessage::ListRooms => {
            let rooms = state.get_waiting_rooms();
            state.send_to_player(player_id, ServerMessage::RoomList { rooms });
        }

        ClientMessage::Ping => {
            state.send_to_player(player_id, ServerMessage::Pong);
        }
    }
}

/// Handle player disconnect.
fn handle_disconnect(player_id: Uuid, state: &Arc<ServerState>) {
    let Some((_, room_id)) = state.player_rooms.remove(&player_id) else {
        return;
    };

    let waiting = state.lock_waiting_room();
    let Some(mut room) = state.rooms.get_mut(&room_id) else {
        return;
    };

    if room.status == RoomStatus::Waiting {
        // Lobby members simply leave
        let is_empty = room.remove_player(player_id).unwrap_or(false);
        let room_info = room.to_info();
        drop(room);

        if is_empty && *waiting != room_id {
            state.rooms.remove(&room_id);
        } else {
            drop(waiting);
            state.broadcast_to_room(room_id, ServerMessage::LobbyUpdate { room: room_info });
        }
    } else {
        // The session carries on without them
        room.set_player_connected(player_id, false);
        let all_gone = room.players.iter().all(|p| !p.connected);
        let room_info = room.to_info();
        drop(room);
        drop(waiting);

        if all_gone {
            info!("Closing abandoned room {}", room_id);
            state.rooms.remove(&room_id);
        } else {
            state.broadcast_to_room(room_id, ServerMessage::LobbyUpdate { room: room_info });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::MAX_PLAYERS;

    fn connect(state: &ServerState) -> (Uuid, mpsc::UnboundedReceiver<ServerMessage>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        state.player_senders.insert(id, tx);
        (id, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    #[test]
    fn test_lobby_rotates_when_game_starts() {
        let state = Arc::new(ServerState::new(GameConfig::with_radius(2)));
        let first_lobby = *state.lock_waiting_room();
        let (a, mut rx_a) = connect(&state);
        let (b, _rx_b) = connect(&state);

        handle_message(a, ClientMessage::JoinLobby { name: "A".into() }, &state);
        handle_message(b, ClientMessage::JoinLobby { name: "B".into() }, &state);
        handle_message(a, ClientMessage::ToggleReady, &state);
        handle_message(b, ClientMessage::ToggleReady, &state);

        assert!(drain(&mut rx_a)
            .iter()
            .any(|m| matches!(m, ServerMessage::GameStarted { .. })));
        assert_ne!(*state.lock_waiting_room(), first_lobby);
        assert_eq!(
            state.rooms.get(&first_lobby).unwrap().status,
            RoomStatus::InGame
        );

        // Newcomers land in the fresh lobby
        let (c, _rx_c) = connect(&state);
        handle_message(c, ClientMessage::JoinLobby { name: "C".into() }, &state);
        assert_eq!(*state.player_rooms.get(&c).unwrap(), *state.lock_waiting_room());
    }

    #[test]
    fn test_out_of_turn_action_only_reaches_actor() {
        let state = Arc::new(ServerState::new(GameConfig::with_radius(1)));
        let (a, mut rx_a) = connect(&state);
        let (b, mut rx_b) = connect(&state);
        for (id, name) in [(a, "A"), (b, "B")] {
            handle_message(id, ClientMessage::JoinLobby { name: name.into() }, &state);
            handle_message(id, ClientMessage::ToggleReady, &state);
        }
        drain(&mut rx_a);
        drain(&mut rx_b);

        let room_id = *state.player_rooms.get(&a).unwrap();
        let current = state
            .rooms
            .get(&room_id)
            .unwrap()
            .game
            .as_ref()
            .unwrap()
            .current_player_id()
            .to_string();
        let (idle, rx_idle, rx_other) = if current == a.to_string() {
            (b, &mut rx_b, &mut rx_a)
        } else {
            (a, &mut rx_a, &mut rx_b)
        };

        handle_message(
            idle,
            ClientMessage::GameAction {
                action: serde_json::json!({"kind": "place"}),
            },
            &state,
        );

        match drain(rx_idle).as_slice() {
            [ServerMessage::ActionError { message }] => assert_eq!(message, "Not your turn."),
            other => panic!("unexpected messages {:?}", other),
        }
        assert!(drain(rx_other).is_empty());
    }

    #[test]
    fn test_full_lobby_opens_another() {
        let state = Arc::new(ServerState::new(GameConfig::default()));
        let first_lobby = *state.lock_waiting_room();
        for i in 0..MAX_PLAYERS {
            let (id, _rx) = connect(&state);
            handle_message(id, ClientMessage::JoinLobby { name: format!("P{}", i) }, &state);
        }
        assert_eq!(*state.lock_waiting_room(), first_lobby);

        let (late, mut rx_late) = connect(&state);
        handle_message(late, ClientMessage::JoinLobby { name: "Late".into() }, &state);

        let second_lobby = *state.lock_waiting_room();
        assert_ne!(second_lobby, first_lobby);
        assert_eq!(*state.player_rooms.get(&late).unwrap(), second_lobby);
        match drain(&mut rx_late).as_slice() {
            [ServerMessage::LobbyUpdate { room }] => {
                assert_eq!(room.id, second_lobby);
                assert_eq!(room.players.len(), 1);
            }
            other => panic!("unexpected messages {:?}", other),
        }

        // The full lobby keeps its members and can still start
        let full = state.rooms.get(&first_lobby).unwrap();
        assert_eq!(full.player_count(), MAX_PLAYERS);
        assert_eq!(full.status, RoomStatus::Waiting);
        drop(full);
        assert_eq!(state.get_waiting_rooms().len(), 2);
    }

    #[test]
    fn test_disconnect_from_lobby() {
        let state = Arc::new(ServerState::new(GameConfig::default()));
        let (a, _rx_a) = connect(&state);
        let (b, mut rx_b) = connect(&state);
        handle_message(a, ClientMessage::JoinLobby { name: "A".into() }, &state);
        handle_message(b, ClientMessage::JoinLobby { name: "B".into() }, &state);
        drain(&mut rx_b);

        handle_disconnect(a, &state);
        match drain(&mut rx_b).as_slice() {
            [ServerMessage::LobbyUpdate { room }] => {
                assert_eq!(room.players.len(), 1);
                assert_eq!(room.players[0].id, b);
            }
            other => panic!("unexpected messages {:?}", other),
        }
        assert!(state.player_rooms.get(&a).is_none());
    }
}
