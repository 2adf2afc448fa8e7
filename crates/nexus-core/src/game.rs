//! Core game state machine.
//!
//! This module contains the `GameSession` struct: turn order, action
//! validation and application, win detection and the client snapshot.

use crate::actions::{GameAction, GameEvent};
use crate::board::{Board, BoardJson, PlayerId};
use crate::config::GameConfig;
use crate::economy::action_points_for_turn;
use crate::hex::{EdgeCoord, HexCoord};
use crate::network::{controlled_resources, is_connected};
use crate::player::{Player, PlayerInfo};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;

/// Game phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Players are taking turns
    InProgress,

    /// Game is over
    Finished { winner: PlayerId },
}

/// Reasons an action is rejected.
///
/// None of these are faults: the session is left exactly as it was and the
/// message is meant to be shown to the acting player.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Not your turn.")]
    NotYourTurn,

    #[error("The game is already over.")]
    GameOver,

    #[error("Invalid action type.")]
    UnknownAction,

    #[error("Not enough AP: need {required}, have {available}.")]
    InsufficientActionPoints { required: u32, available: u32 },

    #[error("A conduit already exists there.")]
    ConduitExists,

    #[error("Cells are not adjacent.")]
    NotAdjacent,

    #[error("Must place conduits adjacent to your existing network.")]
    NotConnectedToNetwork,

    #[error("You can only reinforce your own conduits.")]
    NotOwned,

    #[error("Conduit is already reinforced.")]
    AlreadyReinforced,

    #[error("Cannot sabotage your own or non-existent conduits.")]
    InvalidSabotageTarget,

    #[error("Cannot sabotage a reinforced conduit.")]
    TargetReinforced,
}

/// Reasons a session cannot be created
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("A game needs at least one player")]
    NoPlayers,

    #[error("Player {0} joined twice")]
    DuplicatePlayer(PlayerId),

    #[error("Grid radius must be at least 1")]
    InvalidRadius,

    #[error("{players} players do not fit on {edge_cells} edge cells")]
    TooManyPlayers { players: usize, edge_cells: usize },

    #[error("No base cell was assigned to player {0}")]
    MissingBase(PlayerId),
}

/// One running match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    board: Board,
    /// Players in turn order
    players: Vec<Player>,
    config: GameConfig,
    /// Index into `players`
    current_player: usize,
    phase: GamePhase,
    /// Turn number (starts at 1)
    turn_number: u32,
    /// Last human-readable status
    message: String,
}

impl GameSession {
    /// Create a session using the thread-local random source
    pub fn new(players: Vec<PlayerInfo>, config: GameConfig) -> Result<Self, SetupError> {
        let mut rng = rand::thread_rng();
        Self::with_rng(players, config, &mut rng)
    }

    /// Create a session with a provided RNG.
    ///
    /// The board is generated with bases assigned in the given player order,
    /// then turn order is shuffled once and the first turn starts.
    pub fn with_rng<R: Rng + ?Sized>(
        players: Vec<PlayerInfo>,
        config: GameConfig,
        rng: &mut R,
    ) -> Result<Self, SetupError> {
        Self::validate_roster(&players, &config)?;

        let ids: Vec<PlayerId> = players.iter().map(|p| p.id.clone()).collect();
        let board = Board::generate(&config, &ids, rng);

        let mut players = players
            .into_iter()
            .map(|info| {
                let base = board
                    .base_of(&info.id)
                    .ok_or_else(|| SetupError::MissingBase(info.id.clone()))?;
                Ok(Player::new(info, base))
            })
            .collect::<Result<Vec<_>, SetupError>>()?;

        // Randomize turn order
        players.shuffle(rng);

        let mut session = Self {
            board,
            players,
            config,
            current_player: 0,
            phase: GamePhase::InProgress,
            turn_number: 0,
            message: "Game has started!".to_string(),
        };
        session.start_turn();

        Ok(session)
    }

    fn validate_roster(players: &[PlayerInfo], config: &GameConfig) -> Result<(), SetupError> {
        if players.is_empty() {
            return Err(SetupError::NoPlayers);
        }
        if config.grid_radius == 0 {
            return Err(SetupError::InvalidRadius);
        }

        let mut seen = HashSet::new();
        for player in players {
            if !seen.insert(player.id.as_str()) {
                return Err(SetupError::DuplicatePlayer(player.id.clone()));
            }
        }

        // Outer ring of a hex grid has 6R cells
        let edge_cells = 6 * config.grid_radius as usize;
        if players.len() > edge_cells {
            return Err(SetupError::TooManyPlayers {
                players: players.len(),
                edge_cells,
            });
        }

        Ok(())
    }

    // ==================== Accessors ====================

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// All players in turn order
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> &GamePhase {
        &self.phase
    }

    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    /// Status line describing the last thing that happened
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// The player who must act next
    pub fn current_player(&self) -> &Player {
        &self.players[self.current_player]
    }

    pub fn current_player_id(&self) -> &str {
        &self.current_player().id
    }

    pub fn get_player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    fn current_player_mut(&mut self) -> &mut Player {
        &mut self.players[self.current_player]
    }

    /// Check if the game is finished
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, GamePhase::Finished { .. })
    }

    /// Get the winner if the game is finished
    pub fn winner(&self) -> Option<&Player> {
        match &self.phase {
            GamePhase::Finished { winner } => self.get_player(winner),
            GamePhase::InProgress => None,
        }
    }

    // ==================== Network Queries ====================

    /// Resource nodes linked to the player's base right now
    pub fn controlled_resources(&self, player: &str) -> BTreeSet<HexCoord> {
        controlled_resources(&self.board, player)
    }

    /// Whether the player's base is linked to the Nexus
    pub fn is_connected_to_nexus(&self, player: &str) -> bool {
        self.board
            .base_of(player)
            .is_some_and(|base| is_connected(&self.board, player, base, HexCoord::CENTER))
    }

    /// Nexus link plus enough controlled resources
    pub fn check_win_condition(&self, player: &str) -> bool {
        self.is_connected_to_nexus(player)
            && self.controlled_resources(player).len() >= self.config.win_condition_resources
    }

    // ==================== Turn Management ====================

    /// Begin the current player's turn: bump the counter and refill their AP
    fn start_turn(&mut self) -> GameEvent {
        self.turn_number += 1;

        let action_points =
            action_points_for_turn(&self.config, &self.board, self.current_player_id());
        let player = self.current_player_mut();
        player.action_points = action_points;

        let (player_id, name) = (player.id.clone(), player.name.clone());
        self.message = format!("{}'s turn. AP: {}", name, action_points);

        GameEvent::TurnStarted {
            player: player_id,
            turn_number: self.turn_number,
            action_points,
        }
    }

    /// Hand the turn to the next player. Does nothing once the game is over.
    pub fn advance_turn(&mut self) -> Option<GameEvent> {
        if self.is_finished() {
            return None;
        }

        self.current_player = (self.current_player + 1) % self.players.len();
        Some(self.start_turn())
    }

    // ==================== Actions ====================

    /// Submit an action, reporting only success.
    ///
    /// On failure the reason is left in [`GameSession::message`]. After a
    /// success that did not end the game the caller is expected to call
    /// [`GameSession::advance_turn`].
    pub fn submit_action(&mut self, actor: &str, action: GameAction) -> bool {
        match self.apply_action(actor, action) {
            Ok(_) => true,
            Err(e) => {
                self.message = e.to_string();
                false
            }
        }
    }

    /// Validate and apply an action for `actor`.
    ///
    /// On error nothing about the session changes. On success the acting
    /// player's win condition is checked; a win finishes the game.
    pub fn apply_action(
        &mut self,
        actor: &str,
        action: GameAction,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.is_finished() {
            return Err(GameError::GameOver);
        }
        if self.current_player_id() != actor {
            return Err(GameError::NotYourTurn);
        }

        let event = match action {
            GameAction::PlaceConduit { cell_a, cell_b } => self.place_conduit(cell_a, cell_b)?,
            GameAction::ReinforceConduit { cell_a, cell_b } => {
                self.reinforce_conduit(EdgeCoord::new(cell_a, cell_b))?
            }
            GameAction::SabotageConduit { cell_a, cell_b } => {
                self.sabotage_conduit(EdgeCoord::new(cell_a, cell_b))?
            }
            GameAction::Unknown => return Err(GameError::UnknownAction),
        };

        let mut events = vec![event];
        events.extend(self.check_for_winner());
        Ok(events)
    }

    fn ensure_affordable(&self, cost: u32) -> Result<(), GameError> {
        let player = self.current_player();
        if player.can_afford(cost) {
            Ok(())
        } else {
            Err(GameError::InsufficientActionPoints {
                required: cost,
                available: player.action_points,
            })
        }
    }

    /// Deduct an already-checked cost
    fn charge(&mut self, cost: u32) {
        let paid = self.current_player_mut().spend(cost);
        debug_assert!(paid, "cost checked before validation");
    }

    fn place_conduit(&mut self, a: HexCoord, b: HexCoord) -> Result<GameEvent, GameError> {
        let cost = self.config.place_cost;
        self.ensure_affordable(cost)?;

        let edge = EdgeCoord::new(a, b);
        if self.board.get_conduit(&edge).is_some() {
            return Err(GameError::ConduitExists);
        }
        if !self.board.grid().are_adjacent(&a, &b) {
            return Err(GameError::NotAdjacent);
        }
        if !self.board.touches_network(self.current_player_id(), &edge) {
            return Err(GameError::NotConnectedToNetwork);
        }

        self.charge(cost);
        let player = self.current_player();
        let (player_id, name) = (player.id.clone(), player.name.clone());
        self.board.place_conduit(edge, player_id.clone());
        self.message = format!("{} placed a conduit.", name);

        Ok(GameEvent::ConduitPlaced {
            player: player_id,
            edge,
        })
    }

    fn reinforce_conduit(&mut self, edge: EdgeCoord) -> Result<GameEvent, GameError> {
        let cost = self.config.reinforce_cost;
        self.ensure_affordable(cost)?;

        let conduit = self
            .board
            .get_conduit(&edge)
            .filter(|c| c.is_owned_by(self.current_player_id()))
            .ok_or(GameError::NotOwned)?;
        if conduit.reinforced {
            return Err(GameError::AlreadyReinforced);
        }

        self.charge(cost);
        self.board.reinforce_conduit(&edge);
        let player = self.current_player();
        let (player_id, name) = (player.id.clone(), player.name.clone());
        self.message = format!("{} reinforced a conduit.", name);

        Ok(GameEvent::ConduitReinforced {
            player: player_id,
            edge,
        })
    }

    fn sabotage_conduit(&mut self, edge: EdgeCoord) -> Result<GameEvent, GameError> {
        let cost = self.config.sabotage_cost;
        self.ensure_affordable(cost)?;

        let conduit = self
            .board
            .get_conduit(&edge)
            .filter(|c| !c.is_owned_by(self.current_player_id()))
            .ok_or(GameError::InvalidSabotageTarget)?;
        if conduit.reinforced {
            return Err(GameError::TargetReinforced);
        }

        self.charge(cost);
        let victim = self
            .board
            .remove_conduit(&edge)
            .map(|c| c.owner)
            .unwrap_or_default();
        let player = self.current_player();
        let (player_id, name) = (player.id.clone(), player.name.clone());
        self.message = format!("{} sabotaged an opponent's conduit.", name);

        Ok(GameEvent::ConduitSabotaged {
            player: player_id,
            victim,
            edge,
        })
    }

    /// Only the acting player can win on their own action
    fn check_for_winner(&mut self) -> Option<GameEvent> {
        let player = self.current_player();
        if !self.check_win_condition(&player.id) {
            return None;
        }

        let (winner, name) = (player.id.clone(), player.name.clone());
        let controlled = self.controlled_resources(&winner).len();
        self.message = format!("Game Over! {} has connected to the Nexus and wins!", name);
        self.phase = GamePhase::Finished {
            winner: winner.clone(),
        };

        Some(GameEvent::GameWon {
            player: winner,
            controlled_resources: controlled,
        })
    }

    /// Get all currently valid actions for a player
    pub fn valid_actions(&self, player: &str) -> Vec<GameAction> {
        if self.is_finished() || self.current_player_id() != player {
            return Vec::new();
        }

        let budget = self.current_player().action_points;
        self.board
            .grid()
            .edges()
            .into_iter()
            .filter_map(|edge| {
                let [a, b] = edge.endpoints();
                let action = match self.board.get_conduit(&edge) {
                    None if self.board.touches_network(player, &edge) => GameAction::place(a, b),
                    None => return None,
                    Some(conduit) if conduit.reinforced => return None,
                    Some(conduit) if conduit.is_owned_by(player) => GameAction::reinforce(a, b),
                    Some(_) => GameAction::sabotage(a, b),
                };
                let cost = action.cost(&self.config)?;
                (cost <= budget).then_some(action)
            })
            .collect()
    }

    // ==================== Serialization ====================

    /// Everything a client needs to render the game
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            players: self
                .players
                .iter()
                .map(|p| PlayerSnapshot {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    color: p.color.clone(),
                    action_points: p.action_points,
                    base: p.base,
                    controlled_resources: self.controlled_resources(&p.id).len(),
                })
                .collect(),
            board: self.board.to_json_friendly(),
            turn_number: self.turn_number,
            current_player_id: self.current_player_id().to_string(),
            game_over: self.is_finished(),
            winner: self.winner().map(|p| p.id.clone()),
            message: self.message.clone(),
        }
    }
}

/// Full game state as sent to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Players in turn order
    pub players: Vec<PlayerSnapshot>,
    pub board: BoardJson,
    pub turn_number: u32,
    pub current_player_id: PlayerId,
    pub game_over: bool,
    pub winner: Option<PlayerId>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
    pub action_points: u32,
    pub base: HexCoord,
    pub controlled_resources: usize,
}
