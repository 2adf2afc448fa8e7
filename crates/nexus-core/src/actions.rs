//! Game actions that players can take.
//!
//! This module defines the three conduit actions and the events that result
//! from them. Actions arrive as kind-tagged JSON:
//!
//! ```json
//! {"kind": "place", "cellA": {"q": -1, "r": 0}, "cellB": {"q": 0, "r": 0}}
//! ```

use crate::board::PlayerId;
use crate::config::GameConfig;
use crate::hex::{EdgeCoord, HexCoord};
use serde::{Deserialize, Serialize};

/// All possible actions a player can take
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum GameAction {
    /// Build a conduit on an empty edge next to your network
    #[serde(rename = "place")]
    PlaceConduit {
        #[serde(rename = "cellA", alias = "cell_a")]
        cell_a: HexCoord,
        #[serde(rename = "cellB", alias = "cell_b")]
        cell_b: HexCoord,
    },
    /// Make one of your conduits immune to sabotage
    #[serde(rename = "reinforce")]
    ReinforceConduit {
        #[serde(rename = "cellA", alias = "cell_a")]
        cell_a: HexCoord,
        #[serde(rename = "cellB", alias = "cell_b")]
        cell_b: HexCoord,
    },
    /// Destroy an opponent's unreinforced conduit
    #[serde(rename = "sabotage")]
    SabotageConduit {
        #[serde(rename = "cellA", alias = "cell_a")]
        cell_a: HexCoord,
        #[serde(rename = "cellB", alias = "cell_b")]
        cell_b: HexCoord,
    },
    /// Any kind tag the engine does not recognise
    #[serde(other)]
    Unknown,
}

impl GameAction {
    pub fn place(a: HexCoord, b: HexCoord) -> Self {
        GameAction::PlaceConduit { cell_a: a, cell_b: b }
    }

    pub fn reinforce(a: HexCoord, b: HexCoord) -> Self {
        GameAction::ReinforceConduit { cell_a: a, cell_b: b }
    }

    pub fn sabotage(a: HexCoord, b: HexCoord) -> Self {
        GameAction::SabotageConduit { cell_a: a, cell_b: b }
    }

    /// Decode a client payload. Anything malformed becomes `Unknown`.
    pub fn from_json(value: serde_json::Value) -> Self {
        serde_json::from_value(value).unwrap_or(GameAction::Unknown)
    }

    /// Decode a client payload from text. Anything malformed becomes `Unknown`.
    pub fn from_json_str(text: &str) -> Self {
        serde_json::from_str(text).unwrap_or(GameAction::Unknown)
    }

    /// The two cells named by the action, as given
    pub fn cells(&self) -> Option<(HexCoord, HexCoord)> {
        match self {
            GameAction::PlaceConduit { cell_a, cell_b }
            | GameAction::ReinforceConduit { cell_a, cell_b }
            | GameAction::SabotageConduit { cell_a, cell_b } => Some((*cell_a, *cell_b)),
            GameAction::Unknown => None,
        }
    }

    /// The targeted edge in canonical form
    pub fn edge(&self) -> Option<EdgeCoord> {
        self.cells().map(|(a, b)| EdgeCoord::new(a, b))
    }

    /// Action point price under `config`
    pub fn cost(&self, config: &GameConfig) -> Option<u32> {
        match self {
            GameAction::PlaceConduit { .. } => Some(config.place_cost),
            GameAction::ReinforceConduit { .. } => Some(config.reinforce_cost),
            GameAction::SabotageConduit { .. } => Some(config.sabotage_cost),
            GameAction::Unknown => None,
        }
    }
}

/// Events that occur as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// A conduit was built
    ConduitPlaced { player: PlayerId, edge: EdgeCoord },

    /// A conduit was reinforced
    ConduitReinforced { player: PlayerId, edge: EdgeCoord },

    /// An opponent's conduit was destroyed
    ConduitSabotaged {
        player: PlayerId,
        victim: PlayerId,
        edge: EdgeCoord,
    },

    /// A player's turn began
    TurnStarted {
        player: PlayerId,
        turn_number: u32,
        action_points: u32,
    },

    /// A player won the game
    GameWon {
        player: PlayerId,
        controlled_resources: usize,
    },
}
