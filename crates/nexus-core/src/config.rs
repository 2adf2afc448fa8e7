//! Tunable game balance.

use serde::{Deserialize, Serialize};

/// Distance from the center to the outer ring of the board
pub const GRID_RADIUS: u32 = 4;

/// Action points every player gets at the start of their turn
pub const BASE_AP_PER_TURN: u32 = 4;

/// Extra action points per controlled resource node
pub const RESOURCE_BONUS_AP: u32 = 1;

/// Controlled resource nodes needed (together with a Nexus link) to win
pub const WIN_CONDITION_RESOURCES: usize = 3;

pub const COST_PLACE_CONDUIT: u32 = 1;
pub const COST_REINFORCE_CONDUIT: u32 = 2;
pub const COST_SABOTAGE_CONDUIT: u32 = 3;

/// Lower bound on resource nodes seeded on the board
pub const MIN_RESOURCE_NODES: usize = 9;

/// Resource nodes seeded per player when that exceeds the minimum
pub const RESOURCE_NODES_PER_PLAYER: usize = 3;

/// Rules and balance knobs for one game session.
///
/// Missing fields fall back to the defaults above when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub grid_radius: u32,
    pub base_action_points: u32,
    pub resource_bonus_action_points: u32,
    pub win_condition_resources: usize,
    pub place_cost: u32,
    pub reinforce_cost: u32,
    pub sabotage_cost: u32,
    pub min_resource_nodes: usize,
    pub resource_nodes_per_player: usize,
}

impl GameConfig {
    /// Default rules on a board of a different size
    pub fn with_radius(grid_radius: u32) -> Self {
        Self {
            grid_radius,
            ..Self::default()
        }
    }

    /// How many resource nodes a board for `player_count` players wants
    pub fn resource_node_target(&self, player_count: usize) -> usize {
        self.min_resource_nodes
            .max(player_count * self.resource_nodes_per_player)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_radius: GRID_RADIUS,
            base_action_points: BASE_AP_PER_TURN,
            resource_bonus_action_points: RESOURCE_BONUS_AP,
            win_condition_resources: WIN_CONDITION_RESOURCES,
            place_cost: COST_PLACE_CONDUIT,
            reinforce_cost: COST_REINFORCE_CONDUIT,
            sabotage_cost: COST_SABOTAGE_CONDUIT,
            min_resource_nodes: MIN_RESOURCE_NODES,
            resource_nodes_per_player: RESOURCE_NODES_PER_PLAYER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: GameConfig = serde_json::from_str(r#"{"grid_radius": 2}"#).unwrap();
        assert_eq!(config.grid_radius, 2);
        assert_eq!(config.base_action_points, BASE_AP_PER_TURN);
        assert_eq!(config.sabotage_cost, COST_SABOTAGE_CONDUIT);
    }

    #[test]
    fn test_resource_node_target() {
        let config = GameConfig::default();
        assert_eq!(config.resource_node_target(2), 9);
        assert_eq!(config.resource_node_target(4), 12);
    }
}
