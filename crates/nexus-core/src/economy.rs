//! Per-turn action point budget.

use crate::board::Board;
use crate::config::GameConfig;
use crate::network::controlled_resources;

/// Action points for a player controlling `controlled` resource nodes
pub fn action_points_for(config: &GameConfig, controlled: usize) -> u32 {
    let controlled = u32::try_from(controlled).unwrap_or(u32::MAX);
    config
        .base_action_points
        .saturating_add(config.resource_bonus_action_points.saturating_mul(controlled))
}

/// Action points `player` starts their next turn with on this board
pub fn action_points_for_turn(config: &GameConfig, board: &Board, player: &str) -> u32 {
    action_points_for(config, controlled_resources(board, player).len())
}
