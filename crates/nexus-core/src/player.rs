//! Player state.

use crate::board::PlayerId;
use crate::hex::HexCoord;
use serde::{Deserialize, Serialize};

/// What the host knows about a player before the game exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    /// Any CSS color string; the engine never interprets it
    pub color: String,
}

impl PlayerInfo {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
        }
    }

    /// Lobby color for the `index`th player to join: hues 90° apart
    pub fn lobby_color(index: usize) -> String {
        format!("hsl({}, 70%, 50%)", (index * 90) % 360)
    }
}

/// A player taking part in a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
    /// Budget left this turn
    pub action_points: u32,
    /// Home cell on the outer ring, fixed for the whole game
    pub base: HexCoord,
}

impl Player {
    pub fn new(info: PlayerInfo, base: HexCoord) -> Self {
        Self {
            id: info.id,
            name: info.name,
            color: info.color,
            action_points: 0,
            base,
        }
    }

    pub fn can_afford(&self, cost: u32) -> bool {
        self.action_points >= cost
    }

    /// Deduct `cost` if affordable. Returns whether it was.
    pub fn spend(&mut self, cost: u32) -> bool {
        match self.action_points.checked_sub(cost) {
            Some(left) => {
                self.action_points = left;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spend_never_goes_negative() {
        let mut player = Player::new(PlayerInfo::new("a", "Alpha", "#f00"), HexCoord::new(-4, 0));
        player.action_points = 3;

        assert!(player.spend(2));
        assert_eq!(player.action_points, 1);
        assert!(!player.can_afford(2));
        assert!(!player.spend(2));
        assert_eq!(player.action_points, 1);
    }

    #[test]
    fn test_lobby_colors() {
        assert_eq!(PlayerInfo::lobby_color(0), "hsl(0, 70%, 50%)");
        assert_eq!(PlayerInfo::lobby_color(3), "hsl(270, 70%, 50%)");
    }
}
