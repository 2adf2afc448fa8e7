//! Reachability over a single player's conduits.
//!
//! A player's network is the graph whose nodes are cells and whose edges are
//! exactly the conduits that player owns. Opponents' conduits never carry a
//! connection, and reinforcement has no effect on connectivity.

use crate::board::Board;
use crate::hex::HexCoord;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Adjacency view of one player's conduits, built from the live board.
#[derive(Debug, Clone, Default)]
pub struct PlayerNetwork {
    links: HashMap<HexCoord, Vec<HexCoord>>,
}

impl PlayerNetwork {
    /// Snapshot the conduits `player` owns on `board`
    pub fn of(board: &Board, player: &str) -> Self {
        let mut links: HashMap<HexCoord, Vec<HexCoord>> = HashMap::new();
        for edge in board.player_conduits(player) {
            let [a, b] = edge.endpoints();
            links.entry(a).or_default().push(b);
            links.entry(b).or_default().push(a);
        }
        Self { links }
    }

    /// Number of conduits in the network
    #[cfg(test)]
    pub fn conduit_count(&self) -> usize {
        self.links.values().map(Vec::len).sum::<usize>() / 2
    }

    /// Every cell reachable from `start`, `start` included
    pub fn reachable_from(&self, start: HexCoord) -> HashSet<HexCoord> {
        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            for next in self.links.get(&current).into_iter().flatten() {
                if visited.insert(*next) {
                    queue.push_back(*next);
                }
            }
        }

        visited
    }

    /// Whether a path of owned conduits joins the two cells
    pub fn is_connected(&self, start: HexCoord, end: HexCoord) -> bool {
        if start == end {
            return true;
        }

        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            for next in self.links.get(&current).into_iter().flatten() {
                if *next == end {
                    return true;
                }
                if visited.insert(*next) {
                    queue.push_back(*next);
                }
            }
        }

        false
    }
}

/// Whether `player`'s conduits join `start` to `end`
pub fn is_connected(board: &Board, player: &str, start: HexCoord, end: HexCoord) -> bool {
    PlayerNetwork::of(board, player).is_connected(start, end)
}

/// Resource nodes (the Nexus excluded) linked to `player`'s base.
///
/// Always computed from the current conduits; sabotage by opponents can
/// shrink this between two calls.
pub fn controlled_resources(board: &Board, player: &str) -> BTreeSet<HexCoord> {
    let Some(base) = board.base_of(player) else {
        return BTreeSet::new();
    };

    let reachable = PlayerNetwork::of(board, player).reachable_from(base);
    board
        .resource_cells()
        .map(|cell| cell.coord)
        .filter(|coord| reachable.contains(coord))
        .collect()
}
