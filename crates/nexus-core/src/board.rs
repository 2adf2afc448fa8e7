//! Game board representation: cells, special sites and conduits.
//!
//! This module contains:
//! - Resource types found on the board
//! - Cells and the setup pass that places the Nexus, player bases and resource nodes
//! - Conduits, the only board state that changes during play
//! - A JSON-friendly view of the board for clients

use crate::config::GameConfig;
use crate::hex::{EdgeCoord, HexCoord, HexGrid};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Player identifier, assigned by whoever hosts the session
pub type PlayerId = String;

/// What a cell holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Resource {
    Iron,
    Carbon,
    Power,
    /// The central objective. Not a resource node for control purposes.
    Nexus,
}

impl Resource {
    /// Resource types that are seeded on interior cells, in assignment order
    pub const NODES: [Resource; 3] = [Resource::Iron, Resource::Carbon, Resource::Power];

    /// Whether holding a link to this cell counts as controlling a resource
    pub fn is_node(&self) -> bool {
        !matches!(self, Resource::Nexus)
    }
}

/// A single hex cell on the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub coord: HexCoord,
    pub resource: Option<Resource>,
    /// Player whose base this is
    pub base_owner: Option<PlayerId>,
}

impl Cell {
    fn new(coord: HexCoord) -> Self {
        Self {
            coord,
            resource: None,
            base_owner: None,
        }
    }

    /// Whether setup already put something here
    pub fn is_special(&self) -> bool {
        self.resource.is_some() || self.base_owner.is_some()
    }
}

/// A player-built link between two adjacent cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conduit {
    pub owner: PlayerId,
    /// Reinforced conduits cannot be sabotaged
    pub reinforced: bool,
}

impl Conduit {
    pub fn new(owner: PlayerId) -> Self {
        Self {
            owner,
            reinforced: false,
        }
    }

    pub fn is_owned_by(&self, player: &str) -> bool {
        self.owner == player
    }
}

/// The complete game board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    grid: HexGrid,
    cells: BTreeMap<HexCoord, Cell>,
    conduits: BTreeMap<EdgeCoord, Conduit>,
}

impl Board {
    /// Create a board with no special cells and no conduits
    pub fn empty(radius: u32) -> Self {
        let grid = HexGrid::new(radius);
        let cells = grid.cells().map(|c| (*c, Cell::new(*c))).collect();
        Self {
            grid,
            cells,
            conduits: BTreeMap::new(),
        }
    }

    /// Generate a board for the given players.
    ///
    /// Places the Nexus at the center, one base per player on the outer ring
    /// and seeds resource nodes on shuffled interior cells. The result depends
    /// only on the inputs and the state of `rng`.
    pub fn generate<R: Rng + ?Sized>(
        config: &GameConfig,
        players: &[PlayerId],
        rng: &mut R,
    ) -> Self {
        let mut board = Self::empty(config.grid_radius);

        board.set_resource(HexCoord::CENTER, Resource::Nexus);
        board.place_bases(players);
        board.seed_resources(config.resource_node_target(players.len()), rng);

        board
    }

    /// Spread bases around the outer ring by a fixed index stride
    pub(crate) fn place_bases(&mut self, players: &[PlayerId]) {
        let edge_cells = self.grid.edge_cells();
        if players.is_empty() || edge_cells.is_empty() {
            return;
        }

        let stride = (edge_cells.len() / players.len()).max(1);
        for (i, player) in players.iter().enumerate().take(edge_cells.len()) {
            if let Some(cell) = self.cells.get_mut(&edge_cells[i * stride]) {
                cell.base_owner = Some(player.clone());
            }
        }
    }

    fn seed_resources<R: Rng + ?Sized>(&mut self, wanted: usize, rng: &mut R) {
        let mut spots: Vec<HexCoord> = self
            .grid
            .interior_cells()
            .into_iter()
            .filter(|c| self.cells.get(c).is_some_and(|cell| !cell.is_special()))
            .collect();
        spots.shuffle(rng);

        let count = wanted.min(spots.len());
        for (i, coord) in spots.into_iter().take(count).enumerate() {
            self.set_resource(coord, Resource::NODES[i % Resource::NODES.len()]);
        }
    }

    pub(crate) fn set_resource(&mut self, coord: HexCoord, resource: Resource) {
        if let Some(cell) = self.cells.get_mut(&coord) {
            cell.resource = Some(resource);
        }
    }

    #[cfg(test)]
    pub(crate) fn clear_resource(&mut self, coord: HexCoord) {
        if let Some(cell) = self.cells.get_mut(&coord) {
            cell.resource = None;
        }
    }

    // ==================== Query Methods ====================

    pub fn radius(&self) -> u32 {
        self.grid.radius()
    }

    pub fn grid(&self) -> &HexGrid {
        &self.grid
    }

    pub fn get_cell(&self, coord: &HexCoord) -> Option<&Cell> {
        self.cells.get(coord)
    }

    /// All cells in grid order
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// The base cell assigned to a player
    pub fn base_of(&self, player: &str) -> Option<HexCoord> {
        self.cells
            .values()
            .find(|c| c.base_owner.as_deref() == Some(player))
            .map(|c| c.coord)
    }

    /// Cells holding a resource node (the Nexus excluded)
    pub fn resource_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells
            .values()
            .filter(|c| c.resource.is_some_and(|r| r.is_node()))
    }

    pub fn get_conduit(&self, edge: &EdgeCoord) -> Option<&Conduit> {
        self.conduits.get(edge)
    }

    pub fn conduits(&self) -> impl Iterator<Item = (&EdgeCoord, &Conduit)> {
        self.conduits.iter()
    }

    /// Edges carrying a conduit owned by `player`
    pub fn player_conduits<'a>(&'a self, player: &'a str) -> impl Iterator<Item = EdgeCoord> + 'a {
        self.conduits
            .iter()
            .filter(move |(_, c)| c.is_owned_by(player))
            .map(|(e, _)| *e)
    }

    /// Whether the edge may extend `player`'s network.
    ///
    /// True when the edge includes the player's base, or an endpoint is shared
    /// with a conduit the player already owns.
    pub fn touches_network(&self, player: &str, edge: &EdgeCoord) -> bool {
        if self.base_of(player).is_some_and(|base| edge.touches(&base)) {
            return true;
        }
        self.player_conduits(player)
            .any(|owned| owned.shares_endpoint(edge))
    }

    // ==================== Mutation Methods ====================

    /// Place a conduit (assumes validation already done)
    pub fn place_conduit(&mut self, edge: EdgeCoord, owner: PlayerId) {
        self.conduits.insert(edge, Conduit::new(owner));
    }

    /// Mark a conduit reinforced. Returns false if there is none.
    pub fn reinforce_conduit(&mut self, edge: &EdgeCoord) -> bool {
        match self.conduits.get_mut(edge) {
            Some(conduit) => {
                conduit.reinforced = true;
                true
            }
            None => false,
        }
    }

    /// Remove a conduit, returning what was there
    pub fn remove_conduit(&mut self, edge: &EdgeCoord) -> Option<Conduit> {
        self.conduits.remove(edge)
    }

    /// Convert to a JSON-friendly representation with arrays instead of maps
    /// This is needed because JSON doesn't support complex types as keys
    pub fn to_json_friendly(&self) -> BoardJson {
        BoardJson {
            radius: self.radius(),
            cells: self
                .cells
                .values()
                .map(|cell| CellJson {
                    q: cell.coord.q,
                    r: cell.coord.r,
                    resource: cell.resource,
                    base_owner: cell.base_owner.clone(),
                })
                .collect(),
            conduits: self
                .conduits
                .iter()
                .map(|(edge, conduit)| {
                    let [cell_a, cell_b] = edge.endpoints();
                    ConduitJson {
                        cell_a,
                        cell_b,
                        owner: conduit.owner.clone(),
                        reinforced: conduit.reinforced,
                    }
                })
                .collect(),
        }
    }
}

/// JSON-friendly board representation with arrays instead of maps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardJson {
    pub radius: u32,
    pub cells: Vec<CellJson>,
    pub conduits: Vec<ConduitJson>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellJson {
    pub q: i32,
    pub r: i32,
    pub resource: Option<Resource>,
    pub base_owner: Option<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConduitJson {
    pub cell_a: HexCoord,
    pub cell_b: HexCoord,
    pub owner: PlayerId,
    pub reinforced: bool,
}
