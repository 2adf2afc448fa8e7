//! Nexus Miners - a hex-grid conduit building race
//!
//! This crate provides the core game logic for Nexus Miners, including:
//! - Hex coordinate system and the hexagonal board grid
//! - Board setup with the Nexus, player bases and resource nodes
//! - Reachability over each player's conduit network
//! - The per-turn action point economy
//! - Game session state machine with full rule enforcement
//!
//! # Architecture
//!
//! The game engine is platform-agnostic and performs no I/O. It can be compiled to:
//! - Native Rust for server-side game hosting
//! - WebAssembly for client-side local multiplayer
//!
//! Every operation is synchronous. A host running many sessions must make sure
//! each session handles one action at a time.
//!
//! # Modules
//!
//! - [`hex`]: Axial coordinates, edges and the grid
//! - [`board`]: Cells, conduits and board generation
//! - [`network`]: Connectivity over a player's conduits
//! - [`economy`]: Action points granted per turn
//! - [`actions`]: Player actions and resulting events
//! - [`game`]: Game session state machine

pub mod actions;
pub mod board;
pub mod config;
pub mod economy;
pub mod game;
pub mod hex;
pub mod network;
pub mod player;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::{GameAction, GameEvent};
pub use board::{Board, BoardJson, Cell, CellJson, Conduit, ConduitJson, PlayerId, Resource};
pub use config::GameConfig;
pub use game::{GameError, GamePhase, GameSession, GameSnapshot, PlayerSnapshot, SetupError};
pub use hex::{EdgeCoord, HexCoord, HexGrid};
pub use network::PlayerNetwork;
pub use player::{Player, PlayerInfo};
