//! WebAssembly bindings for the Nexus Miners game engine.
//!
//! This module exposes a game session to JavaScript through wasm-bindgen, for
//! hot-seat play in a browser without a server.

use wasm_bindgen::prelude::*;

use crate::actions::GameAction;
use crate::config::GameConfig;
use crate::game::GameSession;
use crate::player::PlayerInfo;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WASM-exposed game wrapper
#[wasm_bindgen]
pub struct WasmGame {
    session: GameSession,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a new game from a JSON array of `{id, name, color}` objects.
    /// `config_json` may be empty to use the default rules.
    #[wasm_bindgen(constructor)]
    pub fn new(players_json: &str, config_json: &str) -> Result<WasmGame, JsValue> {
        let players: Vec<PlayerInfo> = serde_json::from_str(players_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid players: {}", e)))?;

        let config = if config_json.trim().is_empty() {
            GameConfig::default()
        } else {
            serde_json::from_str(config_json)
                .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?
        };

        let session = GameSession::new(players, config)
            .map_err(|e| JsValue::from_str(&format!("Cannot start game: {}", e)))?;

        Ok(WasmGame { session })
    }

    /// Get the full game snapshot as JSON
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        serde_json::to_string(&self.session.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Get the current player ID
    #[wasm_bindgen(js_name = getCurrentPlayer)]
    pub fn get_current_player(&self) -> String {
        self.session.current_player_id().to_string()
    }

    /// Get valid actions for the current player as JSON array
    #[wasm_bindgen(js_name = getValidActions)]
    pub fn get_valid_actions(&self) -> String {
        let actions = self.session.valid_actions(self.session.current_player_id());
        serde_json::to_string(&actions).unwrap_or_else(|_| "[]".to_string())
    }

    /// Submit an action from JSON. Malformed JSON counts as an unknown action.
    #[wasm_bindgen(js_name = submitAction)]
    pub fn submit_action(&mut self, actor: &str, action_json: &str) -> bool {
        self.session
            .submit_action(actor, GameAction::from_json_str(action_json))
    }

    /// Pass the turn to the next player
    #[wasm_bindgen(js_name = advanceTurn)]
    pub fn advance_turn(&mut self) {
        self.session.advance_turn();
    }

    /// The latest status line
    #[wasm_bindgen(js_name = getMessage)]
    pub fn get_message(&self) -> String {
        self.session.message().to_string()
    }

    /// Check if the game is finished
    #[wasm_bindgen(js_name = isGameOver)]
    pub fn is_game_over(&self) -> bool {
        self.session.is_finished()
    }

    /// Get the winner's ID (if game is finished)
    #[wasm_bindgen(js_name = getWinner)]
    pub fn get_winner(&self) -> Option<String> {
        self.session.winner().map(|p| p.id.clone())
    }
}
