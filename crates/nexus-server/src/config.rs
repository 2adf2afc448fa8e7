//! Server configuration from the environment.

use anyhow::Context;
use nexus_core::GameConfig;
use std::net::SocketAddr;
use std::path::Path;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";

/// Runtime settings for the game server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (`SERVER_ADDR`)
    pub addr: SocketAddr,
    /// Rules for every game hosted (`NEXUS_GAME_CONFIG`, a JSON file)
    pub game: GameConfig,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let addr = std::env::var("SERVER_ADDR").ok();
        let game_path = std::env::var("NEXUS_GAME_CONFIG").ok();
        Self::from_values(addr.as_deref(), game_path.as_deref())
    }

    fn from_values(addr: Option<&str>, game_path: Option<&str>) -> anyhow::Result<Self> {
        let addr = addr
            .unwrap_or(DEFAULT_ADDR)
            .parse()
            .context("SERVER_ADDR is not a socket address")?;

        let game = match game_path {
            Some(path) => load_game_config(Path::new(path))?,
            None => GameConfig::default(),
        };

        Ok(Self { addr, game })
    }
}

fn load_game_config(path: &Path) -> anyhow::Result<GameConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading game config {}", path.display()))?;
    let config: GameConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing game config {}", path.display()))?;
    if config.grid_radius == 0 {
        anyhow::bail!("game config {}: grid_radius must be at least 1", path.display());
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_values(None, None).unwrap();
        assert_eq!(config.addr, DEFAULT_ADDR.parse::<SocketAddr>().unwrap());
        assert_eq!(config.game, GameConfig::default());
    }

    #[test]
    fn test_bad_addr() {
        assert!(ServerConfig::from_values(Some("not an address"), None).is_err());
    }

    #[test]
    fn test_game_config_file() {
        let path = std::env::temp_dir().join(format!("nexus-config-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{"grid_radius": 3, "win_condition_resources": 2}"#).unwrap();

        let config =
            ServerConfig::from_values(Some("127.0.0.1:9000"), path.to_str()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.addr.port(), 9000);
        assert_eq!(config.game.grid_radius, 3);
        assert_eq!(config.game.win_condition_resources, 2);
        assert_eq!(config.game.base_action_points, GameConfig::default().base_action_points);
    }

    #[test]
    fn test_missing_game_config_file() {
        assert!(ServerConfig::from_values(None, Some("/nonexistent/nexus.json")).is_err());
    }
}
