use crate::error::{BlockchainError, Result};
use log::info;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

const DEFAULT_PORT: u16 = 2001;
pub const DEFAULT_DIFFICULTY: usize = 4;
pub const DEFAULT_MINING_REWARD: u64 = 50;
pub const DEFAULT_BATCH_SIZE: usize = 10;
// A SHA-256 hex digest has 64 characters
const MAX_DIFFICULTY: usize = 64;

const PORT_KEY: &str = "PORT";
const PEERS_KEY: &str = "PEERS";
const CONNECT_TIMEOUT_KEY: &str = "CONNECT_TIMEOUT_MS";
const DIFFICULTY_KEY: &str = "LEDGER_DIFFICULTY";
const MINING_REWARD_KEY: &str = "LEDGER_MINING_REWARD";
const BATCH_SIZE_KEY: &str = "LEDGER_BATCH_SIZE";

/// Everything a node process needs, layered from defaults, an optional TOML
/// file and the environment.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub node: NodeSettings,
    pub ledger: LedgerSettings,
}

/// Peer transport settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NodeSettings {
    /// Port to listen on; 0 lets the OS pick one
    pub port: u16,
    /// Peers to dial on startup, as `host:port`
    pub peers: Vec<String>,
    /// Dial timeout. Dials block until the OS gives up when unset.
    pub connect_timeout_ms: Option<u64>,
}

impl Default for NodeSettings {
    fn default() -> Self {
        NodeSettings {
            port: DEFAULT_PORT,
            peers: vec![],
            connect_timeout_ms: None,
        }
    }
}

impl NodeSettings {
    pub fn with_port(port: u16) -> NodeSettings {
        NodeSettings {
            port,
            ..Default::default()
        }
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }
}

/// Ledger constants
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    /// Number of leading hex zeros a sealed block hash must carry
    pub difficulty: usize,
    pub mining_reward: u64,
    /// Maximum pending transactions drained per mined block
    pub batch_size: usize,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        LedgerSettings {
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: DEFAULT_MINING_REWARD,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl LedgerSettings {
    pub fn validate(&self) -> Result<()> {
        if self.difficulty > MAX_DIFFICULTY {
            return Err(BlockchainError::Config(format!(
                "Difficulty {} exceeds the hash length of {MAX_DIFFICULTY}",
                self.difficulty
            )));
        }
        if self.batch_size == 0 {
            return Err(BlockchainError::Config(
                "Batch size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Settings {
    /// Load settings: defaults, then the TOML file if one is given, then the
    /// process environment.
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let mut settings = match path {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                let contents = fs::read_to_string(path)?;
                Settings::from_toml_str(&contents)?
            }
            None => Settings::default(),
        };
        settings.apply_overrides(|key| env::var(key).ok())?;
        settings.ledger.validate()?;
        Ok(settings)
    }

    pub fn from_toml_str(contents: &str) -> Result<Settings> {
        let settings: Settings = toml::from_str(contents)?;
        settings.ledger.validate()?;
        Ok(settings)
    }

    /// Apply `KEY=value` overrides. `lookup` is `std::env::var` in production.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(PORT_KEY) {
            self.node.port = parse_value(PORT_KEY, &port)?;
        }
        if let Some(peers) = lookup(PEERS_KEY) {
            self.node.peers = peers
                .split(',')
                .map(str::trim)
                .filter(|peer| !peer.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(timeout) = lookup(CONNECT_TIMEOUT_KEY) {
            self.node.connect_timeout_ms = Some(parse_value(CONNECT_TIMEOUT_KEY, &timeout)?);
        }
        if let Some(difficulty) = lookup(DIFFICULTY_KEY) {
            self.ledger.difficulty = parse_value(DIFFICULTY_KEY, &difficulty)?;
        }
        if let Some(reward) = lookup(MINING_REWARD_KEY) {
            self.ledger.mining_reward = parse_value(MINING_REWARD_KEY, &reward)?;
        }
        if let Some(batch) = lookup(BATCH_SIZE_KEY) {
            self.ledger.batch_size = parse_value(BATCH_SIZE_KEY, &batch)?;
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| BlockchainError::Config(format!("Invalid value for {key}: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.node.port, 2001);
        assert!(settings.node.peers.is_empty());
        assert_eq!(settings.ledger.difficulty, 4);
        assert_eq!(settings.ledger.mining_reward, 50);
        assert_eq!(settings.ledger.batch_size, 10);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            [node]
            port = 7001
            peers = ["127.0.0.1:7002"]

            [ledger]
            difficulty = 2
            "#,
        )
        .unwrap();

        assert_eq!(settings.node.port, 7001);
        assert_eq!(settings.node.peers, vec!["127.0.0.1:7002".to_string()]);
        assert_eq!(settings.ledger.difficulty, 2);
        assert_eq!(settings.ledger.mining_reward, 50);
    }

    #[test]
    fn test_rejects_oversized_difficulty() {
        let result = Settings::from_toml_str("[ledger]\ndifficulty = 65\n");
        assert!(matches!(result, Err(BlockchainError::Config(_))));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PORT", "7003"),
            ("PEERS", "127.0.0.1:7001, 127.0.0.1:7002,"),
            ("LEDGER_BATCH_SIZE", "3"),
            ("CONNECT_TIMEOUT_MS", "250"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(settings.node.port, 7003);
        assert_eq!(settings.node.peers.len(), 2);
        assert_eq!(settings.ledger.batch_size, 3);
        assert_eq!(
            settings.node.connect_timeout(),
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_invalid_override() {
        let mut settings = Settings::default();
        let result = settings.apply_overrides(|key| (key == "PORT").then(|| "abc".to_string()));
        assert!(matches!(result, Err(BlockchainError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[ledger]\nmining_reward = 25").unwrap();

        let settings = Settings::from_toml_str(&fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(settings.ledger.mining_reward, 25);
    }
}
