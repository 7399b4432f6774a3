//! Node configuration management.
//!
//! The node reads one TOML file with `[node]`, `[consensus]` and `[logging]`
//! sections. Every section and field is optional.

use anyhow::{Context, Result};
use onyx_consensus::ConsensusConfig;
use onyx_cryptography::{KeyPair, PublicKey};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Complete node configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub node: NodeSection,
    pub consensus: ConsensusConfig,
    pub logging: LoggingConfig,
}

/// Identity and chain membership
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSection {
    /// Hex private key. A fresh key is generated when absent.
    pub private_key: Option<String>,
    /// Hex compressed public keys of the genesis bookkeepers. Empty means a
    /// single-bookkeeper chain run by this node.
    pub bookkeepers: Vec<String>,
    /// Timestamp of the genesis block.
    pub genesis_timestamp: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `onyx_consensus=debug`.
    pub level: String,
    /// Emit JSON lines instead of the human-readable format.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl NodeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.consensus.validate()?;
        Ok(config)
    }

    pub fn keypair(&self) -> Result<KeyPair> {
        match &self.node.private_key {
            Some(hex_key) => KeyPair::from_hex(hex_key).context("invalid node.private_key"),
            None => Ok(KeyPair::generate()),
        }
    }

    /// The genesis bookkeepers, sorted. Falls back to `own` alone.
    pub fn bookkeepers(&self, own: &PublicKey) -> Result<Vec<PublicKey>> {
        if self.node.bookkeepers.is_empty() {
            return Ok(vec![own.clone()]);
        }
        let mut keys = self
            .node
            .bookkeepers
            .iter()
            .map(|key| {
                PublicKey::from_str(key).with_context(|| format!("invalid bookkeeper key {key}"))
            })
            .collect::<Result<Vec<_>>>()?;
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = NodeConfig::parse("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert_eq!(config.consensus.gen_block_time, 6);
        assert!(config.node.bookkeepers.is_empty());
    }

    #[test]
    fn test_sections() {
        let config = NodeConfig::parse(
            r#"
            [node]
            genesis_timestamp = 1700000000

            [consensus]
            gen_block_time = 15
            max_transactions_per_block = 100

            [logging]
            level = "debug"
            json = true
            "#,
        )
        .unwrap();
        assert_eq!(config.node.genesis_timestamp, 1_700_000_000);
        assert_eq!(config.consensus.gen_block_time, 15);
        assert_eq!(config.consensus.max_transactions_per_block, 100);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_rejects_invalid_consensus_section() {
        assert!(NodeConfig::parse("[consensus]\nmax_transactions_per_block = 0").is_err());
    }

    #[test]
    fn test_bookkeepers_are_sorted_and_include_fallback() {
        let keys: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
        let own = keys[0].public_key().clone();

        let config = NodeConfig::default();
        assert_eq!(config.bookkeepers(&own).unwrap(), vec![own.clone()]);

        let mut config = NodeConfig::default();
        config.node.bookkeepers = keys
            .iter()
            .rev()
            .map(|k| k.public_key().to_hex_string())
            .collect();
        let parsed = config.bookkeepers(&own).unwrap();
        assert_eq!(parsed.len(), 3);
        assert!(parsed.windows(2).all(|w| w[0] < w[1]));

        config.node.bookkeepers.push("zz".to_string());
        assert!(config.bookkeepers(&own).is_err());
    }

    #[test]
    fn test_private_key() {
        let mut config = NodeConfig::default();
        config.node.private_key = Some("01".repeat(32));
        let a = config.keypair().unwrap();
        let b = config.keypair().unwrap();
        assert_eq!(a.public_key(), b.public_key());

        config.node.private_key = Some("nothex".to_string());
        assert!(config.keypair().is_err());
    }
}
