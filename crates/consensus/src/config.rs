//! Consensus configuration.

use crate::{ConsensusError, ConsensusResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Shortest block interval accepted; anything below falls back to the default.
pub const MIN_GEN_BLOCK_TIME_SECS: u64 = 2;

pub const DEFAULT_GEN_BLOCK_TIME_SECS: u64 = 6;

/// Tuning of the dBFT service, read from the `[consensus]` table of the node config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Target block interval in seconds.
    pub gen_block_time: u64,
    /// Upper bound on one ledger append, in seconds.
    pub ledger_append_timeout: u64,
    /// How far a proposal timestamp may run ahead of the local clock, in seconds.
    pub max_timestamp_drift: u32,
    /// Includes the bookkeeping transaction.
    pub max_transactions_per_block: usize,
    /// Payload version; payloads with any other version are dropped.
    pub version: u32,
    /// Number of recent blocks checked for repeated transactions.
    pub incremental_window: usize,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            gen_block_time: DEFAULT_GEN_BLOCK_TIME_SECS,
            ledger_append_timeout: 30,
            max_timestamp_drift: 600,
            max_transactions_per_block: 500,
            version: 0,
            incremental_window: 10,
        }
    }
}

impl ConsensusConfig {
    /// Replaces a block time below the minimum with the default.
    pub fn normalized(mut self) -> Self {
        if self.gen_block_time < MIN_GEN_BLOCK_TIME_SECS {
            warn!(
                configured = self.gen_block_time,
                default = DEFAULT_GEN_BLOCK_TIME_SECS,
                "block time must be at least {MIN_GEN_BLOCK_TIME_SECS} seconds, using the default"
            );
            self.gen_block_time = DEFAULT_GEN_BLOCK_TIME_SECS;
        }
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> ConsensusResult<()> {
        if self.max_transactions_per_block == 0 {
            return Err(ConsensusError::InvalidConfig(
                "max_transactions_per_block must leave room for the bookkeeping transaction"
                    .to_string(),
            ));
        }
        if self.ledger_append_timeout == 0 {
            return Err(ConsensusError::InvalidConfig(
                "ledger_append_timeout must be greater than 0".to_string(),
            ));
        }
        if self.incremental_window == 0 {
            return Err(ConsensusError::InvalidConfig(
                "incremental_window must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn block_time(&self) -> Duration {
        Duration::from_secs(self.gen_block_time)
    }

    #[inline]
    pub fn append_timeout(&self) -> Duration {
        Duration::from_secs(self.ledger_append_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConsensusConfig::default();
        assert_eq!(config.block_time(), Duration::from_secs(6));
        assert_eq!(config.append_timeout(), Duration::from_secs(30));
        assert_eq!(config.max_timestamp_drift, 600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_short_block_time_falls_back() {
        let config = ConsensusConfig {
            gen_block_time: 1,
            ..Default::default()
        }
        .normalized();
        assert_eq!(config.gen_block_time, DEFAULT_GEN_BLOCK_TIME_SECS);

        let config = ConsensusConfig {
            gen_block_time: 2,
            ..Default::default()
        }
        .normalized();
        assert_eq!(config.gen_block_time, 2);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ConsensusConfig = toml::from_str("gen_block_time = 15").unwrap();
        assert_eq!(config.gen_block_time, 15);
        assert_eq!(config.incremental_window, 10);
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let config = ConsensusConfig {
            max_transactions_per_block: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConsensusError::InvalidConfig(_))
        ));
    }
}
