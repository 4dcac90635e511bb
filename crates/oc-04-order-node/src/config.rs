//! # Order Configuration
//!
//! Every section has sane defaults; a deserialized config only needs the
//! fields it overrides. Durations are carried as milliseconds.

use crate::domain::ConfigError;
use oc_01_precheck::{PreCheckConfig, DEFAULT_QUEUE_CAPACITY};
use oc_02_tx_cache::{TxCacheConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_SET_SIZE};
use serde::Deserialize;
use shared_types::U256;
use std::time::Duration;

/// Engine used when none is configured.
pub const DEFAULT_ORDER_TYPE: &str = "solo";

/// Complete order configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrderConfig {
    /// Registered engine name.
    pub order_type: String,
    pub tx_cache: TxCacheSection,
    pub precheck: PreCheckSection,
    pub limit: LimitSection,
    /// Pause between quorum reachability checks during start.
    pub quorum_check_interval_ms: u64,
    /// Pause between passes over the peer list while recovering a block.
    pub recovery_retry_interval_ms: u64,
    pub commit_channel_capacity: usize,
    /// Executed batches buffered between the engine and the block listener.
    pub ready_channel_capacity: usize,
    pub solo: SoloSection,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            order_type: DEFAULT_ORDER_TYPE.to_string(),
            tx_cache: TxCacheSection::default(),
            precheck: PreCheckSection::default(),
            limit: LimitSection::default(),
            quorum_check_interval_ms: 1_000,
            recovery_retry_interval_ms: 200,
            commit_channel_capacity: 1_024,
            ready_channel_capacity: 1_024,
            solo: SoloSection::default(),
        }
    }
}

impl OrderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.order_type.trim().is_empty() {
            return Err(ConfigError::EmptyOrderType);
        }
        if self.commit_channel_capacity == 0 {
            return Err(ConfigError::ZeroCapacity("commit_channel_capacity"));
        }
        if self.ready_channel_capacity == 0 {
            return Err(ConfigError::ZeroCapacity("ready_channel_capacity"));
        }
        if self.quorum_check_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("quorum_check_interval_ms"));
        }
        if self.recovery_retry_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("recovery_retry_interval_ms"));
        }
        if self.limit.enable && (self.limit.limit == 0 || self.limit.burst == 0) {
            return Err(ConfigError::InvalidRateLimit {
                limit: self.limit.limit,
                burst: self.limit.burst,
            });
        }
        if self.solo.pool_size == 0 {
            return Err(ConfigError::ZeroCapacity("solo.pool_size"));
        }
        Ok(())
    }

    pub fn quorum_check_interval(&self) -> Duration {
        Duration::from_millis(self.quorum_check_interval_ms)
    }

    pub fn recovery_retry_interval(&self) -> Duration {
        Duration::from_millis(self.recovery_retry_interval_ms)
    }
}

/// Broadcast batching for locally admitted transactions.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TxCacheSection {
    pub set_size: usize,
    pub set_timeout_ms: u64,
    pub capacity: usize,
}

impl Default for TxCacheSection {
    fn default() -> Self {
        Self {
            set_size: DEFAULT_SET_SIZE,
            set_timeout_ms: 100,
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl TxCacheSection {
    pub fn to_cache_config(&self) -> TxCacheConfig {
        TxCacheConfig {
            set_size: self.set_size,
            set_timeout: Duration::from_millis(self.set_timeout_ms),
            capacity: self.capacity,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PreCheckSection {
    /// Workers per stage; zero means one per CPU.
    pub concurrency: usize,
    pub queue_capacity: usize,
    pub base_fee: u64,
}

impl Default for PreCheckSection {
    fn default() -> Self {
        Self {
            concurrency: num_cpus::get(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            base_fee: 0,
        }
    }
}

impl PreCheckSection {
    pub fn to_precheck_config(&self) -> PreCheckConfig {
        PreCheckConfig {
            concurrency: if self.concurrency == 0 {
                num_cpus::get()
            } else {
                self.concurrency
            },
            queue_capacity: if self.queue_capacity == 0 {
                DEFAULT_QUEUE_CAPACITY
            } else {
                self.queue_capacity
            },
            base_fee: U256::from(self.base_fee),
        }
    }
}

/// Token bucket for replicated transaction messages.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitSection {
    pub enable: bool,
    /// Tokens per second.
    pub limit: u64,
    pub burst: u64,
}

impl Default for LimitSection {
    fn default() -> Self {
        Self {
            enable: false,
            limit: 10_000,
            burst: 10_000,
        }
    }
}

/// Single-leader engine settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SoloSection {
    /// Seal a block this long after its first transaction.
    pub batch_timeout_ms: u64,
    /// Pending transactions before the engine reports a full pool.
    pub pool_size: usize,
}

impl Default for SoloSection {
    fn default() -> Self {
        Self {
            batch_timeout_ms: 500,
            pool_size: 50_000,
        }
    }
}

impl SoloSection {
    pub fn batch_timeout(&self) -> Duration {
        Duration::from_millis(self.batch_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = OrderConfig::default();
        assert_eq!(config.order_type, "solo");
        assert_eq!(config.quorum_check_interval(), Duration::from_secs(1));
        assert_eq!(config.recovery_retry_interval(), Duration::from_millis(200));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let config: OrderConfig = serde_json::from_str(
            r#"{ "order_type": "solo", "limit": { "enable": true, "limit": 50 }, "tx_cache": { "set_size": 4 } }"#,
        )
        .unwrap();

        assert!(config.limit.enable);
        assert_eq!(config.limit.limit, 50);
        assert_eq!(config.limit.burst, 10_000);
        assert_eq!(config.tx_cache.set_size, 4);
        assert_eq!(config.tx_cache.set_timeout_ms, 100);
        assert_eq!(config.commit_channel_capacity, 1_024);
    }

    #[test]
    fn test_enabled_limiter_needs_tokens() {
        let mut config = OrderConfig::default();
        config.limit = LimitSection {
            enable: true,
            limit: 0,
            burst: 5,
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidRateLimit { limit: 0, burst: 5 })
        );
    }

    #[test]
    fn test_zero_precheck_concurrency_means_cpu_count() {
        let section = PreCheckSection {
            concurrency: 0,
            queue_capacity: 0,
            base_fee: 7,
        };
        let precheck = section.to_precheck_config();
        assert_eq!(precheck.concurrency, num_cpus::get());
        assert_eq!(precheck.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(precheck.base_fee, U256::from(7u64));
    }
}
