//! # Runtime Configuration
//!
//! Defaults, then an optional JSON order config (`OC_CONFIG`), then `OC_*`
//! environment overrides:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `OC_NODE_ID` | `node_id` |
//! | `OC_ORDER_TYPE` | `order.order_type` |
//! | `OC_BATCH_TIMEOUT_MS` | `order.solo.batch_timeout_ms` |
//! | `OC_POOL_SIZE` | `order.solo.pool_size` |
//! | `OC_TX_SET_SIZE` | `order.tx_cache.set_size` |
//! | `OC_RATE_LIMIT` | `order.limit` (enables it, limit = burst) |
//! | `OC_BLOCK_MAX_TX_NUM` | `consensus.block_max_tx_num` |
//! | `OC_EPOCH_PERIOD` | `epoch_period` |
//! | `OC_DEMO_TXS` | `demo_txs` |

use anyhow::{Context, Result};
use oc_04_order_node::OrderConfig;
use shared_types::{ConsensusParams, NodeInfo};
use std::str::FromStr;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub node_id: u64,
    pub order: OrderConfig,
    pub consensus: ConsensusParams,
    /// Zero keeps the node in epoch 1 forever.
    pub epoch_period: u64,
    /// Signed transfers the binary submits after start.
    pub demo_txs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            node_id: 1,
            order: OrderConfig::default(),
            consensus: ConsensusParams::default(),
            epoch_period: 0,
            demo_txs: 0,
        }
    }
}

impl RuntimeConfig {
    pub fn node_info(&self) -> NodeInfo {
        NodeInfo {
            id: self.node_id,
            account_address: format!("0x{:040x}", self.node_id),
            p2p_node_id: format!("node{}", self.node_id),
        }
    }
}

/// Load the configuration from the process environment.
pub fn load_config() -> Result<RuntimeConfig> {
    load_config_from(|key| std::env::var(key).ok())
}

/// Load the configuration, reading variables through `lookup`.
pub fn load_config_from(lookup: impl Fn(&str) -> Option<String>) -> Result<RuntimeConfig> {
    let mut config = RuntimeConfig::default();

    if let Some(path) = lookup("OC_CONFIG") {
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read order config {path}"))?;
        config.order = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse order config {path}"))?;
        info!(path = %path, "Loaded order config");
    }

    override_with(&lookup, "OC_NODE_ID", &mut config.node_id);
    if let Some(order_type) = lookup("OC_ORDER_TYPE") {
        config.order.order_type = order_type;
    }
    override_with(&lookup, "OC_BATCH_TIMEOUT_MS", &mut config.order.solo.batch_timeout_ms);
    override_with(&lookup, "OC_POOL_SIZE", &mut config.order.solo.pool_size);
    override_with(&lookup, "OC_TX_SET_SIZE", &mut config.order.tx_cache.set_size);
    let mut rate = 0u64;
    override_with(&lookup, "OC_RATE_LIMIT", &mut rate);
    if rate > 0 {
        config.order.limit.enable = true;
        config.order.limit.limit = rate;
        config.order.limit.burst = rate;
    }
    override_with(&lookup, "OC_BLOCK_MAX_TX_NUM", &mut config.consensus.block_max_tx_num);
    override_with(&lookup, "OC_EPOCH_PERIOD", &mut config.epoch_period);
    override_with(&lookup, "OC_DEMO_TXS", &mut config.demo_txs);

    config
        .order
        .validate()
        .context("invalid order configuration")?;
    Ok(config)
}

fn override_with<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, field: &mut T) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.parse() {
        Ok(value) => *field = value,
        Err(_) => warn!(key, value = %raw, "Ignoring unparsable override"),
    }
}
