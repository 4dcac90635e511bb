//! # Node Runtime Library
//!
//! Runs one order node on in-memory adapters and closes the execution loop:
//! every block on the node's commit stream is applied to the
//! [`MemoryLedger`] and reported back through `report_state`.
//!
//! ```text
//!  OrderNode ──commit stream──▶ executor ──apply──▶ MemoryLedger
//!      ▲                            │
//!      └──────── report_state ──────┘
//! ```
//!
//! The main entry point is the `main.rs` binary.

pub mod adapters;
pub mod config;

use crate::adapters::{LoopbackNetwork, MemoryLedger, StaticEpochProvider};
use crate::config::RuntimeConfig;
use oc_04_order_node::{EngineRegistry, OrderDeps, OrderError, OrderNode};
use shared_bus::{shutdown_channel, ShutdownSignal, ShutdownTrigger};
use shared_types::CommitEvent;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

pub use config::{load_config, load_config_from};

/// A single order node plus the executor feeding committed blocks back.
pub struct NodeRuntime {
    node: Arc<OrderNode>,
    ledger: Arc<MemoryLedger>,
    epochs: Arc<StaticEpochProvider>,
    trigger: ShutdownTrigger,
}

impl NodeRuntime {
    /// Build a node on a fresh loopback network and a single-validator epoch.
    pub fn new(config: RuntimeConfig, ledger: Arc<MemoryLedger>) -> Result<Self, OrderError> {
        let node_info = config.node_info();
        let epochs = Arc::new(StaticEpochProvider::single_validator(
            node_info.clone(),
            config.consensus.clone(),
            config.epoch_period,
        ));
        let network = Arc::new(LoopbackNetwork::new(node_info.p2p_node_id.clone()));

        let node = OrderNode::new(
            config.order,
            OrderDeps {
                node: node_info,
                network,
                ledger: ledger.clone(),
                epochs: epochs.clone(),
            },
            &EngineRegistry::with_builtin(),
        )?;
        let (trigger, _) = shutdown_channel();

        Ok(Self {
            node: Arc::new(node),
            ledger,
            epochs,
            trigger,
        })
    }

    pub async fn start(&self) -> Result<(), OrderError> {
        info!("===========================================");
        info!("  Order-Core Node Runtime v0.1.0");
        info!("===========================================");

        self.node.start().await?;
        let commits = self.node.commit_stream()?;
        tokio::spawn(apply_commits(
            commits,
            self.ledger.clone(),
            self.node.clone(),
            self.trigger.signal(),
        ));
        Ok(())
    }

    pub fn node(&self) -> &Arc<OrderNode> {
        &self.node
    }

    pub fn ledger(&self) -> &Arc<MemoryLedger> {
        &self.ledger
    }

    pub fn epochs(&self) -> &Arc<StaticEpochProvider> {
        &self.epochs
    }

    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        self.trigger.trigger();
        self.node.stop().await;
        info!("Shutdown complete");
    }
}

/// Apply committed blocks in order and report each one as executed.
async fn apply_commits(
    mut commits: mpsc::Receiver<CommitEvent>,
    ledger: Arc<MemoryLedger>,
    node: Arc<OrderNode>,
    mut shutdown: ShutdownSignal,
) {
    loop {
        let event = tokio::select! {
            _ = shutdown.recv() => break,
            next = commits.recv() => match next {
                Some(event) => event,
                None => break,
            },
        };

        let block = match ledger.apply(event.block) {
            Ok(block) => block,
            Err(e) => {
                error!(error = %e, "Apply committed block failed");
                continue;
            }
        };
        let height = block.height();
        if let Err(e) = node
            .report_state(height, block.hash(), block.tx_hashes())
            .await
        {
            warn!(height, error = %e, "Report state failed");
            if matches!(e, OrderError::EpochRefresh(_) | OrderError::Stopped) {
                break;
            }
        }
    }
    info!("Executor stopped");
}
