//! # Order-Core Node Runtime
//!
//! Development entry point: one `solo` node on in-memory adapters.
//!
//! ## Startup Sequence
//!
//! 1. Install the log subscriber (`RUST_LOG`, default `info`)
//! 2. Load configuration (defaults, `OC_CONFIG`, `OC_*` overrides)
//! 3. Fund a generated development account in the genesis ledger
//! 4. Start the node and the block executor
//! 5. Optionally submit `OC_DEMO_TXS` signed transfers
//! 6. Run until Ctrl+C, then stop gracefully

use anyhow::{Context, Result};
use node_runtime::adapters::MemoryLedger;
use node_runtime::{load_config, NodeRuntime};
use oc_04_order_node::OrderNode;
use shared_crypto::{sign_transaction, Secp256k1KeyPair};
use shared_types::{address_hex, FeeModel, Transaction, TxSignature, U256};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Balance of the development account at genesis.
const DEV_BALANCE: u64 = 1_000_000_000_000;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config()?;
    let demo_txs = config.demo_txs;

    let ledger = Arc::new(MemoryLedger::new());
    let dev_key = Secp256k1KeyPair::generate();
    ledger.set_balance(dev_key.address(), U256::from(DEV_BALANCE));
    info!(
        account = %address_hex(&dev_key.address()),
        key = %hex::encode(dev_key.to_bytes()),
        "Development account funded"
    );

    let runtime = NodeRuntime::new(config, ledger).context("failed to build order node")?;
    runtime.start().await.context("failed to start order node")?;

    if demo_txs > 0 {
        tokio::spawn(submit_demo_load(runtime.node().clone(), dev_key, demo_txs));
    }

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}

/// Submit `count` transfers to random recipients, one nonce after another.
async fn submit_demo_load(node: Arc<OrderNode>, key: Secp256k1KeyPair, count: u64) {
    let mut accepted = 0u64;
    for nonce in 0..count {
        let mut tx = Transaction {
            from: key.address(),
            to: Some(rand::random()),
            nonce,
            gas_limit: 21_000,
            fee: FeeModel::Legacy {
                gas_price: U256::one(),
            },
            value: U256::from(1),
            data: vec![],
            signature: TxSignature::default(),
        };
        if let Err(e) = sign_transaction(&mut tx, &key) {
            warn!(nonce, error = %e, "Sign demo transaction failed");
            continue;
        }
        match node.prepare(tx).await {
            Ok(()) => accepted += 1,
            Err(e) => warn!(nonce, error = %e, "Demo transaction rejected"),
        }
    }
    info!(accepted, submitted = count, "Demo load submitted");
}
