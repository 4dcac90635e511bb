//! Outbound (Driven) ports for state recovery.

use crate::domain::FetchError;
use async_trait::async_trait;
use shared_types::{Block, ChainMeta};

/// Point-to-point block download.
#[async_trait]
pub trait BlockFetcher: Send + Sync {
    async fn fetch_block(&self, peer: &str, height: u64) -> Result<Block, FetchError>;
}

/// Read access to the locally applied chain.
pub trait ChainReader: Send + Sync {
    fn chain_meta(&self) -> ChainMeta;

    fn block_by_height(&self, height: u64) -> Option<Block>;
}
