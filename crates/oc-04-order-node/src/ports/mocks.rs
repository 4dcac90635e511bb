//! Hand-written port doubles shared by the unit tests.

use super::outbound::*;
use crate::domain::{
    ConsensusMessage, EngineError, EpochError, ExecutedBatch, LedgerError, NetworkError,
    NodeStatus, PipeMsg, ServiceState, StableCheckpoint,
};
use async_trait::async_trait;
use oc_03_state_recovery::RecoveryTarget;
use parking_lot::Mutex;
use shared_types::{
    Address, Block, ChainMeta, ConsensusParams, EpochInfo, Hash, NodeInfo, Transaction, U256,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

pub fn node_info(id: u64) -> NodeInfo {
    NodeInfo {
        id,
        account_address: format!("0x{id:040x}"),
        p2p_node_id: format!("node{id}"),
    }
}

pub fn epoch_info(epoch: u64, start_block: u64, validators: u64) -> EpochInfo {
    EpochInfo {
        epoch,
        start_block,
        epoch_period: 100,
        validator_set: (1..=validators).map(node_info).collect(),
        candidate_set: vec![],
        consensus_params: ConsensusParams::default(),
    }
}

// =============================================================================
// ENGINE
// =============================================================================

#[derive(Default)]
pub struct MockEngine {
    pub status: Mutex<Option<NodeStatus>>,
    pub fail_propose: Mutex<Option<EngineError>>,
    pub proposals: Mutex<Vec<(Vec<Transaction>, bool)>>,
    pub steps: Mutex<Vec<ConsensusMessage>>,
    pub executed: Mutex<Vec<ServiceState>>,
    pub state_updated: Mutex<Vec<ServiceState>>,
    pub checkpoints: Mutex<Vec<StableCheckpoint>>,
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    stack: Mutex<Option<Arc<dyn EngineStack>>>,
}

impl MockEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_status(&self, status: NodeStatus) {
        *self.status.lock() = Some(status);
    }

    pub fn set_stack(&self, stack: Arc<dyn EngineStack>) {
        *self.stack.lock() = Some(stack);
    }

    pub fn stack(&self) -> Arc<dyn EngineStack> {
        self.stack.lock().clone().expect("stack set by factory")
    }
}

#[async_trait]
impl ConsensusEngine for MockEngine {
    async fn start(&self) -> Result<(), EngineError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    async fn propose(
        &self,
        transactions: Vec<Transaction>,
        local: bool,
    ) -> Result<(), EngineError> {
        if let Some(err) = self.fail_propose.lock().take() {
            return Err(err);
        }
        self.proposals.lock().push((transactions, local));
        Ok(())
    }

    async fn step(&self, msg: ConsensusMessage) -> Result<(), EngineError> {
        self.steps.lock().push(msg);
        Ok(())
    }

    fn status(&self) -> NodeStatus {
        self.status.lock().unwrap_or(NodeStatus::Normal)
    }

    async fn report_executed(&self, state: ServiceState) {
        self.executed.lock().push(state);
    }

    async fn report_state_updated(&self, state: ServiceState) {
        self.state_updated.lock().push(state);
    }

    async fn report_stable_checkpoint(&self, checkpoint: StableCheckpoint) {
        self.checkpoints.lock().push(checkpoint);
    }

    fn pending_nonce(&self, _account: &Address) -> u64 {
        7
    }

    fn pending_transaction(&self, hash: &Hash) -> Option<Transaction> {
        self.proposals
            .lock()
            .iter()
            .flat_map(|(txs, _)| txs.iter())
            .find(|tx| &tx.hash() == hash)
            .cloned()
    }
}

/// Records engine callbacks.
pub struct MockStack {
    executed: mpsc::UnboundedSender<ExecutedBatch>,
    pub state_updates: Mutex<Vec<RecoveryTarget>>,
    pub broadcasts: Mutex<Vec<ConsensusMessage>>,
}

impl MockStack {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<ExecutedBatch>) {
        let (executed, rx) = mpsc::unbounded_channel();
        let stack = Arc::new(Self {
            executed,
            state_updates: Mutex::new(vec![]),
            broadcasts: Mutex::new(vec![]),
        });
        (stack, rx)
    }
}

#[async_trait]
impl EngineStack for MockStack {
    async fn execute(&self, batch: ExecutedBatch) {
        let _ = self.executed.send(batch);
    }

    fn state_update(&self, target: RecoveryTarget) {
        self.state_updates.lock().push(target);
    }

    async fn broadcast(&self, msg: ConsensusMessage) -> Result<(), NetworkError> {
        self.broadcasts.lock().push(msg);
        Ok(())
    }

    async fn unicast(&self, msg: ConsensusMessage, _to: u64) -> Result<(), NetworkError> {
        self.broadcasts.lock().push(msg);
        Ok(())
    }
}

// =============================================================================
// NETWORK
// =============================================================================

pub struct MockPipe {
    inbound_tx: mpsc::UnboundedSender<PipeMsg>,
    inbound: tokio::sync::Mutex<mpsc::UnboundedReceiver<PipeMsg>>,
    /// `(recipients, frame)` for every outbound send or broadcast.
    pub sent: Mutex<Vec<(Vec<String>, Vec<u8>)>>,
}

impl MockPipe {
    fn new() -> Self {
        let (inbound_tx, inbound) = mpsc::unbounded_channel();
        Self {
            inbound_tx,
            inbound: tokio::sync::Mutex::new(inbound),
            sent: Mutex::new(vec![]),
        }
    }

    /// Deliver a frame as if `from` had sent it.
    pub fn inject(&self, from: &str, data: Vec<u8>) {
        let _ = self.inbound_tx.send(PipeMsg {
            from: from.to_string(),
            data,
        });
    }

    pub fn sent(&self) -> Vec<(Vec<String>, Vec<u8>)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Pipe for MockPipe {
    async fn send(&self, to: &str, data: Vec<u8>) -> Result<(), NetworkError> {
        self.sent.lock().push((vec![to.to_string()], data));
        Ok(())
    }

    async fn broadcast(&self, to: &[String], data: Vec<u8>) -> Result<(), NetworkError> {
        self.sent.lock().push((to.to_vec(), data));
        Ok(())
    }

    async fn receive(&self) -> Option<PipeMsg> {
        self.inbound.lock().await.recv().await
    }
}

#[derive(Default)]
pub struct MockNetwork {
    pipes: Mutex<HashMap<String, Arc<MockPipe>>>,
    pub connected: Mutex<Vec<String>>,
    /// Blocks served by `request_block`, per peer.
    pub blocks: Mutex<HashMap<String, HashMap<u64, Block>>>,
}

impl MockNetwork {
    pub fn with_peers(peers: &[&str]) -> Arc<Self> {
        let network = Self::default();
        *network.connected.lock() = peers.iter().map(|p| p.to_string()).collect();
        Arc::new(network)
    }

    pub fn pipe(&self, id: &str) -> Arc<MockPipe> {
        self.pipes.lock().get(id).cloned().expect("pipe created")
    }

    pub fn pipe_count(&self) -> usize {
        self.pipes.lock().len()
    }

    pub fn serve_blocks(&self, peer: &str, blocks: &[Block]) {
        self.blocks.lock().insert(
            peer.to_string(),
            blocks.iter().map(|b| (b.height(), b.clone())).collect(),
        );
    }
}

#[async_trait]
impl Network for MockNetwork {
    fn create_pipe(&self, id: &str) -> Result<Arc<dyn Pipe>, NetworkError> {
        let mut pipes = self.pipes.lock();
        if pipes.contains_key(id) {
            return Err(NetworkError::PipeExists(id.to_string()));
        }
        let pipe = Arc::new(MockPipe::new());
        pipes.insert(id.to_string(), pipe.clone());
        Ok(pipe)
    }

    async fn request_block(&self, peer: &str, height: u64) -> Result<Block, NetworkError> {
        self.blocks
            .lock()
            .get(peer)
            .and_then(|store| store.get(&height))
            .cloned()
            .ok_or(NetworkError::BlockNotFound {
                peer: peer.to_string(),
                height,
            })
    }

    fn connected_peers(&self) -> Vec<String> {
        self.connected.lock().clone()
    }
}

// =============================================================================
// LEDGER AND EPOCHS
// =============================================================================

#[derive(Default)]
pub struct MockLedger {
    pub balances: Mutex<HashMap<Address, U256>>,
    pub nonces: Mutex<HashMap<Address, u64>>,
    pub blocks: Mutex<Vec<Block>>,
}

impl MockLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_balance(&self, address: Address, balance: u64) {
        self.balances.lock().insert(address, U256::from(balance));
    }
}

impl Ledger for MockLedger {
    fn account_balance(&self, address: &Address) -> U256 {
        self.balances.lock().get(address).copied().unwrap_or_default()
    }

    fn account_nonce(&self, address: &Address) -> u64 {
        self.nonces.lock().get(address).copied().unwrap_or_default()
    }

    fn chain_meta(&self) -> ChainMeta {
        self.blocks
            .lock()
            .last()
            .map(|b| ChainMeta {
                height: b.height(),
                block_hash: b.hash(),
            })
            .unwrap_or_default()
    }

    fn block_by_height(&self, height: u64) -> Result<Block, LedgerError> {
        self.blocks
            .lock()
            .iter()
            .find(|b| b.height() == height)
            .cloned()
            .ok_or(LedgerError::BlockNotFound(height))
    }
}

pub struct MockEpochProvider {
    pub current: Mutex<EpochInfo>,
    pub fail: AtomicBool,
    pub requests: AtomicUsize,
}

impl MockEpochProvider {
    pub fn new(info: EpochInfo) -> Arc<Self> {
        Arc::new(Self {
            current: Mutex::new(info),
            fail: AtomicBool::new(false),
            requests: AtomicUsize::new(0),
        })
    }
}

impl EpochProvider for MockEpochProvider {
    fn current_epoch_info(&self) -> Result<EpochInfo, EpochError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(EpochError::Unavailable("epoch service down".into()));
        }
        Ok(self.current.lock().clone())
    }

    fn epoch_info(&self, epoch: u64) -> Result<EpochInfo, EpochError> {
        let current = self.current.lock().clone();
        if current.epoch == epoch {
            Ok(current)
        } else {
            Err(EpochError::NotFound(epoch))
        }
    }
}
