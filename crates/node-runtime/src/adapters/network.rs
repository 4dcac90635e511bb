//! # Loopback Network
//!
//! A network with no remote peers. Frames addressed to this node are
//! delivered back to the same pipe; every other destination is unreachable.

use async_trait::async_trait;
use oc_04_order_node::{Network, NetworkError, Pipe, PipeMsg};
use parking_lot::Mutex;
use shared_types::Block;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

pub struct LoopbackPipe {
    id: String,
    self_p2p_id: String,
    inbound_tx: mpsc::UnboundedSender<PipeMsg>,
    inbound: tokio::sync::Mutex<mpsc::UnboundedReceiver<PipeMsg>>,
}

impl LoopbackPipe {
    fn new(id: &str, self_p2p_id: &str) -> Self {
        let (inbound_tx, inbound) = mpsc::unbounded_channel();
        Self {
            id: id.to_string(),
            self_p2p_id: self_p2p_id.to_string(),
            inbound_tx,
            inbound: tokio::sync::Mutex::new(inbound),
        }
    }

    fn deliver(&self, to: &str, data: Vec<u8>) -> Result<(), NetworkError> {
        if to != self.self_p2p_id {
            return Err(NetworkError::PeerUnreachable(to.to_string()));
        }
        self.inbound_tx
            .send(PipeMsg {
                from: self.self_p2p_id.clone(),
                data,
            })
            .map_err(|_| NetworkError::Closed)
    }
}

#[async_trait]
impl Pipe for LoopbackPipe {
    async fn send(&self, to: &str, data: Vec<u8>) -> Result<(), NetworkError> {
        self.deliver(to, data)
    }

    async fn broadcast(&self, to: &[String], data: Vec<u8>) -> Result<(), NetworkError> {
        for peer in to {
            self.deliver(peer, data.clone())?;
        }
        debug!(pipe = %self.id, peers = to.len(), "Loopback broadcast");
        Ok(())
    }

    async fn receive(&self) -> Option<PipeMsg> {
        self.inbound.lock().await.recv().await
    }
}

pub struct LoopbackNetwork {
    self_p2p_id: String,
    pipes: Mutex<HashMap<String, Arc<LoopbackPipe>>>,
}

impl LoopbackNetwork {
    pub fn new(self_p2p_id: impl Into<String>) -> Self {
        Self {
            self_p2p_id: self_p2p_id.into(),
            pipes: Mutex::new(HashMap::new()),
        }
    }

    pub fn pipe(&self, id: &str) -> Option<Arc<LoopbackPipe>> {
        self.pipes.lock().get(id).cloned()
    }
}

#[async_trait]
impl Network for LoopbackNetwork {
    fn create_pipe(&self, id: &str) -> Result<Arc<dyn Pipe>, NetworkError> {
        let mut pipes = self.pipes.lock();
        if pipes.contains_key(id) {
            return Err(NetworkError::PipeExists(id.to_string()));
        }
        let pipe = Arc::new(LoopbackPipe::new(id, &self.self_p2p_id));
        pipes.insert(id.to_string(), pipe.clone());
        Ok(pipe)
    }

    async fn request_block(&self, peer: &str, _height: u64) -> Result<Block, NetworkError> {
        Err(NetworkError::PeerUnreachable(peer.to_string()))
    }

    fn connected_peers(&self) -> Vec<String> {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_to_self_loop_back() {
        let network = LoopbackNetwork::new("node1");
        let pipe = network.create_pipe("push_txs").unwrap();

        pipe.send("node1", vec![1, 2, 3]).await.unwrap();
        let frame = pipe.receive().await.unwrap();

        assert_eq!(frame.from, "node1");
        assert_eq!(frame.data, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_remote_peers_unreachable() {
        let network = LoopbackNetwork::new("node1");
        let pipe = network.create_pipe("push_txs").unwrap();

        assert_eq!(
            pipe.broadcast(&["node2".to_string()], vec![]).await,
            Err(NetworkError::PeerUnreachable("node2".into()))
        );
        assert!(network.request_block("node2", 1).await.is_err());
        assert!(network.connected_peers().is_empty());
    }

    #[test]
    fn test_duplicate_pipe_rejected() {
        let network = LoopbackNetwork::new("node1");
        network.create_pipe("order_prepare").unwrap();

        assert!(matches!(
            network.create_pipe("order_prepare"),
            Err(NetworkError::PipeExists(_))
        ));
        assert!(network.pipe("order_prepare").is_some());
    }
}
