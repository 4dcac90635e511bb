//! # State Recovery Service
//!
//! Brings the local chain up to a target `(height, digest)` announced by the
//! consensus engine.
//!
//! ```text
//! target ──▶ walk down: fetch(h) ─▶ hash == digest? ─▶ digest = parent_hash
//!                 ▲        │ no / error                      │
//!                 └─ 200ms ┘                                 ▼
//!                                       replay ascending ──▶ [commit channel]
//! ```
//!
//! Blocks are fetched newest first so every block is checked against a hash
//! already known to be good: the target digest for the top block, and each
//! verified block's parent hash for the one below it. Delivery is all or
//! nothing; nothing is sent until every height down to the local head has
//! been verified. Verified blocks are held only as they arrive, so memory
//! follows what peers actually deliver rather than the announced height.

use crate::domain::{RecoveryError, RecoveryOutcome, RecoveryTarget, RecoveryTracker};
use crate::ports::{BlockFetcher, ChainReader};
use parking_lot::Mutex;
use shared_bus::ShutdownSignal;
use shared_types::{hash_hex, Block, CommitEvent, Hash};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(200);

/// Gaps above this many heights are logged before fetching starts.
const LARGE_GAP: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Pause between passes over the peer list for one height.
    pub retry_interval: Duration,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

/// Fetch-verify-replay driver. One episode runs at a time per tracker.
pub struct StateRecovery {
    config: RecoveryConfig,
    fetcher: Arc<dyn BlockFetcher>,
    chain: Arc<dyn ChainReader>,
    commits: Mutex<Option<mpsc::Sender<CommitEvent>>>,
    tracker: Arc<RecoveryTracker>,
}

impl StateRecovery {
    pub fn new(
        config: RecoveryConfig,
        fetcher: Arc<dyn BlockFetcher>,
        chain: Arc<dyn ChainReader>,
        commits: mpsc::Sender<CommitEvent>,
        tracker: Arc<RecoveryTracker>,
    ) -> Self {
        Self {
            config,
            fetcher,
            chain,
            commits: Mutex::new(Some(commits)),
            tracker,
        }
    }

    pub fn tracker(&self) -> &Arc<RecoveryTracker> {
        &self.tracker
    }

    /// Mark `target` as the active episode. Executed-state reports for other
    /// heights are ignored from here on.
    pub fn begin(&self, target: RecoveryTarget) {
        if let Some(previous) = self.tracker.begin(target) {
            warn!(
                previous = previous.height,
                target = target.height,
                "Replacing unfinished recovery episode"
            );
        }
    }

    /// Begin and run one recovery episode.
    pub async fn recover(
        &self,
        target: RecoveryTarget,
        peers: &[String],
        shutdown: ShutdownSignal,
    ) -> Result<RecoveryOutcome, RecoveryError> {
        self.begin(target);
        self.run(target, peers, shutdown).await
    }

    /// Run an episode already marked by [`StateRecovery::begin`].
    ///
    /// On success the tracker stays active until the executor reports the
    /// target height. On any error it is cleared here, unless a newer
    /// episode has replaced it.
    pub async fn run(
        &self,
        target: RecoveryTarget,
        peers: &[String],
        shutdown: ShutdownSignal,
    ) -> Result<RecoveryOutcome, RecoveryError> {
        let result = self.run_episode(target, peers, shutdown).await;
        match &result {
            Ok(RecoveryOutcome::Replayed { from, to }) => {
                info!(from, to, "Recovery blocks delivered for execution");
            }
            Ok(RecoveryOutcome::AlreadyApplied) => {
                self.tracker.cancel(target);
            }
            Err(e) => {
                error!(target = target.height, "State recovery failed: {}", e);
                self.tracker.cancel(target);
            }
        }
        result
    }

    /// Drop the replay sender. Later replays fail with
    /// [`RecoveryError::CommitChannelClosed`].
    pub fn close(&self) {
        self.commits.lock().take();
    }

    async fn run_episode(
        &self,
        target: RecoveryTarget,
        peers: &[String],
        mut shutdown: ShutdownSignal,
    ) -> Result<RecoveryOutcome, RecoveryError> {
        let local = self.chain.chain_meta();
        info!(
            local = local.height,
            target = target.height,
            digest = %hash_hex(&target.digest),
            "State update started"
        );

        if local.height >= target.height {
            return self.check_applied(target);
        }
        if peers.is_empty() {
            return Err(RecoveryError::NoPeers);
        }

        let from = local.height + 1;
        if target.height - local.height > LARGE_GAP {
            warn!(
                local = local.height,
                target = target.height,
                "Large recovery gap, verified blocks are held until replay"
            );
        }

        // Newest first; reversed for replay.
        let mut fetched: Vec<Block> = Vec::new();
        let mut digest = target.digest;
        for height in (from..=target.height).rev() {
            match self.fetch_verified(height, digest, peers, &mut shutdown).await {
                Some(block) => {
                    digest = block.parent_hash();
                    fetched.push(block);
                }
                None => {
                    debug!(height, "Recovery cancelled by shutdown");
                    return Err(RecoveryError::Cancelled { height });
                }
            }
        }

        let commits = self
            .commits
            .lock()
            .clone()
            .ok_or(RecoveryError::CommitChannelClosed)?;
        for block in fetched.into_iter().rev() {
            let height = block.height();
            let local_list = vec![false; block.transactions.len()];
            debug!(height, "Replaying recovered block");
            tokio::select! {
                _ = shutdown.recv() => return Err(RecoveryError::Cancelled { height }),
                sent = commits.send(CommitEvent { block, local_list }) => {
                    sent.map_err(|_| RecoveryError::CommitChannelClosed)?;
                }
            }
        }

        Ok(RecoveryOutcome::Replayed {
            from,
            to: target.height,
        })
    }

    fn check_applied(&self, target: RecoveryTarget) -> Result<RecoveryOutcome, RecoveryError> {
        match self.chain.block_by_height(target.height) {
            Some(block) if block.hash() == target.digest => {
                info!(height = target.height, "Target block already applied");
                Ok(RecoveryOutcome::AlreadyApplied)
            }
            Some(block) => {
                error!(
                    height = target.height,
                    local = %hash_hex(&block.hash()),
                    expected = %hash_hex(&target.digest),
                    "Local chain diverges from recovery target"
                );
                Err(RecoveryError::Divergent {
                    height: target.height,
                })
            }
            None => Err(RecoveryError::UnresolvedHeight {
                height: target.height,
            }),
        }
    }

    /// Try every peer in order until one returns the block whose hash is
    /// `digest`, sleeping between passes. `None` only on shutdown.
    async fn fetch_verified(
        &self,
        height: u64,
        digest: Hash,
        peers: &[String],
        shutdown: &mut ShutdownSignal,
    ) -> Option<Block> {
        loop {
            for peer in peers {
                let fetched = tokio::select! {
                    _ = shutdown.recv() => return None,
                    fetched = self.fetcher.fetch_block(peer, height) => fetched,
                };

                match fetched {
                    Ok(block) if block.height() == height && block.hash() == digest => {
                        return Some(block);
                    }
                    Ok(block) => {
                        warn!(
                            height,
                            peer = %peer,
                            got = %hash_hex(&block.hash()),
                            want = %hash_hex(&digest),
                            "Block hash mismatch"
                        );
                    }
                    Err(e) => {
                        warn!(height, peer = %peer, "Block fetch failed: {}", e);
                    }
                }
            }

            tokio::select! {
                _ = shutdown.recv() => return None,
                _ = tokio::time::sleep(self.config.retry_interval) => {}
            }
        }
    }
}
