//! # Engine Registry
//!
//! Maps order type names to engine constructors. Built explicitly at
//! process start and handed to [`crate::OrderNode::new`].
//!
//! ```rust,ignore
//! let mut registry = EngineRegistry::with_builtin();
//! registry.register("my_bft", Box::new(|ctx| Ok(Arc::new(MyBft::new(ctx)?) as _)));
//! let node = OrderNode::new(config, deps, &registry)?;
//! ```

use super::solo::{SoloEngine, SOLO};
use crate::config::OrderConfig;
use crate::domain::{EngineError, OrderError};
use crate::ports::{ConsensusEngine, EngineStack, Ledger};
use shared_types::{ChainMeta, EpochInfo, NodeInfo};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything an engine constructor may use.
pub struct EngineContext {
    pub config: OrderConfig,
    pub node: NodeInfo,
    pub epoch: Arc<EpochInfo>,
    /// Locally applied chain head at construction time.
    pub applied: ChainMeta,
    pub stack: Arc<dyn EngineStack>,
    pub ledger: Arc<dyn Ledger>,
}

pub type EngineFactory =
    Box<dyn Fn(EngineContext) -> Result<Arc<dyn ConsensusEngine>, EngineError> + Send + Sync>;

#[derive(Default)]
pub struct EngineRegistry {
    factories: HashMap<String, EngineFactory>,
}

impl EngineRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the engines shipped with this crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(
            SOLO,
            Box::new(|ctx| Ok(Arc::new(SoloEngine::new(ctx)?) as Arc<dyn ConsensusEngine>)),
        );
        registry
    }

    pub fn register(&mut self, name: &str, factory: EngineFactory) {
        info!("[Registry] Registering order type {}", name);
        if self.factories.insert(name.to_string(), factory).is_some() {
            warn!("[Registry] Order type {} already registered, replacing", name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn build(
        &self,
        name: &str,
        ctx: EngineContext,
    ) -> Result<Arc<dyn ConsensusEngine>, OrderError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| OrderError::UnsupportedOrderType(name.to_string()))?;
        Ok(factory(ctx)?)
    }
}
