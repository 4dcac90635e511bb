//! Consensus engines shipped with the node, and the registry selecting one.

pub mod registry;
pub mod solo;

pub use registry::{EngineContext, EngineFactory, EngineRegistry};
pub use solo::{SoloEngine, SOLO};
