//! Application services: component resolution, the render bridge and the
//! worker pool hosts use to drive it.

pub mod bridge;
pub mod error;
pub mod pool;
pub mod registry;

pub use bridge::RenderBridge;
pub use pool::{DEFAULT_TIMEOUT, RenderOutcome, RenderPool, RenderWorker};
pub use registry::{ComponentRegistry, RegistryBuilder, RegistryError, Renderable};
