//! Configuration models for pools, limits, and scheduling passes.

pub mod pool;
pub mod resources;
pub mod scheduling;

pub use pool::{PoolConfig, SchedulerConfig};
pub use resources::JobResourcesConfig;
pub use scheduling::SchedulingContextConfig;
