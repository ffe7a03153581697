//! Resource vectors, the concurrent accounting tree, and scheduling sessions.

pub mod error;
pub mod job_resources;
pub mod resource_tree;
pub mod resource_tree_element;
pub mod scheduling_context;

pub use error::{AppResult, SchedulerError};
pub use job_resources::{
    adjusted_resource_limits, compute_available_resources, dominates, JobResources,
    MemoryDistribution, ResourceKind, INFINITE,
};
pub use resource_tree::{ResourceTree, ResourceTreeCounters, ResourceTreeProfile};
pub use resource_tree_element::{
    ElementKind, ElementSnapshot, ReleasedResources, ResourceTreeElement,
};
pub use scheduling_context::{
    create_scheduling_context, CellTag, ExecNodeDescriptor, Job, JobId, JobPtr, JobStartRequest,
    NodeId, NodeSchedulingContext, OperationId, SchedulingContext,
};
