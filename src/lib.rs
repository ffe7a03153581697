//! # Scheduler Resource Tree
//!
//! Concurrent resource accounting for a multi-tenant cluster scheduler.
//!
//! Many scheduling threads decide at once which jobs may start on which exec
//! nodes. Every pool in the hierarchy may cap its resources, and no ancestor's
//! cap may ever be exceeded. This crate provides the accounting primitive those
//! threads share, plus the per-node session object they use during a pass.
//!
//! ## Key Pieces
//!
//! - **`JobResources`**: fixed-dimension resource vector with saturating
//!   arithmetic and the componentwise "dominates" partial order
//! - **`ResourceTreeElement`**: one pool or operation, guarded by its own
//!   reader/writer lock, implementing the two-phase precommit/commit protocol
//! - **`ResourceTree`**: owns the element forest, walks parent chains for
//!   hierarchical admission, and counts lock acquisitions for tuning
//! - **`SchedulingContext`**: per-node, per-pass session tracking node usage,
//!   preemption discount, and started/preempted jobs
//!
//! ## Admitting A Job
//!
//! ```
//! use scheduler_resource_tree::core::{ElementKind, JobResources, ResourceTree};
//!
//! let tree = ResourceTree::new();
//! tree.create_element("root", ElementKind::Pool).unwrap();
//! let pool = tree.create_element("research", ElementKind::Pool).unwrap();
//! let op = tree.create_element("op-1", ElementKind::Operation).unwrap();
//! tree.attach_parent("research", "root").unwrap();
//! tree.attach_parent("op-1", "research").unwrap();
//! pool.set_resource_limits(JobResources::with_user_slots(5));
//!
//! let job = JobResources::with_user_slots(5);
//! tree.try_increase_hierarchical_resource_usage_precommit(&op, &job).unwrap();
//! assert!(tree
//!     .try_increase_hierarchical_resource_usage_precommit(&op, &JobResources::with_user_slots(1))
//!     .is_err());
//!
//! // The job is confirmed running: turn the reservation into usage.
//! tree.commit_hierarchical_resource_usage(&op, &job, &job);
//! assert_eq!(pool.get_resource_usage(), job);
//! assert_eq!(pool.get_resource_usage_precommit(), JobResources::zero());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Resource vectors, the accounting tree, and scheduling contexts.
pub mod core;
/// Configuration models for pools, limits, and scheduling passes.
pub mod config;
/// Builders to construct resource trees from configuration.
pub mod builders;
/// Shared utilities.
pub mod util;
