//! Per-node, per-pass scheduling session.
//!
//! A scheduling pass creates one context for every candidate exec node. The
//! context tracks the node's limits and usage for the pass, the discount
//! granted by tentatively preempted jobs, and the jobs started or preempted so
//! far. It never touches the resource tree: callers complete the precommit
//! chain before calling [`SchedulingContext::start_job`] and release tree
//! resources once a preemption is confirmed.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SchedulingContextConfig;
use crate::core::JobResources;
use crate::util::clock::now_ms;

/// Exec node identifier.
pub type NodeId = u32;

/// Cell tag of the scheduler instance issuing job ids.
pub type CellTag = u16;

/// Operation identifier.
pub type OperationId = String;

/// Shared handle to a job.
pub type JobPtr = Arc<Job>;

const CELL_TAG_SHIFT: u32 = 112;

/// Globally unique job identifier carrying the issuing cell tag in its top 16 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    /// Fresh random id stamped with `cell_tag`.
    pub fn generate(cell_tag: CellTag) -> Self {
        let random = Uuid::new_v4().as_u128() & !(u128::from(u16::MAX) << CELL_TAG_SHIFT);
        Self(Uuid::from_u128(
            random | (u128::from(cell_tag) << CELL_TAG_SHIFT),
        ))
    }

    /// Cell tag the id was issued under.
    pub fn cell_tag(&self) -> CellTag {
        let bytes = self.0.as_bytes();
        CellTag::from_be_bytes([bytes[0], bytes[1]])
    }

    /// Underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Static description of an exec node as seen by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecNodeDescriptor {
    /// Node id.
    pub id: NodeId,
    /// Network address.
    pub address: String,
    /// Whether the node is registered and heartbeating.
    pub online: bool,
    /// Capacity offered to the scheduler.
    pub resource_limits: JobResources,
    /// Usage reported in the last heartbeat.
    pub resource_usage: JobResources,
    /// Scheduling tags.
    pub tags: HashSet<String>,
}

impl ExecNodeDescriptor {
    /// Online, has slots, and carries `tag` if one is required.
    pub fn can_schedule(&self, tag: Option<&str>) -> bool {
        self.online
            && self.resource_limits.user_slots > 0
            && tag.is_none_or(|tag| self.tags.contains(tag))
    }
}

/// Admission decision handed to [`SchedulingContext::start_job`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStartRequest {
    /// Id produced by [`SchedulingContext::generate_job_id`].
    pub id: JobId,
    /// Resources the job may use on the node.
    pub resource_limits: JobResources,
}

/// One schedulable task of an operation placed on an exec node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Job id.
    pub id: JobId,
    /// Owning operation.
    pub operation_id: OperationId,
    /// Node the job runs on.
    pub node_id: NodeId,
    /// Resources the job holds on the node.
    pub resource_usage: JobResources,
    /// Start time, milliseconds since epoch.
    pub start_time_ms: u128,
}

/// Session consumed by the fair-share algorithm while placing jobs on one node.
pub trait SchedulingContext: Send + Sync {
    /// Node being scheduled.
    fn node_descriptor(&self) -> &ExecNodeDescriptor;

    /// Node capacity; fixed for the pass.
    fn resource_limits(&self) -> &JobResources;
    /// Node usage, updated as jobs start.
    fn resource_usage(&self) -> &JobResources;
    /// Mutable node usage.
    fn resource_usage_mut(&mut self) -> &mut JobResources;
    /// Usage of tentatively preempted jobs, counted as free for a second chance.
    fn resource_usage_discount(&self) -> &JobResources;
    /// Mutable discount.
    fn resource_usage_discount_mut(&mut self) -> &mut JobResources;

    /// Jobs started during this pass.
    fn started_jobs(&self) -> &[JobPtr];
    /// Jobs preempted during this pass.
    fn preempted_jobs(&self) -> &[JobPtr];
    /// Jobs running on the node when the pass began.
    fn running_jobs(&self) -> &[JobPtr];
    /// Started job with the given id.
    fn get_started_job(&self, id: &JobId) -> Option<&JobPtr>;

    /// Whether the node still has room for another job.
    fn can_start_more_jobs(&self) -> bool;
    /// Whether the node can host a job requiring `tag`.
    fn can_schedule(&self, tag: Option<&str>) -> bool;

    /// Record an admitted job. The resource-tree precommit must already be done.
    fn start_job(&mut self, operation_id: &str, request: JobStartRequest);
    /// Record a preempted job. Tree resources are released once confirmed.
    fn preempt_job(&mut self, job: JobPtr);

    /// Pass start time, milliseconds since epoch.
    fn get_now(&self) -> u128;
    /// Unique job id; callable from any thread.
    fn generate_job_id(&self) -> JobId;
}

/// [`SchedulingContext`] for a single exec node.
#[derive(Debug)]
pub struct NodeSchedulingContext {
    node: ExecNodeDescriptor,
    cell_tag: CellTag,
    now_ms: u128,
    max_started_jobs_per_heartbeat: Option<usize>,
    min_spare_resources: JobResources,
    resource_usage: JobResources,
    resource_usage_discount: JobResources,
    started_jobs: Vec<JobPtr>,
    preempted_jobs: Vec<JobPtr>,
    running_jobs: Vec<JobPtr>,
}

impl NodeSchedulingContext {
    /// Open a pass on `node`. Usage starts from the node's last report and
    /// the discount starts at zero.
    pub fn new(
        config: &SchedulingContextConfig,
        node: ExecNodeDescriptor,
        running_jobs: Vec<JobPtr>,
        cell_tag: CellTag,
    ) -> Self {
        let resource_usage = node.resource_usage;
        Self {
            node,
            cell_tag,
            now_ms: now_ms(),
            max_started_jobs_per_heartbeat: config.max_started_jobs_per_heartbeat,
            min_spare_resources: config.min_spare_resources(),
            resource_usage,
            resource_usage_discount: JobResources::zero(),
            started_jobs: Vec::new(),
            preempted_jobs: Vec::new(),
            running_jobs,
        }
    }

    /// Cell tag stamped into generated job ids.
    pub const fn cell_tag(&self) -> CellTag {
        self.cell_tag
    }
}

/// Boxed [`NodeSchedulingContext`] for callers that work against the trait.
pub fn create_scheduling_context(
    config: &SchedulingContextConfig,
    node: ExecNodeDescriptor,
    running_jobs: Vec<JobPtr>,
    cell_tag: CellTag,
) -> Box<dyn SchedulingContext> {
    Box::new(NodeSchedulingContext::new(config, node, running_jobs, cell_tag))
}

impl SchedulingContext for NodeSchedulingContext {
    fn node_descriptor(&self) -> &ExecNodeDescriptor {
        &self.node
    }

    fn resource_limits(&self) -> &JobResources {
        &self.node.resource_limits
    }

    fn resource_usage(&self) -> &JobResources {
        &self.resource_usage
    }

    fn resource_usage_mut(&mut self) -> &mut JobResources {
        &mut self.resource_usage
    }

    fn resource_usage_discount(&self) -> &JobResources {
        &self.resource_usage_discount
    }

    fn resource_usage_discount_mut(&mut self) -> &mut JobResources {
        &mut self.resource_usage_discount
    }

    fn started_jobs(&self) -> &[JobPtr] {
        &self.started_jobs
    }

    fn preempted_jobs(&self) -> &[JobPtr] {
        &self.preempted_jobs
    }

    fn running_jobs(&self) -> &[JobPtr] {
        &self.running_jobs
    }

    fn get_started_job(&self, id: &JobId) -> Option<&JobPtr> {
        self.started_jobs.iter().find(|job| job.id == *id)
    }

    fn can_start_more_jobs(&self) -> bool {
        let capacity = self.node.resource_limits + self.resource_usage_discount;
        if !capacity.dominates(&(self.resource_usage + self.min_spare_resources)) {
            return false;
        }
        self.max_started_jobs_per_heartbeat
            .is_none_or(|max| self.started_jobs.len() < max)
    }

    fn can_schedule(&self, tag: Option<&str>) -> bool {
        self.node.can_schedule(tag)
    }

    fn start_job(&mut self, operation_id: &str, request: JobStartRequest) {
        let job = Arc::new(Job {
            id: request.id,
            operation_id: operation_id.to_string(),
            node_id: self.node.id,
            resource_usage: request.resource_limits,
            start_time_ms: self.now_ms,
        });
        self.resource_usage += request.resource_limits;
        tracing::debug!(
            "started job {} of operation {} on node {}",
            job.id,
            operation_id,
            self.node.address
        );
        self.started_jobs.push(job);
    }

    fn preempt_job(&mut self, job: JobPtr) {
        tracing::debug!(
            "preempted job {} of operation {} on node {}",
            job.id,
            job.operation_id,
            self.node.address
        );
        self.preempted_jobs.push(job);
    }

    fn get_now(&self) -> u128 {
        self.now_ms
    }

    fn generate_job_id(&self) -> JobId {
        JobId::generate(self.cell_tag)
    }
}
