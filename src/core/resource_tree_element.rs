//! One node of the resource-accounting tree: a pool or an operation.
//!
//! Each element guards its (usage, precommit, limits) triple with its own
//! `parking_lot::RwLock`, so scheduling threads that work on unrelated pools
//! never contend. Admission is two-phase:
//!
//! 1. [`ResourceTreeElement::increase_local_resource_usage_precommit_with_check`]
//!    reserves a delta if it fits under the limits (precommit).
//! 2. [`ResourceTreeElement::commit_local_resource_usage`] turns the reservation
//!    into committed usage once the job is confirmed.
//!
//! Pools without explicit limits skip precommit bookkeeping entirely: they
//! impose no bound, so there is nothing to reserve against.
//!
//! Expected failures (the element is dead, the delta does not fit) are
//! reported as `false`/`None`. Committed usage going negative is a caller bug
//! and aborts via panic.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::core::job_resources::{compute_available_resources, JobResources};
use crate::core::resource_tree::ResourceTreeCounters;

/// What an element stands for in the pool hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// Internal node aggregating descendants, optionally capped by limits.
    Pool,
    /// Leaf consuming resources; always keeps precommit bookkeeping.
    Operation,
}

impl ElementKind {
    /// Whether precommit is tracked regardless of configured limits.
    pub const fn always_accounted(self) -> bool {
        matches!(self, Self::Operation)
    }
}

/// Counters drained from an element at teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReleasedResources {
    /// Committed usage at the time of release.
    pub usage: JobResources,
    /// Outstanding precommit at the time of release.
    pub precommit: JobResources,
}

/// Point-in-time view of an element, for dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Element id.
    pub id: String,
    /// Element kind.
    pub kind: ElementKind,
    /// Parent id, if attached.
    pub parent: Option<String>,
    /// Committed usage.
    pub usage: JobResources,
    /// Reserved-but-uncommitted usage.
    pub precommit: JobResources,
    /// Configured limits.
    pub limits: JobResources,
    /// Whether the element still accepts mutations.
    pub alive: bool,
    /// Whether the element has been wired into the tree.
    pub initialized: bool,
}

#[derive(Debug)]
struct UsageState {
    usage: JobResources,
    precommit: JobResources,
    limits: JobResources,
}

/// A pool or operation node with its own reader/writer lock.
///
/// `alive` and `limits_specified` are only written while holding the write
/// lock; lock-free reads of them are fast-path hints that get re-checked
/// under the lock.
#[derive(Debug)]
pub struct ResourceTreeElement {
    counters: Arc<ResourceTreeCounters>,
    id: String,
    kind: ElementKind,
    parent: RwLock<Option<Arc<ResourceTreeElement>>>,
    state: RwLock<UsageState>,
    alive: AtomicBool,
    limits_specified: AtomicBool,
    initialized: AtomicBool,
}

impl ResourceTreeElement {
    /// Create a live, uninitialized element with zero usage and infinite limits.
    pub fn new(counters: Arc<ResourceTreeCounters>, id: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            counters,
            id: id.into(),
            kind,
            parent: RwLock::new(None),
            state: RwLock::new(UsageState {
                usage: JobResources::zero(),
                precommit: JobResources::zero(),
                limits: JobResources::infinite(),
            }),
            alive: AtomicBool::new(true),
            limits_specified: AtomicBool::new(false),
            initialized: AtomicBool::new(false),
        }
    }

    /// Element id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Element kind.
    pub const fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Parent element, if attached.
    pub fn parent(&self) -> Option<Arc<Self>> {
        self.parent.read().clone()
    }

    pub(crate) fn set_parent(&self, parent: Option<Arc<Self>>) {
        *self.parent.write() = parent;
    }

    /// Whether the element still accepts usage mutations.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Whether [`mark_initialized`](Self::mark_initialized) has been called.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Whether limits other than infinite are configured.
    pub fn are_resource_limits_specified(&self) -> bool {
        self.limits_specified.load(Ordering::Acquire)
    }

    fn skips_precommit(&self) -> bool {
        !self.kind.always_accounted() && !self.are_resource_limits_specified()
    }

    /// Committed usage.
    pub fn get_resource_usage(&self) -> JobResources {
        let state = self.state.read();
        self.counters.increment_usage_lock_read_count();
        state.usage
    }

    /// Committed usage plus outstanding precommit.
    pub fn get_resource_usage_with_precommit(&self) -> JobResources {
        let state = self.state.read();
        self.counters.increment_usage_lock_read_count();
        state.usage + state.precommit
    }

    /// Outstanding precommit.
    pub fn get_resource_usage_precommit(&self) -> JobResources {
        let state = self.state.read();
        self.counters.increment_usage_lock_read_count();
        state.precommit
    }

    /// Configured limits.
    pub fn get_resource_limits(&self) -> JobResources {
        let state = self.state.read();
        self.counters.increment_usage_lock_read_count();
        state.limits
    }

    /// Would `delta` fit if `demand` were the ceiling and `discount` were given back?
    ///
    /// Read-only; used during preemption analysis.
    pub fn check_demand(
        &self,
        delta: &JobResources,
        demand: &JobResources,
        discount: &JobResources,
    ) -> bool {
        let state = self.state.read();
        self.counters.increment_usage_lock_read_count();

        let available = compute_available_resources(demand, &(state.usage + state.precommit), discount);
        available.dominates(delta)
    }

    /// Store new limits. A pool that becomes unconstrained drops its precommit.
    pub fn set_resource_limits(&self, limits: JobResources) {
        let mut state = self.state.write();
        self.counters.increment_usage_lock_write_count();

        state.limits = limits;
        let specified = limits != JobResources::infinite();
        self.limits_specified.store(specified, Ordering::Release);
        if !specified && !self.kind.always_accounted() {
            state.precommit = JobResources::zero();
        }
        tracing::debug!("element {} limits set to {}", self.id, limits);
    }

    /// Add `delta` to precommit without checking limits.
    ///
    /// Callers use this after validating availability elsewhere.
    pub fn increase_local_resource_usage_precommit(&self, delta: &JobResources) -> bool {
        if !self.is_alive() {
            return false;
        }
        if self.skips_precommit() {
            return true;
        }

        let mut state = self.state.write();
        self.counters.increment_usage_lock_write_count();

        if !self.is_alive() {
            return false;
        }
        if self.skips_precommit() {
            return true;
        }

        state.precommit += *delta;
        true
    }

    /// Reserve `delta` if it fits under the limits.
    ///
    /// Returns the headroom seen before the reservation, or `None` if the
    /// element is dead or the delta does not fit (state is left untouched).
    /// Unconstrained pools accept everything and report infinite headroom.
    pub fn increase_local_resource_usage_precommit_with_check(
        &self,
        delta: &JobResources,
    ) -> Option<JobResources> {
        if !self.is_alive() {
            return None;
        }
        if self.skips_precommit() {
            return Some(JobResources::infinite());
        }

        let mut state = self.state.write();
        self.counters.increment_usage_lock_write_count();

        if !self.is_alive() {
            return None;
        }
        if self.skips_precommit() {
            return Some(JobResources::infinite());
        }

        // Per-element discounts are not applied here; a job admitted because of
        // a stale discount gets preempted right after scheduling.
        let available = compute_available_resources(
            &state.limits,
            &(state.usage + state.precommit),
            &JobResources::zero(),
        );

        if !available.dominates(delta) {
            tracing::debug!(
                "element {} rejected precommit {} (available {})",
                self.id,
                delta,
                available
            );
            return None;
        }

        state.precommit += *delta;
        Some(available)
    }

    /// Add `usage_delta` to committed usage and release `precommitted` from precommit.
    ///
    /// Precommit is clamped at zero: it may have been accumulated before the
    /// limits were set and so be smaller than what the caller releases.
    ///
    /// # Panics
    ///
    /// Panics if committed usage becomes negative in any dimension.
    pub fn commit_local_resource_usage(
        &self,
        usage_delta: &JobResources,
        precommitted: &JobResources,
    ) -> bool {
        let mut state = self.state.write();
        self.counters.increment_usage_lock_write_count();

        if !self.is_alive() {
            return false;
        }

        state.usage += *usage_delta;
        if self.kind.always_accounted() || self.are_resource_limits_specified() {
            state.precommit = (state.precommit - *precommitted).max(JobResources::zero());
        }

        self.verify_usage_non_negative(&state.usage);
        true
    }

    /// Add `delta` to committed usage with no matching precommit.
    ///
    /// # Panics
    ///
    /// Panics if committed usage becomes negative in any dimension.
    pub fn increase_local_resource_usage(&self, delta: &JobResources) -> bool {
        let mut state = self.state.write();
        self.counters.increment_usage_lock_write_count();

        if !self.is_alive() {
            return false;
        }

        state.usage += *delta;

        self.verify_usage_non_negative(&state.usage);
        true
    }

    /// Drain usage and precommit from a dead element, leaving both at zero.
    ///
    /// # Panics
    ///
    /// Panics if the element is still alive.
    pub fn release_resources(&self) -> ReleasedResources {
        let mut state = self.state.write();
        self.counters.increment_usage_lock_write_count();

        assert!(
            !self.is_alive(),
            "element `{}` must be marked dead before releasing resources",
            self.id
        );

        let released = ReleasedResources {
            usage: state.usage,
            precommit: state.precommit,
        };
        state.usage = JobResources::zero();
        state.precommit = JobResources::zero();
        released
    }

    /// Stop accepting usage mutations. Irreversible.
    pub fn mark_dead(&self) {
        let _state = self.state.write();
        self.counters.increment_usage_lock_write_count();
        self.alive.store(false, Ordering::Release);
        tracing::debug!("element {} marked dead", self.id);
    }

    /// Flag the element as fully linked into the tree. Advisory only.
    pub fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::Release);
    }

    /// Consistent copy of the element's counters and flags.
    pub fn snapshot(&self) -> ElementSnapshot {
        let parent = self.parent().map(|parent| parent.id.clone());
        let state = self.state.read();
        self.counters.increment_usage_lock_read_count();
        ElementSnapshot {
            id: self.id.clone(),
            kind: self.kind,
            parent,
            usage: state.usage,
            precommit: state.precommit,
            limits: state.limits,
            alive: self.is_alive(),
            initialized: self.is_initialized(),
        }
    }

    fn verify_usage_non_negative(&self, usage: &JobResources) {
        if !usage.dominates(&JobResources::zero()) {
            tracing::error!("element {} resource usage went negative: {}", self.id, usage);
            panic!("resource usage of `{}` must not be negative, got {usage}", self.id);
        }
    }
}
