//! Resource tree: owns the element forest and its contention counters.
//!
//! The tree never touches an element's resource fields under a lock of its
//! own. Hierarchical operations walk the parent chain and take each
//! element's lock in turn, so admission across levels is not atomic: a delta
//! may be reserved at a child and then rejected at an ancestor, in which case
//! the reservations already made are released again, with precommit clamped
//! at zero.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::core::error::SchedulerError;
use crate::core::job_resources::JobResources;
use crate::core::resource_tree_element::{
    ElementKind, ElementSnapshot, ReleasedResources, ResourceTreeElement,
};

/// Tree-wide lock acquisition counters.
///
/// Relaxed and advisory: a lost increment never affects admission.
#[derive(Debug, Default)]
pub struct ResourceTreeCounters {
    usage_lock_read_count: AtomicU64,
    usage_lock_write_count: AtomicU64,
}

impl ResourceTreeCounters {
    /// Count one read-lock acquisition.
    pub fn increment_usage_lock_read_count(&self) {
        self.usage_lock_read_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one write-lock acquisition.
    pub fn increment_usage_lock_write_count(&self) {
        self.usage_lock_write_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Read-lock acquisitions so far.
    pub fn usage_lock_read_count(&self) -> u64 {
        self.usage_lock_read_count.load(Ordering::Relaxed)
    }

    /// Write-lock acquisitions so far.
    pub fn usage_lock_write_count(&self) -> u64 {
        self.usage_lock_write_count.load(Ordering::Relaxed)
    }
}

/// Contention statistics for the whole tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTreeProfile {
    /// Number of registered elements.
    pub element_count: usize,
    /// Read-lock acquisitions across all elements.
    pub usage_lock_read_count: u64,
    /// Write-lock acquisitions across all elements.
    pub usage_lock_write_count: u64,
}

/// Owner of the pool/operation forest.
#[derive(Debug, Default)]
pub struct ResourceTree {
    counters: Arc<ResourceTreeCounters>,
    elements: RwLock<HashMap<String, Arc<ResourceTreeElement>>>,
}

impl ResourceTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared counters handed to every element.
    pub fn counters(&self) -> Arc<ResourceTreeCounters> {
        Arc::clone(&self.counters)
    }

    /// Register a new detached element.
    pub fn create_element(
        &self,
        id: &str,
        kind: ElementKind,
    ) -> Result<Arc<ResourceTreeElement>, SchedulerError> {
        let mut elements = self.elements.write();
        if elements.contains_key(id) {
            return Err(SchedulerError::DuplicateElement(id.to_string()));
        }
        let element = Arc::new(ResourceTreeElement::new(self.counters(), id, kind));
        elements.insert(id.to_string(), Arc::clone(&element));
        tracing::info!("created {:?} element {}", kind, id);
        Ok(element)
    }

    /// Look up an element by id.
    pub fn get_element(&self, id: &str) -> Option<Arc<ResourceTreeElement>> {
        self.elements.read().get(id).cloned()
    }

    /// Number of registered elements.
    pub fn element_count(&self) -> usize {
        self.elements.read().len()
    }

    /// Link `child_id` under the pool `parent_id`.
    ///
    /// Only a detached, uninitialized element holding no usage or precommit
    /// can be linked; nothing is ever moved between ancestor chains.
    pub fn attach_parent(&self, child_id: &str, parent_id: &str) -> Result<(), SchedulerError> {
        let elements = self.elements.read();
        let child = elements
            .get(child_id)
            .ok_or_else(|| SchedulerError::UnknownElement(child_id.to_string()))?;
        let parent = elements
            .get(parent_id)
            .ok_or_else(|| SchedulerError::UnknownElement(parent_id.to_string()))?;

        let invalid = |reason: &str| SchedulerError::InvalidParent {
            child: child_id.to_string(),
            reason: reason.to_string(),
        };
        if parent.kind() != ElementKind::Pool {
            return Err(invalid("parent must be a pool"));
        }
        if child.parent().is_some() {
            return Err(invalid("element is already attached"));
        }
        if child.is_initialized() {
            return Err(invalid("element is already initialized"));
        }
        if child.get_resource_usage_with_precommit() != JobResources::zero() {
            return Err(invalid("element already holds resources"));
        }
        let mut ancestor = Some(Arc::clone(parent));
        while let Some(current) = ancestor {
            if Arc::ptr_eq(&current, child) {
                return Err(invalid("link would create a cycle"));
            }
            ancestor = current.parent();
        }

        child.set_parent(Some(Arc::clone(parent)));
        tracing::info!("attached element {} to pool {}", child_id, parent_id);
        Ok(())
    }

    /// Tear an element down and return what it still held.
    ///
    /// The element is marked dead, drained exactly once, and the drained
    /// usage and precommit are subtracted from every ancestor.
    pub fn remove_element(&self, id: &str) -> Result<ReleasedResources, SchedulerError> {
        let element = {
            let mut elements = self.elements.write();
            let element = elements
                .get(id)
                .cloned()
                .ok_or_else(|| SchedulerError::UnknownElement(id.to_string()))?;
            let has_children = elements.values().any(|candidate| {
                candidate
                    .parent()
                    .is_some_and(|parent| Arc::ptr_eq(&parent, &element))
            });
            if has_children {
                return Err(SchedulerError::ElementHasChildren(id.to_string()));
            }
            elements.remove(id);
            element
        };

        element.mark_dead();
        let released = element.release_resources();

        let mut ancestor = element.parent();
        while let Some(current) = ancestor {
            // Precommit is clamped at zero: an ancestor that gained limits after
            // the reservation never recorded it.
            if !current.commit_local_resource_usage(&-released.usage, &released.precommit) {
                tracing::warn!(
                    "ancestor {} of removed element {} is not alive",
                    current.id(),
                    id
                );
            }
            ancestor = current.parent();
        }

        tracing::info!(
            "removed element {} (usage {}, precommit {})",
            id,
            released.usage,
            released.precommit
        );
        Ok(released)
    }

    /// Reserve `delta` on `element` and every ancestor, or nowhere.
    ///
    /// Returns the componentwise minimum headroom seen along the chain. On
    /// rejection every level already reserved is unwound and the rejecting
    /// element is named in the error.
    pub fn try_increase_hierarchical_resource_usage_precommit(
        &self,
        element: &Arc<ResourceTreeElement>,
        delta: &JobResources,
    ) -> Result<JobResources, SchedulerError> {
        let mut available = JobResources::infinite();
        let mut reserved: Vec<Arc<ResourceTreeElement>> = Vec::new();
        let mut current = Some(Arc::clone(element));

        while let Some(level) = current {
            match level.increase_local_resource_usage_precommit_with_check(delta) {
                Some(local_available) => {
                    available = available.min(local_available);
                    current = level.parent();
                    reserved.push(level);
                }
                None => {
                    for done in &reserved {
                        done.commit_local_resource_usage(&JobResources::zero(), delta);
                    }
                    let rejecting = level.id().to_string();
                    tracing::debug!(
                        "hierarchical precommit of {} for {} rejected at {}",
                        delta,
                        element.id(),
                        rejecting
                    );
                    return Err(if level.is_alive() {
                        SchedulerError::InsufficientResources { element: rejecting }
                    } else {
                        SchedulerError::ElementNotAlive { element: rejecting }
                    });
                }
            }
        }

        Ok(available)
    }

    /// Add `delta` to precommit at every level without checking limits.
    pub fn increase_hierarchical_resource_usage_precommit(
        &self,
        element: &Arc<ResourceTreeElement>,
        delta: &JobResources,
    ) {
        self.for_each_level(element, |level| level.increase_local_resource_usage_precommit(delta));
    }

    /// Commit `usage_delta` and release `precommitted` at every level.
    pub fn commit_hierarchical_resource_usage(
        &self,
        element: &Arc<ResourceTreeElement>,
        usage_delta: &JobResources,
        precommitted: &JobResources,
    ) {
        self.for_each_level(element, |level| {
            level.commit_local_resource_usage(usage_delta, precommitted)
        });
    }

    /// Add `delta` to committed usage at every level.
    pub fn increase_hierarchical_resource_usage(
        &self,
        element: &Arc<ResourceTreeElement>,
        delta: &JobResources,
    ) {
        self.for_each_level(element, |level| level.increase_local_resource_usage(delta));
    }

    fn for_each_level(
        &self,
        element: &Arc<ResourceTreeElement>,
        apply: impl Fn(&ResourceTreeElement) -> bool,
    ) {
        let mut current = Some(Arc::clone(element));
        while let Some(level) = current {
            if !apply(&*level) {
                tracing::debug!("skipped dead element {} while walking from {}", level.id(), element.id());
            }
            current = level.parent();
        }
    }

    /// Snapshots of every element, sorted by id.
    pub fn snapshot_elements(&self) -> Vec<ElementSnapshot> {
        let elements: Vec<_> = self.elements.read().values().cloned().collect();
        let mut snapshots: Vec<_> = elements.iter().map(|element| element.snapshot()).collect();
        snapshots.sort_by(|lhs, rhs| lhs.id.cmp(&rhs.id));
        snapshots
    }

    /// Current contention counters.
    pub fn profile(&self) -> ResourceTreeProfile {
        ResourceTreeProfile {
            element_count: self.element_count(),
            usage_lock_read_count: self.counters.usage_lock_read_count(),
            usage_lock_write_count: self.counters.usage_lock_write_count(),
        }
    }
}
