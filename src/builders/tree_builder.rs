//! Build a pool hierarchy from [`SchedulerConfig`].

use std::path::Path;

use anyhow::Context;

use crate::config::SchedulerConfig;
use crate::core::{AppResult, ElementKind, ResourceTree, SchedulerError};

/// Create every configured pool, link it to its parent and apply its limits.
///
/// Pools are created parents-first and marked initialized once linked.
pub fn build_resource_tree(cfg: &SchedulerConfig) -> Result<ResourceTree, SchedulerError> {
    cfg.validate().map_err(SchedulerError::InvalidConfig)?;

    let tree = ResourceTree::new();
    for name in cfg.pools_in_topological_order() {
        let pool_cfg = &cfg.pools[name];
        let pool = tree.create_element(name, ElementKind::Pool)?;
        if let Some(parent) = &pool_cfg.parent {
            tree.attach_parent(name, parent)?;
        }
        pool.set_resource_limits(pool_cfg.limits());
        pool.mark_initialized();
    }

    tracing::info!("built resource tree with {} pools", tree.element_count());
    Ok(tree)
}

/// Load a JSON [`SchedulerConfig`] from `path` and build its tree.
pub fn load_resource_tree(path: impl AsRef<Path>) -> AppResult<ResourceTree> {
    let path = path.as_ref();
    let cfg = SchedulerConfig::from_json_file(path)?;
    build_resource_tree(&cfg)
        .with_context(|| format!("failed to build resource tree from {}", path.display()))
}
