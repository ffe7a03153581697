//! Pool hierarchy and scheduler configuration structures.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::config::{JobResourcesConfig, SchedulingContextConfig};
use crate::core::{AppResult, JobResources};

/// Pool configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Parent pool; `None` for a top-level pool.
    pub parent: Option<String>,
    /// Resource ceiling; `None` leaves the pool unconstrained. Dimensions
    /// omitted from a present ceiling are unconstrained too.
    pub resource_limits: Option<JobResourcesConfig>,
}

impl PoolConfig {
    /// Effective limits, infinite where unspecified.
    pub fn limits(&self) -> JobResources {
        self.resource_limits
            .map_or_else(JobResources::infinite, |limits| {
                limits.to_job_resources(JobResources::infinite())
            })
    }

    /// Validate pool configuration values.
    pub fn validate(&self) -> Result<(), String> {
        match &self.resource_limits {
            Some(limits) => limits.validate(),
            None => Ok(()),
        }
    }
}

/// Root scheduler configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Map of pool name to configuration.
    pub pools: HashMap<String, PoolConfig>,
    /// Per-node scheduling pass settings.
    #[serde(default)]
    pub scheduling_context: SchedulingContextConfig,
}

impl SchedulerConfig {
    /// Validate all pools and the parent links between them.
    pub fn validate(&self) -> Result<(), String> {
        if self.pools.is_empty() {
            return Err("at least one pool must be defined".into());
        }
        for (name, pool) in &self.pools {
            pool.validate()
                .map_err(|e| format!("pool `{name}` invalid: {e}"))?;
            if let Some(parent) = &pool.parent {
                if !self.pools.contains_key(parent) {
                    return Err(format!("pool `{name}` has unknown parent `{parent}`"));
                }
            }
            self.depth(name)
                .ok_or_else(|| format!("pool `{name}` is part of a parent cycle"))?;
        }
        self.scheduling_context
            .validate()
            .map_err(|e| format!("scheduling_context invalid: {e}"))
    }

    /// Number of ancestors of `name`, or `None` on a cycle or unknown pool.
    fn depth(&self, name: &str) -> Option<usize> {
        let mut depth = 0;
        let mut current = self.pools.get(name)?;
        while let Some(parent) = &current.parent {
            depth += 1;
            if depth > self.pools.len() {
                return None;
            }
            current = self.pools.get(parent)?;
        }
        Some(depth)
    }

    /// Pool names with every parent listed before its children.
    pub fn pools_in_topological_order(&self) -> Vec<&str> {
        let mut names: Vec<(usize, &str)> = self
            .pools
            .keys()
            .map(|name| (self.depth(name).unwrap_or(usize::MAX), name.as_str()))
            .collect();
        names.sort_unstable();
        names.into_iter().map(|(_, name)| name).collect()
    }

    /// Parse scheduler configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self =
            serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate scheduler configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scheduler config {}", path.display()))?;
        Self::from_json_str(&input)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("invalid scheduler config {}", path.display()))
    }
}
