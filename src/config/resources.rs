//! Partially specified resource vectors, as written in configuration.

use serde::{Deserialize, Serialize};

use crate::core::{JobResources, ResourceKind};

/// Resource vector in which every dimension is optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobResourcesConfig {
    /// Number of job slots.
    pub user_slots: Option<i64>,
    /// CPU, in millicores.
    pub cpu: Option<i64>,
    /// Number of GPUs.
    pub gpu: Option<i64>,
    /// Memory, in bytes.
    pub memory: Option<i64>,
    /// Network weight.
    pub network: Option<i64>,
}

impl JobResourcesConfig {
    /// Read one dimension.
    pub const fn get(&self, kind: ResourceKind) -> Option<i64> {
        match kind {
            ResourceKind::UserSlots => self.user_slots,
            ResourceKind::Cpu => self.cpu,
            ResourceKind::Gpu => self.gpu,
            ResourceKind::Memory => self.memory,
            ResourceKind::Network => self.network,
        }
    }

    /// Fill the missing dimensions from `default`.
    pub fn to_job_resources(&self, default: JobResources) -> JobResources {
        let mut resources = default;
        for kind in ResourceKind::ALL {
            if let Some(value) = self.get(kind) {
                resources.set(kind, value);
            }
        }
        resources
    }

    /// Reject negative values.
    pub fn validate(&self) -> Result<(), String> {
        for kind in ResourceKind::ALL {
            if let Some(value) = self.get(kind) {
                if value < 0 {
                    return Err(format!("{} must not be negative", kind.name()));
                }
            }
        }
        Ok(())
    }
}
