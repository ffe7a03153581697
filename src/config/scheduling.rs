//! Per-node scheduling pass settings.

use serde::{Deserialize, Serialize};

use crate::config::JobResourcesConfig;
use crate::core::JobResources;

const DEFAULT_MIN_SPARE_CPU: i64 = 1000;
const DEFAULT_MIN_SPARE_MEMORY: i64 = 256 * 1024 * 1024;

/// Settings for [`crate::core::NodeSchedulingContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingContextConfig {
    /// Cap on jobs started on one node per pass; `None` means no cap.
    pub max_started_jobs_per_heartbeat: Option<usize>,
    /// Headroom a node must keep to accept another job.
    pub min_spare_job_resources: JobResourcesConfig,
}

impl Default for SchedulingContextConfig {
    fn default() -> Self {
        Self {
            max_started_jobs_per_heartbeat: None,
            min_spare_job_resources: JobResourcesConfig {
                user_slots: Some(1),
                cpu: Some(DEFAULT_MIN_SPARE_CPU),
                memory: Some(DEFAULT_MIN_SPARE_MEMORY),
                ..JobResourcesConfig::default()
            },
        }
    }
}

impl SchedulingContextConfig {
    /// Minimum spare resources as a full vector, zero where unspecified.
    pub fn min_spare_resources(&self) -> JobResources {
        self.min_spare_job_resources
            .to_job_resources(JobResources::zero())
    }

    /// Validate values.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_started_jobs_per_heartbeat == Some(0) {
            return Err("max_started_jobs_per_heartbeat must be greater than 0".into());
        }
        self.min_spare_job_resources
            .validate()
            .map_err(|e| format!("min_spare_job_resources invalid: {e}"))
    }
}
