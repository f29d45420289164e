//! Per-service settings as written in the configuration file

use serde::{Deserialize, Serialize};
use std::time::Duration;

use shared::ActionArguments;

use crate::core::{DisruptionProbabilities, ServiceDisruptionConfig};
use crate::error::{ChaosError, ChaosResult};
use crate::services::{InitSettings, RollingRestartPolicy};

/// Rolling restart defaults for one service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingRestartSettings {
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub delay_between_batches_secs: Option<u64>,
    #[serde(default)]
    pub healthy_timeout_secs: Option<u64>,
}

impl RollingRestartSettings {
    pub fn to_policy(&self) -> RollingRestartPolicy {
        RollingRestartPolicy::default().with_arguments(&ActionArguments {
            batch_size: self.batch_size,
            delay_between_batches_secs: self.delay_between_batches_secs,
            healthy_timeout_secs: self.healthy_timeout_secs,
            ..Default::default()
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Seconds between ticks; missing or zero leaves the service unscheduled
    #[serde(default)]
    pub interval: Option<u64>,
    #[serde(default)]
    pub pid_path: Option<String>,
    #[serde(default)]
    pub stop_probability: f64,
    #[serde(default)]
    pub kill_probability: f64,
    #[serde(default)]
    pub restart_probability: f64,
    #[serde(default)]
    pub min_nodes_per_iteration: usize,
    #[serde(default)]
    pub max_nodes_per_iteration: Option<usize>,
    #[serde(default)]
    pub init: InitSettings,
    #[serde(default)]
    pub rolling_restart: Option<RollingRestartSettings>,
}

impl ServiceSettings {
    pub fn pid_path(&self, service: &str) -> ChaosResult<&str> {
        self.pid_path
            .as_deref()
            .ok_or_else(|| ChaosError::config(service, "pid_path is required"))
    }

    pub fn is_scheduled(&self) -> bool {
        matches!(self.interval, Some(secs) if secs > 0)
    }

    pub fn probabilities(&self) -> DisruptionProbabilities {
        DisruptionProbabilities::new(self.stop_probability, self.kill_probability, self.restart_probability)
    }

    /// Validated schedule for this service, or `None` when it has no interval
    pub fn to_disruption_config(&self, service: &str) -> ChaosResult<Option<ServiceDisruptionConfig>> {
        self.pid_path(service)?;
        let Some(interval) = self.interval.filter(|secs| *secs > 0) else {
            return Ok(None);
        };

        ServiceDisruptionConfig::new(service, self.probabilities(), Duration::from_secs(interval))?
            .with_node_bounds(self.min_nodes_per_iteration, self.max_nodes_per_iteration)
            .map(Some)
    }

    pub fn rolling_restart_policy(&self) -> RollingRestartPolicy {
        self.rolling_restart
            .as_ref()
            .map(RollingRestartSettings::to_policy)
            .unwrap_or_default()
    }
}
