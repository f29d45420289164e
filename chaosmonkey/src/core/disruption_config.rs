//! Validated per-service disruption configuration and outcome banding
//!
//! The three probabilities are mutually exclusive outcomes of one uniform
//! draw: STOP owns `[0, stop)`, KILL `[stop, stop + kill)`, RESTART the next
//! `restart` wide slice, and the remainder of `[0, 1)` means no action.

use rand::Rng;
use std::time::Duration;

use shared::Action;

use crate::error::{ChaosError, ChaosResult};

/// Tolerance for float summation when checking the probability total
const PROBABILITY_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DisruptionProbabilities {
    pub stop: f64,
    pub kill: f64,
    pub restart: f64,
}

impl DisruptionProbabilities {
    pub fn new(stop: f64, kill: f64, restart: f64) -> Self {
        Self { stop, kill, restart }
    }

    pub fn total(&self) -> f64 {
        self.stop + self.kill + self.restart
    }

    /// Map a draw in `[0, 1)` onto its band, evaluated STOP, KILL, RESTART
    pub fn action_for(&self, draw: f64) -> Option<Action> {
        if draw < self.stop {
            Some(Action::Stop)
        } else if draw < self.stop + self.kill {
            Some(Action::Kill)
        } else if draw < self.stop + self.kill + self.restart {
            Some(Action::Restart)
        } else {
            None
        }
    }

    fn validate(&self, service: &str) -> ChaosResult<()> {
        for (field, value) in [("stop_probability", self.stop), ("kill_probability", self.kill), ("restart_probability", self.restart)] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ChaosError::config(service, format!("{field} must be within [0, 1], got {value}")));
            }
        }
        if self.stop == 0.0 && self.kill == 0.0 && self.restart == 0.0 {
            return Err(ChaosError::config(
                service,
                "stop_probability, kill_probability and restart_probability may not all be 0.0 or undefined",
            ));
        }
        if self.total() > 1.0 + PROBABILITY_EPSILON {
            return Err(ChaosError::config(
                service,
                format!(
                    "combined stop_probability, kill_probability and restart_probability of {} is over 1.0",
                    self.total()
                ),
            ));
        }
        Ok(())
    }
}

/// Inclusive bounds on how many hosts a tick may disrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeBounds {
    pub min: usize,
    pub max: usize,
}

impl NodeBounds {
    /// Uniform draw in `[min, max]`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.gen_range(self.min..=self.max)
    }
}

/// Immutable disruption settings for one service
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDisruptionConfig {
    service: String,
    probabilities: DisruptionProbabilities,
    execution_period: Duration,
    min_nodes_per_iteration: usize,
    max_nodes_per_iteration: Option<usize>,
}

impl ServiceDisruptionConfig {
    /// Validate probabilities and period; rejects rather than clamps
    pub fn new(
        service: impl Into<String>,
        probabilities: DisruptionProbabilities,
        execution_period: Duration,
    ) -> ChaosResult<Self> {
        let service = service.into();
        probabilities.validate(&service)?;
        if execution_period.is_zero() {
            return Err(ChaosError::config(&service, "execution period must be greater than zero"));
        }
        Ok(Self {
            service,
            probabilities,
            execution_period,
            min_nodes_per_iteration: 0,
            max_nodes_per_iteration: None,
        })
    }

    /// Set node bounds; `max = None` means every host of the service
    pub fn with_node_bounds(mut self, min: usize, max: Option<usize>) -> ChaosResult<Self> {
        if let Some(max) = max {
            if min > max {
                return Err(ChaosError::config(
                    &self.service,
                    format!("min_nodes_per_iteration ({min}) exceeds max_nodes_per_iteration ({max})"),
                ));
            }
        }
        self.min_nodes_per_iteration = min;
        self.max_nodes_per_iteration = max;
        Ok(self)
    }

    /// Clamp the configured bounds to the number of hosts running the service
    pub fn node_bounds(&self, host_count: usize) -> NodeBounds {
        let max = self.max_nodes_per_iteration.unwrap_or(host_count).min(host_count);
        let min = self.min_nodes_per_iteration.min(max);
        NodeBounds { min, max }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn probabilities(&self) -> DisruptionProbabilities {
        self.probabilities
    }

    pub fn execution_period(&self) -> Duration {
        self.execution_period
    }
}
