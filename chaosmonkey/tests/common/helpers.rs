//! Test helpers for building engines over fake processes

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chaosmonkey::{ChaosMonkey, DisruptionProbabilities, RemoteProcess, RollingRestartPolicy, ServiceDisruptionConfig};

use super::fixtures::{FakeRemoteProcess, TestFixtures};

pub struct TestHelpers;

impl TestHelpers {
    /// Rolling restart policy with no pacing, suitable for fast tests
    pub fn fast_policy(batch_size: usize) -> RollingRestartPolicy {
        RollingRestartPolicy {
            batch_size,
            delay_between_batches: Duration::ZERO,
            healthy_timeout: Some(Duration::from_millis(200)),
            health_poll_interval: Duration::from_millis(5),
        }
    }

    /// Engine over the given fakes, every service using `policy`
    pub fn engine(fleet: &[Arc<FakeRemoteProcess>], policy: RollingRestartPolicy) -> ChaosMonkey {
        let policies: HashMap<String, RollingRestartPolicy> = fleet.iter().map(|p| (p.name(), policy.clone())).collect();
        ChaosMonkey::new(TestFixtures::refs(fleet), policies)
    }

    /// A 10ms schedule that affects every host on every tick
    pub fn config(service: &str, stop: f64, kill: f64, restart: f64) -> ServiceDisruptionConfig {
        ServiceDisruptionConfig::new(
            service,
            DisruptionProbabilities::new(stop, kill, restart),
            Duration::from_millis(10),
        )
        .unwrap()
        .with_node_bounds(usize::MAX, None)
        .unwrap()
    }
}
