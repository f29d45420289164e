//! Batched, paced restart of a service's processes
//!
//! Processes are restarted in consecutive batches. Members of a batch are
//! restarted concurrently and, when a healthy timeout is set, polled until
//! they report running. Batches are strictly sequential and separated by
//! the configured delay. A host that fails is recorded and the sweep moves
//! on; once shutdown is signalled no further batch starts.

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, timeout};
use uuid::Uuid;

use shared::{service_error, service_info, service_warn, ActionArguments};

use crate::core::ProcessRef;
use crate::traits::{describe, RemoteProcess};

/// Pacing and health policy for a rolling restart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollingRestartPolicy {
    pub batch_size: usize,
    pub delay_between_batches: Duration,
    pub healthy_timeout: Option<Duration>,
    pub health_poll_interval: Duration,
}

impl Default for RollingRestartPolicy {
    fn default() -> Self {
        Self {
            batch_size: 1,
            delay_between_batches: Duration::from_secs(10),
            healthy_timeout: Some(Duration::from_secs(60)),
            health_poll_interval: Duration::from_secs(2),
        }
    }
}

impl RollingRestartPolicy {
    /// Overlay per-request arguments on this policy
    pub fn with_arguments(&self, args: &ActionArguments) -> Self {
        let mut policy = self.clone();
        if let Some(batch_size) = args.batch_size {
            policy.batch_size = batch_size.max(1);
        }
        if let Some(delay) = args.delay_between_batches_secs {
            policy.delay_between_batches = Duration::from_secs(delay);
        }
        if let Some(secs) = args.healthy_timeout_secs {
            policy.healthy_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        policy
    }
}

/// A host that could not be restarted or did not come back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFailure {
    pub address: String,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct RollingRestartReport {
    pub session_id: Uuid,
    pub service: String,
    pub batches: Vec<Vec<String>>,
    pub failures: Vec<HostFailure>,
    pub interrupted: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RollingRestartReport {
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.iter().map(Vec::len).collect()
    }

    pub fn restarted(&self) -> usize {
        self.batches.iter().map(Vec::len).sum::<usize>() - self.failures.len()
    }
}

pub struct RollingRestart {
    session_id: Uuid,
    policy: RollingRestartPolicy,
}

impl RollingRestart {
    pub fn new(policy: RollingRestartPolicy) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            policy,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn policy(&self) -> &RollingRestartPolicy {
        &self.policy
    }

    /// Split the targets into consecutive batches; the last may be smaller
    pub fn partition(processes: &[ProcessRef], batch_size: usize) -> Vec<Vec<ProcessRef>> {
        processes.chunks(batch_size.max(1)).map(<[ProcessRef]>::to_vec).collect()
    }

    /// Sweep the targets batch by batch
    pub async fn run(&self, service: &str, processes: Vec<ProcessRef>, mut shutdown: watch::Receiver<bool>) -> RollingRestartReport {
        let batches = Self::partition(&processes, self.policy.batch_size);
        let total = batches.len();
        let mut report = RollingRestartReport {
            session_id: self.session_id,
            service: service.to_string(),
            batches: Vec::with_capacity(total),
            failures: Vec::new(),
            interrupted: false,
            started_at: Utc::now(),
            finished_at: Utc::now(),
        };

        service_info!(
            service,
            "🔄 Rolling restart {} started: {} processes in {} batches",
            self.session_id,
            processes.len(),
            total
        );

        for (index, batch) in batches.into_iter().enumerate() {
            if *shutdown.borrow() {
                service_warn!(service, "Rolling restart {} interrupted before batch {}/{}", self.session_id, index + 1, total);
                report.interrupted = true;
                break;
            }

            service_info!(service, "Restarting batch {}/{} ({} processes)", index + 1, total, batch.len());
            let results = join_all(batch.iter().map(|process| self.restart_one(process.as_ref()))).await;

            for (process, result) in batch.iter().zip(results) {
                if let Err(reason) = result {
                    service_error!(service, "❌ {} failed during rolling restart: {}", describe(process.as_ref()), reason);
                    report.failures.push(HostFailure {
                        address: process.address(),
                        reason,
                    });
                }
            }
            report.batches.push(batch.iter().map(|p| p.address()).collect());

            let is_last = index + 1 == total;
            if !is_last && !self.policy.delay_between_batches.is_zero() {
                tokio::select! {
                    _ = sleep(self.policy.delay_between_batches) => {}
                    Ok(()) = shutdown.changed() => {}
                }
            }
        }

        report.finished_at = Utc::now();
        service_info!(
            service,
            "Rolling restart {} finished: {} restarted, {} failed",
            self.session_id,
            report.restarted(),
            report.failures.len()
        );
        report
    }

    async fn restart_one(&self, process: &dyn RemoteProcess) -> Result<(), String> {
        process.restart().await.map_err(|e| e.to_string())?;

        match self.policy.healthy_timeout {
            Some(limit) => self.wait_until_running(process, limit).await,
            None => Ok(()),
        }
    }

    async fn wait_until_running(&self, process: &dyn RemoteProcess, limit: Duration) -> Result<(), String> {
        let poll = async {
            loop {
                match process.is_running().await {
                    Ok(true) => return Ok(()),
                    Ok(false) => sleep(self.policy.health_poll_interval).await,
                    Err(e) => return Err(e.to_string()),
                }
            }
        };

        timeout(limit, poll)
            .await
            .unwrap_or_else(|_| Err(format!("not running after {limit:?}")))
    }
}
