//! Periodic probabilistic disruption of one service
//!
//! Each tick draws one value to pick STOP, KILL, RESTART or nothing, draws
//! how many hosts to affect, reshuffles the service's processes and applies
//! the action to the first `n` of them, subject to each process's current
//! liveness. Ticks of one service never overlap; separate services run on
//! separate tasks.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use shared::{service_debug, service_error, service_info, Action};

use crate::core::{NodeBounds, ProcessRef, ServiceDisruptionConfig};
use crate::error::ChaosResult;
use crate::services::disruption_service::apply_action;
use crate::traits::{describe, RemoteProcess};

/// What happened to one process of the affected set
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// The action was applied and the liveness change was observed
    Disrupted,
    /// Liveness did not meet the action's precondition
    Skipped,
    /// The action was applied but liveness did not change
    Anomaly,
    /// A remote call failed
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessReport {
    pub address: String,
    pub outcome: ProcessOutcome,
}

/// Result of one tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub draw: f64,
    pub action: Option<Action>,
    pub affected: Vec<String>,
    pub processes: Vec<ProcessReport>,
}

impl TickReport {
    pub fn count(&self, outcome: &ProcessOutcome) -> usize {
        self.processes.iter().filter(|report| &report.outcome == outcome).count()
    }

    /// Processes whose remote calls failed this tick
    pub fn failures(&self) -> usize {
        self.processes
            .iter()
            .filter(|report| matches!(report.outcome, ProcessOutcome::Failed(_)))
            .count()
    }
}

pub struct ScheduledDisruption {
    config: ServiceDisruptionConfig,
    processes: Vec<ProcessRef>,
    bounds: NodeBounds,
}

impl ScheduledDisruption {
    /// Bind a validated config to the service's own process list
    pub fn new(config: ServiceDisruptionConfig, processes: Vec<ProcessRef>) -> Self {
        let bounds = config.node_bounds(processes.len());
        Self {
            config,
            processes,
            bounds,
        }
    }

    pub fn service(&self) -> &str {
        self.config.service()
    }

    pub fn bounds(&self) -> NodeBounds {
        self.bounds
    }

    /// Run a single decision-and-act cycle
    ///
    /// Remote failures, authentication included, are recorded per process
    /// and never cut the tick short.
    pub async fn run_one_iteration<R>(&mut self, rng: &mut R) -> TickReport
    where
        R: Rng + Send,
    {
        let draw: f64 = rng.gen();
        let node_count = self.bounds.sample(rng);
        let action = self.config.probabilities().action_for(draw);

        self.processes.shuffle(rng);
        let affected: Vec<ProcessRef> = self.processes.iter().take(node_count).cloned().collect();

        let mut report = TickReport {
            draw,
            action,
            affected: affected.iter().map(|p| p.address()).collect(),
            processes: Vec::with_capacity(affected.len()),
        };

        let Some(action) = action else {
            service_debug!(self.service(), "No disruption this tick (draw {:.3})", draw);
            return report;
        };

        for process in affected {
            let outcome = match disrupt_process(action, process.as_ref()).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    if e.is_authentication() {
                        service_error!(
                            self.service(),
                            "🔑 {} rejected our credentials, check ssh access: {}",
                            describe(process.as_ref()),
                            e
                        );
                    } else {
                        service_error!(self.service(), "❌ {} of {} failed: {}", action, describe(process.as_ref()), e);
                    }
                    ProcessOutcome::Failed(e.to_string())
                }
            };
            report.processes.push(ProcessReport {
                address: process.address(),
                outcome,
            });
        }

        report
    }

    /// Run ticks at a fixed period until shutdown is signalled
    ///
    /// The first tick fires immediately.
    pub fn spawn(mut self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            let mut ticker = interval(self.config.execution_period());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            service_info!(
                self.service(),
                "⏱️ Scheduling every {:?} across {} hosts ({}..={} per tick)",
                self.config.execution_period(),
                self.processes.len(),
                self.bounds.min,
                self.bounds.max
            );

            loop {
                if *shutdown.borrow() {
                    break;
                }
                tokio::select! {
                    biased;
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        let report = self.run_one_iteration(&mut rng).await;
                        service_debug!(
                            self.service(),
                            "Tick finished: {:?} on {} hosts ({} failed)",
                            report.action,
                            report.affected.len(),
                            report.failures()
                        );
                    }
                }
            }

            service_debug!(self.service(), "Scheduler stopped");
        })
    }
}

/// Apply a scheduled action to one process, guarded by its liveness
async fn disrupt_process(action: Action, process: &dyn RemoteProcess) -> ChaosResult<ProcessOutcome> {
    let name = process.name();
    let label = describe(process);
    let running_before = process.is_running().await?;

    let wants_running = matches!(action, Action::Restart | Action::Start);
    if running_before == wants_running {
        service_debug!(&name, "Skipping {} of {}: running = {}", action, label, running_before);
        return Ok(ProcessOutcome::Skipped);
    }

    service_info!(&name, "Attempting to {} {}", action.command(), label);
    apply_action(process, action).await?;

    let running_after = process.is_running().await?;
    if running_after == wants_running {
        if running_after {
            service_info!(&name, "{} is now running", label);
        } else {
            service_info!(&name, "{} is no longer running", label);
        }
        Ok(ProcessOutcome::Disrupted)
    } else {
        if running_after {
            service_error!(&name, "{} is still running!", label);
        } else {
            service_error!(&name, "{} did not restart", label);
        }
        Ok(ProcessOutcome::Anomaly)
    }
}
