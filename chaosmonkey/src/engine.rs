//! The chaos monkey engine
//!
//! Owns the process router, the on-demand dispatcher and one scheduler task
//! per scheduled service. [`ChaosHandle`] is the cloneable view used by the
//! HTTP API; the engine itself is consumed by [`ChaosMonkey::shutdown`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use shared::{logging, service_error, service_info, Action, ActionArguments, ServiceInfo};

use crate::config::ChaosConfig;
use crate::core::{select_targets, DisruptionLockTable, ProcessRef, ProcessRouter, ServiceDisruptionConfig};
use crate::error::{ChaosError, ChaosResult};
use crate::services::{
    service_topology, DisruptionResponse, DisruptionService, RollingRestartPolicy, RollingRestartReport,
    ScheduledDisruption,
};
use crate::traits::ClusterInfoCollector;

/// Cloneable access to the router and dispatcher
#[derive(Clone)]
pub struct ChaosHandle {
    router: Arc<ProcessRouter>,
    dispatcher: Arc<DisruptionService>,
}

impl ChaosHandle {
    pub fn router(&self) -> &ProcessRouter {
        &self.router
    }

    pub fn services(&self) -> Vec<ServiceInfo> {
        self.router.service_infos()
    }

    pub fn contains_service(&self, service: &str) -> bool {
        self.router.contains_service(service)
    }

    pub fn locks(&self) -> &DisruptionLockTable {
        self.dispatcher.locks()
    }

    /// Current lock state of a (service, action) pair
    pub fn is_running(&self, service: &str, action: Action) -> bool {
        self.dispatcher.is_running(service, action)
    }

    /// Apply an action to an explicit target set
    pub async fn trigger_disruption(
        &self,
        service: &str,
        action: Action,
        targets: Vec<ProcessRef>,
        args: &ActionArguments,
    ) -> DisruptionResponse {
        self.dispatcher.disrupt(action, service, targets, args).await
    }

    /// Resolve targets from the request arguments, then dispatch
    pub async fn disrupt_service(
        &self,
        service: &str,
        action: Action,
        args: &ActionArguments,
    ) -> ChaosResult<DisruptionResponse> {
        if !self.router.contains_service(service) {
            return Err(ChaosError::UnknownService {
                service: service.to_string(),
            });
        }

        let targets = {
            let mut rng = rand::thread_rng();
            select_targets(&self.router.by_service(service), args, &mut rng)?
        };
        Ok(self.trigger_disruption(service, action, targets, args).await)
    }
}

pub struct ChaosMonkey {
    handle: ChaosHandle,
    shutdown_tx: watch::Sender<bool>,
    schedulers: Vec<(String, JoinHandle<()>)>,
}

impl ChaosMonkey {
    /// Index the processes and pre-populate the lock table for their services
    pub fn new(processes: Vec<ProcessRef>, policies: HashMap<String, RollingRestartPolicy>) -> Self {
        let router = ProcessRouter::new(processes);
        let locks = DisruptionLockTable::new(router.services());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let dispatcher = DisruptionService::new(Arc::new(locks), shutdown_rx).with_rolling_restart_policies(policies);

        Self {
            handle: ChaosHandle {
                router: Arc::new(router),
                dispatcher: Arc::new(dispatcher),
            },
            shutdown_tx,
            schedulers: Vec::new(),
        }
    }

    /// Build the engine from file configuration and the cluster topology
    ///
    /// Returns the engine with every valid service scheduled, plus the
    /// per-service rejections.
    pub async fn from_config(
        config: &ChaosConfig,
        collector: &dyn ClusterInfoCollector,
    ) -> ChaosResult<(Self, Vec<ChaosError>)> {
        let nodes = collector.node_properties().await?;
        let topology = service_topology(&nodes);
        let processes = config.build_processes(&topology);

        let mut engine = Self::new(processes, config.rolling_restart_policies());
        let (configs, mut rejected) = config.disruption_configs();
        rejected.extend(engine.schedule_all(configs));
        Ok((engine, rejected))
    }

    pub fn handle(&self) -> ChaosHandle {
        self.handle.clone()
    }

    pub fn router(&self) -> &ProcessRouter {
        self.handle.router()
    }

    pub fn is_running(&self, service: &str, action: Action) -> bool {
        self.handle.is_running(service, action)
    }

    pub async fn trigger_disruption(
        &self,
        service: &str,
        action: Action,
        targets: Vec<ProcessRef>,
        args: &ActionArguments,
    ) -> DisruptionResponse {
        self.handle.trigger_disruption(service, action, targets, args).await
    }

    pub async fn disrupt_service(
        &self,
        service: &str,
        action: Action,
        args: &ActionArguments,
    ) -> ChaosResult<DisruptionResponse> {
        self.handle.disrupt_service(service, action, args).await
    }

    /// Start one timer loop per valid config
    ///
    /// A service with no hosts, or one already scheduled, is rejected with a
    /// configuration error naming it; the others are scheduled regardless.
    pub fn schedule_all(&mut self, configs: Vec<ServiceDisruptionConfig>) -> Vec<ChaosError> {
        let mut scheduled: HashSet<String> = self.scheduled_services().into_iter().collect();
        let mut rejected = Vec::new();

        for config in configs {
            let service = config.service().to_string();
            let processes = self.handle.router.by_service(&service);

            if processes.is_empty() {
                service_error!(&service, "❌ No hosts run this service, not scheduling");
                rejected.push(ChaosError::config(&service, "no hosts run this service"));
                continue;
            }
            if !scheduled.insert(service.clone()) {
                rejected.push(ChaosError::config(&service, "service is already scheduled"));
                continue;
            }

            service_info!(&service, "🐒 Adding service to the chaos monkey");
            let task = ScheduledDisruption::new(config, processes).spawn(self.shutdown_tx.subscribe());
            self.schedulers.push((service, task));
        }

        rejected
    }

    pub fn scheduled_services(&self) -> Vec<String> {
        self.schedulers.iter().map(|(service, _)| service.clone()).collect()
    }

    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Stop every scheduler, then drain in-flight rolling restarts
    pub async fn shutdown(self) -> Vec<RollingRestartReport> {
        logging::log_shutdown("chaosmonkey", "stopping schedulers");
        if let Err(e) = self.shutdown_tx.send(true) {
            logging::log_error("chaosmonkey", "broadcasting shutdown", &e);
        }

        for (service, task) in self.schedulers {
            if let Err(e) = task.await {
                service_error!(&service, "Scheduler task failed: {}", e);
            }
        }

        let reports = self.handle.dispatcher.wait_for_sessions().await;
        logging::log_success("chaosmonkey", "all disruptions stopped");
        reports
    }
}
