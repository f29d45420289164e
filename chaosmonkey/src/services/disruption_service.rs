//! On-demand disruption dispatch
//!
//! Every request runs under the lock table entry for its (service, action)
//! pair. Simple actions are applied to the targets in order and answered
//! synchronously. A rolling restart is answered as soon as its session is
//! spawned; the session owns the lock guard and releases it when it ends.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinSet;
use uuid::Uuid;

use shared::{service_error, service_info, service_warn, Action, ActionArguments};

use crate::core::{DisruptionLockTable, ProcessRef};
use crate::error::ChaosResult;
use crate::services::rolling_restart::{RollingRestart, RollingRestartPolicy, RollingRestartReport};
use crate::traits::{describe, RemoteProcess};

/// Apply the single-process primitive behind an action
///
/// A rolling restart of one process is a plain restart.
pub async fn apply_action(process: &dyn RemoteProcess, action: Action) -> ChaosResult<()> {
    match action {
        Action::Stop => process.stop().await,
        Action::Kill => process.kill().await,
        Action::Restart | Action::RollingRestart => process.restart().await,
        Action::Terminate => process.terminate().await,
        Action::Start => process.start().await,
    }
}

/// Answer to an on-demand disruption request
#[derive(Debug, Clone, PartialEq)]
pub enum DisruptionResponse {
    Completed {
        service: String,
        action: Action,
        processes: usize,
    },
    RollingRestartStarted {
        service: String,
        session_id: Uuid,
    },
    Conflict {
        service: String,
        action: Action,
    },
    TransportError {
        service: String,
        action: Action,
        message: String,
    },
    /// No process of this service is known to the engine
    UnknownService {
        service: String,
    },
}

impl DisruptionResponse {
    pub fn is_ok(&self) -> bool {
        matches!(
            self,
            DisruptionResponse::Completed { .. } | DisruptionResponse::RollingRestartStarted { .. }
        )
    }

    pub fn message(&self) -> String {
        match self {
            DisruptionResponse::Completed {
                service,
                action,
                processes,
            } => format!("{action} completed for: {service} ({processes} processes)"),
            DisruptionResponse::RollingRestartStarted { service, session_id } => {
                format!("Rolling restart {session_id} started for: {service}")
            }
            DisruptionResponse::Conflict { service, action } => format!("{action} is already running for: {service}"),
            DisruptionResponse::TransportError {
                service,
                action,
                message,
            } => format!("{action} failed for: {service}: {message}"),
            DisruptionResponse::UnknownService { service } => format!("Unknown service: {service}"),
        }
    }
}

pub struct DisruptionService {
    locks: Arc<DisruptionLockTable>,
    sessions: Mutex<JoinSet<RollingRestartReport>>,
    shutdown: watch::Receiver<bool>,
    policies: HashMap<String, RollingRestartPolicy>,
    default_policy: RollingRestartPolicy,
}

impl DisruptionService {
    pub fn new(locks: Arc<DisruptionLockTable>, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            locks,
            sessions: Mutex::new(JoinSet::new()),
            shutdown,
            policies: HashMap::new(),
            default_policy: RollingRestartPolicy::default(),
        }
    }

    /// Configure per-service rolling restart defaults (fluent API)
    pub fn with_rolling_restart_policies(mut self, policies: HashMap<String, RollingRestartPolicy>) -> Self {
        self.policies = policies;
        self
    }

    /// Configure the fallback rolling restart policy (fluent API)
    pub fn with_default_policy(mut self, policy: RollingRestartPolicy) -> Self {
        self.default_policy = policy;
        self
    }

    pub fn locks(&self) -> &DisruptionLockTable {
        &self.locks
    }

    pub fn is_running(&self, service: &str, action: Action) -> bool {
        self.locks.is_running(service, action)
    }

    pub fn policy_for(&self, service: &str) -> &RollingRestartPolicy {
        self.policies.get(service).unwrap_or(&self.default_policy)
    }

    /// Apply an action to the given targets under the (service, action) lock
    pub async fn disrupt(
        &self,
        action: Action,
        service: &str,
        processes: Vec<ProcessRef>,
        args: &ActionArguments,
    ) -> DisruptionResponse {
        if !self.locks.contains_service(service) {
            service_warn!(service, "⚠️ {} requested for an unknown service", action);
            return DisruptionResponse::UnknownService {
                service: service.to_string(),
            };
        }

        let Some(guard) = self.locks.acquire_guard(service, action) else {
            service_warn!(service, "⚠️ {} is already running for: {}", action, service);
            return DisruptionResponse::Conflict {
                service: service.to_string(),
                action,
            };
        };

        if action == Action::RollingRestart {
            let session = RollingRestart::new(self.policy_for(service).with_arguments(args));
            let session_id = session.session_id();
            let owned_service = service.to_string();
            let shutdown = self.shutdown.clone();

            let mut sessions = self.sessions.lock().await;
            while sessions.try_join_next().is_some() {}
            sessions.spawn(async move {
                let _guard = guard;
                session.run(&owned_service, processes, shutdown).await
            });

            return DisruptionResponse::RollingRestartStarted {
                service: service.to_string(),
                session_id,
            };
        }

        service_info!(service, "💥 {} requested on {} processes", action, processes.len());
        for process in &processes {
            if let Err(e) = apply_action(process.as_ref(), action).await {
                service_error!(service, "❌ {} of {} failed, aborting: {}", action, describe(process.as_ref()), e);
                return DisruptionResponse::TransportError {
                    service: service.to_string(),
                    action,
                    message: e.to_string(),
                };
            }
        }
        drop(guard);

        DisruptionResponse::Completed {
            service: service.to_string(),
            action,
            processes: processes.len(),
        }
    }

    /// Wait for every rolling restart session spawned so far
    pub async fn wait_for_sessions(&self) -> Vec<RollingRestartReport> {
        let mut pending = std::mem::take(&mut *self.sessions.lock().await);
        let mut reports = Vec::new();
        while let Some(result) = pending.join_next().await {
            match result {
                Ok(report) => reports.push(report),
                Err(e) => tracing::error!("Rolling restart session failed: {}", e),
            }
        }
        reports
    }
}
