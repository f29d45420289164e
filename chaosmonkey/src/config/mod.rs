//! File configuration for the chaos monkey
//!
//! One JSON document holds the ssh credentials, the static node list used as
//! cluster topology, and the disruption settings of every service.

pub mod service;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use shared::{service_warn, NodeProperties};

use crate::core::{ProcessRef, ServiceDisruptionConfig};
use crate::error::{ChaosError, ChaosResult};
use crate::services::{RollingRestartPolicy, SshCredentials, SshRemoteProcess, SshShell};

pub use service::{RollingRestartSettings, ServiceSettings};

/// Default configuration file name
pub const DEFAULT_CONFIG_PATH: &str = "chaosmonkey.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChaosConfig {
    /// Remote user; defaults to the local `$USER`
    #[serde(default)]
    pub username: Option<String>,
    /// Identity file passed to ssh. ssh runs in batch mode, so a passphrase
    /// protected key must already be loaded into ssh-agent.
    #[serde(default)]
    pub private_key: Option<PathBuf>,
    #[serde(default)]
    pub ssh_port: Option<u16>,
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    #[serde(default)]
    pub nodes: Vec<NodeProperties>,
    #[serde(default)]
    pub services: BTreeMap<String, ServiceSettings>,
}

impl ChaosConfig {
    pub fn load(path: impl AsRef<Path>) -> ChaosResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> ChaosResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn credentials(&self) -> SshCredentials {
        let username = self
            .username
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| "root".to_string());

        let credentials = SshCredentials::new(username)
            .with_private_key(self.private_key.clone())
            .with_port(self.ssh_port);
        match self.connect_timeout_secs {
            Some(secs) => credentials.with_connect_timeout(secs),
            None => credentials,
        }
    }

    /// One ssh-backed process per (service, address) of the topology
    ///
    /// Discovered services without settings, or without a pid path, are
    /// skipped with a warning.
    pub fn build_processes(&self, topology: &BTreeMap<String, Vec<String>>) -> Vec<ProcessRef> {
        let credentials = self.credentials();
        if credentials.identity_needs_agent() && std::env::var_os("SSH_AUTH_SOCK").is_none() {
            tracing::warn!(
                key = ?credentials.private_key,
                "🔑 Identity file is passphrase protected and no ssh-agent is running; load it with ssh-add"
            );
        }
        let mut processes = Vec::new();

        for (service, addresses) in topology {
            let Some(settings) = self.services.get(service) else {
                service_warn!(service, "No configuration for discovered service, skipping");
                continue;
            };
            let pid_path = match settings.pid_path(service) {
                Ok(pid_path) => pid_path,
                Err(e) => {
                    service_warn!(service, "Skipping service: {}", e);
                    continue;
                }
            };

            for address in addresses {
                let shell = SshShell::new(address.clone(), credentials.clone());
                let process = SshRemoteProcess::new(service.clone(), pid_path, settings.init.clone(), shell);
                processes.push(Arc::new(process) as ProcessRef);
            }
        }

        processes
    }

    /// Validated schedules for every service that has an interval
    ///
    /// A rejected service never affects the others; its error is returned
    /// alongside the accepted configs.
    pub fn disruption_configs(&self) -> (Vec<ServiceDisruptionConfig>, Vec<ChaosError>) {
        let mut configs = Vec::new();
        let mut rejected = Vec::new();

        for (service, settings) in &self.services {
            match settings.to_disruption_config(service) {
                Ok(Some(config)) => configs.push(config),
                Ok(None) => {
                    service_warn!(service, "No valid interval, service will not be scheduled");
                }
                Err(e) => rejected.push(e),
            }
        }

        (configs, rejected)
    }

    pub fn rolling_restart_policies(&self) -> HashMap<String, RollingRestartPolicy> {
        self.services
            .iter()
            .map(|(service, settings)| (service.clone(), settings.rolling_restart_policy()))
            .collect()
    }
}
