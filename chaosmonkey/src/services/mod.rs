//! Service implementations
//!
//! The scheduled and on-demand disruption paths, the rolling restart
//! procedure, and the concrete collaborators they drive: the ssh shell, the
//! remote process built on it and the static cluster-info collector.

pub mod cluster_info;
pub mod disruption_service;
pub mod remote_process;
pub mod rolling_restart;
pub mod scheduled_disruption;
pub mod ssh;

#[cfg(test)]
mod tests;

// Re-export all service implementations
pub use cluster_info::{service_topology, StaticClusterInfoCollector};
pub use disruption_service::{apply_action, DisruptionResponse, DisruptionService};
pub use remote_process::{CommandTemplates, InitSettings, InitStyle, ProcessCommand, ShellRemoteProcess, SshRemoteProcess};
pub use rolling_restart::{HostFailure, RollingRestart, RollingRestartPolicy, RollingRestartReport};
pub use scheduled_disruption::{ProcessOutcome, ProcessReport, ScheduledDisruption, TickReport};
pub use ssh::{SshCredentials, SshShell};
