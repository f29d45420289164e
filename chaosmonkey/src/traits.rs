//! Trait definitions with mockall annotations for testing
//!
//! These are the seams between the disruption engine and the outside world:
//! the remote shell used to reach a host, the controllable process on that
//! host, and the provider that reports which hosts run which services.

use shared::NodeProperties;

use crate::error::ChaosResult;

/// Captured result of a command run on a remote host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ShellOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Remote command execution channel to a single host
#[mockall::automock]
#[async_trait::async_trait]
pub trait RemoteShell: Send + Sync {
    /// Address of the host this shell talks to
    fn address(&self) -> String;

    /// Run a command on the host and wait for it to finish
    ///
    /// A non-zero exit code of the command itself is not an error; only a
    /// failure of the channel is.
    async fn exec(&self, command: &str) -> ChaosResult<ShellOutput>;
}

/// One controllable service instance on one host
///
/// Every operation may fail with a transport error; no retries happen
/// underneath. Liveness is queried on demand and never cached.
#[mockall::automock]
#[async_trait::async_trait]
pub trait RemoteProcess: Send + Sync {
    /// Logical service name
    fn name(&self) -> String;

    /// Address of the host running this instance
    fn address(&self) -> String;

    /// Path of the pid file used as liveness check
    fn pid_file(&self) -> String;

    /// Execute a raw command on the host and return its exit code
    async fn execute(&self, command: &str) -> ChaosResult<i32>;

    async fn is_running(&self) -> ChaosResult<bool>;

    async fn stop(&self) -> ChaosResult<()>;

    async fn kill(&self) -> ChaosResult<()>;

    async fn restart(&self) -> ChaosResult<()>;

    async fn start(&self) -> ChaosResult<()>;

    async fn terminate(&self) -> ChaosResult<()>;
}

/// Pluggable source of cluster topology, consulted once at startup
#[mockall::automock]
#[async_trait::async_trait]
pub trait ClusterInfoCollector: Send + Sync {
    /// Every host of the cluster with the services it runs
    async fn node_properties(&self) -> ChaosResult<Vec<NodeProperties>>;
}

/// `name@address` label for log lines and reports
pub fn describe(process: &dyn RemoteProcess) -> String {
    format!("{}@{}", process.name(), process.address())
}
