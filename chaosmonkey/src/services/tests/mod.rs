//! Service-specific tests
//!
//! Remote process command rendering runs against a recording shell; the
//! scheduler, dispatcher and rolling restart run against mockall processes.

#[cfg(test)]
mod scheduled_disruption;

// Common test utilities for services
#[cfg(test)]
pub mod common {
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::timeout;

    use crate::core::ProcessRef;
    use crate::error::{ChaosError, ChaosResult, TransportErrorKind};
    use crate::traits::{MockRemoteProcess, RemoteShell, ShellOutput};

    /// Standard timeout for async operations in tests
    pub const TEST_TIMEOUT: Duration = Duration::from_secs(2);

    /// Helper to run async operations with timeout
    pub async fn with_timeout<T, F>(future: F) -> Result<T, tokio::time::error::Elapsed>
    where
        F: std::future::Future<Output = T>,
    {
        timeout(TEST_TIMEOUT, future).await
    }

    /// Shell that records every command and answers with scripted exit codes
    #[derive(Clone, Default)]
    pub struct RecordingShell {
        pub address: String,
        pub commands: Arc<Mutex<Vec<String>>>,
        pub exit_codes: Arc<Mutex<HashMap<String, i32>>>,
        pub unreachable: bool,
    }

    impl RecordingShell {
        pub fn new(address: &str) -> Self {
            Self {
                address: address.to_string(),
                ..Default::default()
            }
        }

        pub fn unreachable(address: &str) -> Self {
            Self {
                unreachable: true,
                ..Self::new(address)
            }
        }

        pub fn answer(&self, command: &str, exit_code: i32) {
            self.exit_codes.lock().unwrap().insert(command.to_string(), exit_code);
        }

        pub fn recorded(&self) -> Vec<String> {
            self.commands.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RemoteShell for RecordingShell {
        fn address(&self) -> String {
            self.address.clone()
        }

        async fn exec(&self, command: &str) -> ChaosResult<ShellOutput> {
            self.commands.lock().unwrap().push(command.to_string());
            if self.unreachable {
                return Err(ChaosError::transport(&self.address, TransportErrorKind::Connection, "Connection refused"));
            }
            let exit_code = self.exit_codes.lock().unwrap().get(command).copied().unwrap_or(0);
            Ok(ShellOutput {
                exit_code,
                ..Default::default()
            })
        }
    }

    /// Mock process with its identity wired up
    pub fn mock_process(name: &str, address: &str) -> MockRemoteProcess {
        let mut process = MockRemoteProcess::new();
        process.expect_name().return_const(name.to_string());
        process.expect_address().return_const(address.to_string());
        process.expect_pid_file().return_const(format!("/var/run/{name}.pid"));
        process
    }

    /// Liveness answers served in order; the last one repeats
    pub fn liveness_script(mut answers: Vec<bool>) -> impl FnMut() -> ChaosResult<bool> + Send {
        answers.reverse();
        move || {
            let answer = if answers.len() > 1 { answers.pop() } else { answers.last().copied() };
            Ok(answer.unwrap_or(false))
        }
    }

    pub fn into_refs(processes: Vec<MockRemoteProcess>) -> Vec<ProcessRef> {
        processes.into_iter().map(|p| Arc::new(p) as ProcessRef).collect()
    }
}
