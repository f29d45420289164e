//! SSH remote shell implementation
//!
//! Runs commands on a cluster host through the system `ssh` client in batch
//! mode, so a missing key or unknown host fails fast instead of prompting.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{ChaosError, ChaosResult, TransportErrorKind};
use crate::traits::{RemoteShell, ShellOutput};

/// Exit status reserved by the ssh client for its own failures
const SSH_CLIENT_FAILURE: i32 = 255;

/// Base64 head of an OpenSSH key stored with cipher and kdf "none"
const OPENSSH_UNENCRYPTED_HEAD: &str = "b3BlbnNzaC1rZXktdjEAAAAABG5vbmUAAAAEbm9uZQ";

/// Whether a private key file is passphrase protected
///
/// Covers PEM keys (`Proc-Type: 4,ENCRYPTED`, PKCS#8 `ENCRYPTED PRIVATE KEY`)
/// and the OpenSSH format, whose cipher name leads the encoded body.
pub fn is_encrypted_identity(contents: &str) -> bool {
    if contents.contains("ENCRYPTED") {
        return true;
    }
    if contents.contains("BEGIN OPENSSH PRIVATE KEY") {
        let body: String = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.starts_with("-----"))
            .collect();
        return !body.starts_with(OPENSSH_UNENCRYPTED_HEAD);
    }
    false
}

/// Credentials and connection options shared by every host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshCredentials {
    pub username: String,
    pub private_key: Option<PathBuf>,
    pub port: Option<u16>,
    pub connect_timeout_secs: u64,
}

impl SshCredentials {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            private_key: None,
            port: None,
            connect_timeout_secs: 10,
        }
    }

    /// Configure identity file (fluent API)
    pub fn with_private_key(mut self, private_key: Option<PathBuf>) -> Self {
        self.private_key = private_key;
        self
    }

    /// Configure port (fluent API)
    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// Configure connect timeout (fluent API)
    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// The identity file needs a passphrase, which batch mode cannot prompt for
    ///
    /// Such keys only work once loaded into a running ssh-agent.
    pub fn identity_needs_agent(&self) -> bool {
        self.private_key
            .as_ref()
            .and_then(|key| std::fs::read_to_string(key).ok())
            .is_some_and(|contents| is_encrypted_identity(&contents))
    }
}

/// Shell on one host reached over ssh
#[derive(Debug, Clone)]
pub struct SshShell {
    address: String,
    credentials: SshCredentials,
}

impl SshShell {
    pub fn new(address: impl Into<String>, credentials: SshCredentials) -> Self {
        Self {
            address: address.into(),
            credentials,
        }
    }

    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    /// Arguments passed to the ssh client for a remote command
    pub fn ssh_args(&self, remote_command: &str) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=no".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.credentials.connect_timeout_secs),
        ];
        if let Some(port) = self.credentials.port {
            args.push("-p".to_string());
            args.push(port.to_string());
        }
        if let Some(ref key) = self.credentials.private_key {
            args.push("-i".to_string());
            args.push(key.to_string_lossy().into_owned());
        }
        args.push(format!("{}@{}", self.credentials.username, self.address));
        args.push(remote_command.to_string());
        args
    }

    /// Classify an ssh client failure from its diagnostics
    fn classify_failure(stderr: &str) -> TransportErrorKind {
        if stderr.contains("Permission denied") || stderr.contains("Host key verification failed") {
            TransportErrorKind::Authentication
        } else {
            TransportErrorKind::Connection
        }
    }
}

#[async_trait]
impl RemoteShell for SshShell {
    fn address(&self) -> String {
        self.address.clone()
    }

    async fn exec(&self, command: &str) -> ChaosResult<ShellOutput> {
        let mut cmd = Command::new("ssh");
        cmd.args(self.ssh_args(command))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        tracing::trace!(address = %self.address, command = %command, "executing remote command");

        let output = cmd.output().await.map_err(|e| {
            ChaosError::transport(&self.address, TransportErrorKind::Spawn, format!("Failed to launch ssh: {e}"))
        })?;

        // Killed by a signal: no exit code to report
        let exit_code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if exit_code == SSH_CLIENT_FAILURE {
            return Err(ChaosError::transport(
                &self.address,
                Self::classify_failure(&stderr),
                stderr.trim().to_string(),
            ));
        }

        Ok(ShellOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr,
        })
    }
}
