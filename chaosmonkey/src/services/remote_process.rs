//! Remote process implementation over a [`RemoteShell`]
//!
//! Command spelling depends on the host's init system: `sysv` uses the
//! `service` wrapper and the pid file, `custom` takes operator templates and
//! falls back to the sysv spelling for anything left out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChaosResult;
use crate::services::ssh::SshShell;
use crate::traits::{RemoteProcess, RemoteShell};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitStyle {
    #[default]
    Sysv,
    Custom,
}

/// Operations a remote process supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessCommand {
    Start,
    Stop,
    Restart,
    Kill,
    Terminate,
    IsRunning,
}

/// Custom command templates; `{name}` and `{pid_path}` are substituted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTemplates {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub stop: Option<String>,
    #[serde(default)]
    pub restart: Option<String>,
    #[serde(default)]
    pub kill: Option<String>,
    #[serde(default)]
    pub terminate: Option<String>,
    #[serde(default)]
    pub is_running: Option<String>,
}

impl CommandTemplates {
    fn get(&self, command: ProcessCommand) -> Option<&str> {
        match command {
            ProcessCommand::Start => self.start.as_deref(),
            ProcessCommand::Stop => self.stop.as_deref(),
            ProcessCommand::Restart => self.restart.as_deref(),
            ProcessCommand::Kill => self.kill.as_deref(),
            ProcessCommand::Terminate => self.terminate.as_deref(),
            ProcessCommand::IsRunning => self.is_running.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitSettings {
    #[serde(default)]
    pub style: InitStyle,
    #[serde(flatten)]
    pub templates: CommandTemplates,
}

impl InitSettings {
    pub fn sysv() -> Self {
        Self::default()
    }

    pub fn custom(templates: CommandTemplates) -> Self {
        Self {
            style: InitStyle::Custom,
            templates,
        }
    }

    /// Render the shell command for an operation on a named service
    pub fn render(&self, command: ProcessCommand, name: &str, pid_path: &str) -> String {
        let template = match self.style {
            InitStyle::Custom => self.templates.get(command),
            InitStyle::Sysv => None,
        };
        match template {
            Some(template) => template.replace("{name}", name).replace("{pid_path}", pid_path),
            None => sysv_command(command, name, pid_path),
        }
    }
}

fn sysv_command(command: ProcessCommand, name: &str, pid_path: &str) -> String {
    match command {
        ProcessCommand::Start => format!("sudo service {name} start"),
        ProcessCommand::Stop => format!("sudo service {name} stop"),
        ProcessCommand::Restart => format!("sudo service {name} restart"),
        ProcessCommand::Kill => format!("sudo kill -9 $(cat {pid_path})"),
        ProcessCommand::Terminate => format!("sudo kill $(cat {pid_path})"),
        ProcessCommand::IsRunning => format!("sudo kill -0 $(cat {pid_path})"),
    }
}

/// A service instance on a host, controlled through a remote shell
pub struct ShellRemoteProcess<S: RemoteShell = SshShell> {
    name: String,
    pid_path: String,
    init: InitSettings,
    shell: S,
}

/// Remote process reached over ssh
pub type SshRemoteProcess = ShellRemoteProcess<SshShell>;

impl<S: RemoteShell> ShellRemoteProcess<S> {
    pub fn new(name: impl Into<String>, pid_path: impl Into<String>, init: InitSettings, shell: S) -> Self {
        Self {
            name: name.into(),
            pid_path: pid_path.into(),
            init,
            shell,
        }
    }

    pub fn command_for(&self, command: ProcessCommand) -> String {
        self.init.render(command, &self.name, &self.pid_path)
    }

    async fn run(&self, command: ProcessCommand) -> ChaosResult<i32> {
        let rendered = self.command_for(command);
        let output = self.shell.exec(&rendered).await?;
        if !output.success() && command != ProcessCommand::IsRunning {
            tracing::debug!(
                service = %self.name,
                address = %self.shell.address(),
                exit_code = output.exit_code,
                stderr = %output.stderr.trim(),
                "remote command exited non-zero: {}",
                rendered
            );
        }
        Ok(output.exit_code)
    }
}

#[async_trait]
impl<S: RemoteShell> RemoteProcess for ShellRemoteProcess<S> {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn address(&self) -> String {
        self.shell.address()
    }

    fn pid_file(&self) -> String {
        self.pid_path.clone()
    }

    async fn execute(&self, command: &str) -> ChaosResult<i32> {
        Ok(self.shell.exec(command).await?.exit_code)
    }

    async fn is_running(&self) -> ChaosResult<bool> {
        Ok(self.run(ProcessCommand::IsRunning).await? == 0)
    }

    async fn stop(&self) -> ChaosResult<()> {
        self.run(ProcessCommand::Stop).await.map(|_| ())
    }

    async fn kill(&self) -> ChaosResult<()> {
        self.run(ProcessCommand::Kill).await.map(|_| ())
    }

    async fn restart(&self) -> ChaosResult<()> {
        self.run(ProcessCommand::Restart).await.map(|_| ())
    }

    async fn start(&self) -> ChaosResult<()> {
        self.run(ProcessCommand::Start).await.map(|_| ())
    }

    async fn terminate(&self) -> ChaosResult<()> {
        self.run(ProcessCommand::Terminate).await.map(|_| ())
    }
}
