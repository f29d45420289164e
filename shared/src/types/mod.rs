//! Core types used throughout the chaos monkey

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::SharedError;

/// Kinds of disruption the engine can apply to a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Stop,
    Kill,
    Restart,
    Terminate,
    Start,
    RollingRestart,
}

impl Action {
    /// Every action, in registry order
    pub const ALL: [Action; 6] = [
        Action::Stop,
        Action::Kill,
        Action::Restart,
        Action::Terminate,
        Action::Start,
        Action::RollingRestart,
    ];

    /// Canonical command token, as used in API paths and the lock table
    pub fn command(&self) -> &'static str {
        match self {
            Action::Stop => "stop",
            Action::Kill => "kill",
            Action::Restart => "restart",
            Action::Terminate => "terminate",
            Action::Start => "start",
            Action::RollingRestart => "rolling-restart",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Action::Stop => "Stop",
            Action::Kill => "Kill",
            Action::Restart => "Restart",
            Action::Terminate => "Terminate",
            Action::Start => "Start",
            Action::RollingRestart => "Rolling restart",
        }
    }

    /// Commands of all actions, in registry order
    pub fn commands() -> Vec<String> {
        Self::ALL.iter().map(|action| action.command().to_string()).collect()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Action {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "stop" => Ok(Action::Stop),
            "kill" => Ok(Action::Kill),
            "restart" => Ok(Action::Restart),
            "terminate" => Ok(Action::Terminate),
            "start" => Ok(Action::Start),
            "rolling-restart" | "rollingrestart" => Ok(Action::RollingRestart),
            _ => Err(SharedError::UnknownAction { input: s.to_string() }),
        }
    }
}

/// One host of the cluster as reported by a cluster-info provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeProperties {
    pub access_ip_address: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
}

impl NodeProperties {
    pub fn new(access_ip_address: impl Into<String>, services: Vec<String>) -> Self {
        Self {
            access_ip_address: access_ip_address.into(),
            hostname: None,
            services,
        }
    }
}
