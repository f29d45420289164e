//! Chaos monkey error types

use shared::SharedError;
use std::fmt;
use thiserror::Error;

/// Why a remote command could not be carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Host unreachable, connection refused or dropped
    Connection,
    /// The remote host rejected our credentials
    Authentication,
    /// The local transport client could not be launched
    Spawn,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Connection => write!(f, "connection"),
            TransportErrorKind::Authentication => write!(f, "authentication"),
            TransportErrorKind::Spawn => write!(f, "spawn"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ChaosError {
    #[error("Invalid configuration for {service}: {reason}")]
    Configuration { service: String, reason: String },

    #[error("Transport {kind} error on {address}: {message}")]
    Transport {
        address: String,
        kind: TransportErrorKind,
        message: String,
    },

    #[error("Unknown service: {service}")]
    UnknownService { service: String },

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ChaosError {
    pub fn config(service: impl Into<String>, reason: impl Into<String>) -> Self {
        ChaosError::Configuration {
            service: service.into(),
            reason: reason.into(),
        }
    }

    pub fn transport(address: impl Into<String>, kind: TransportErrorKind, message: impl Into<String>) -> Self {
        ChaosError::Transport {
            address: address.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ChaosError::Transport { .. })
    }

    /// The remote host rejected our credentials or host key
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            ChaosError::Transport {
                kind: TransportErrorKind::Authentication,
                ..
            }
        )
    }
}

pub type ChaosResult<T> = Result<T, ChaosError>;
