//! Chaos monkey library for controlled fault injection on a cluster
//!
//! Periodically and probabilistically stops, kills or restarts service
//! processes on remote hosts, and exposes on-demand disruptions (including a
//! batched rolling restart) guarded by a per-(service, action) lock table.

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod services;
pub mod traits;
pub mod web;

// Re-export commonly used types
pub use config::{ChaosConfig, ServiceSettings};
pub use crate::core::{DisruptionLockTable, DisruptionProbabilities, ProcessRef, ProcessRouter, ServiceDisruptionConfig};
pub use engine::{ChaosHandle, ChaosMonkey};
pub use error::{ChaosError, ChaosResult, TransportErrorKind};
pub use services::{DisruptionResponse, RollingRestartPolicy, RollingRestartReport, ScheduledDisruption, TickReport};
pub use traits::{ClusterInfoCollector, RemoteProcess, RemoteShell};
