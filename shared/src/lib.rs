//! Shared types for the chaos monkey workspace
//!
//! Contains the disruption vocabulary (actions, arguments, service info) and
//! the cluster topology record exchanged between the engine, its API layer and
//! cluster-info providers, plus the common logging setup.

pub mod errors;
pub mod logging;
pub mod messages;
pub mod types;

pub use errors::*;
pub use types::*;

pub use messages::{ActionArguments, ServiceInfo};
