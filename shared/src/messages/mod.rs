//! Message types exchanged with the API layer
//!
//! - `disruption`: on-demand disruption arguments and service descriptions

pub mod disruption;

pub use disruption::{ActionArguments, ServiceInfo};
