//! Core disruption logic
//!
//! Pure data structures with no I/O: the lock table, the process router, the
//! validated per-service disruption configuration and target selection.

pub mod disruption_config;
pub mod lock_table;
pub mod router;
pub mod target_selection;

pub use disruption_config::{DisruptionProbabilities, NodeBounds, ServiceDisruptionConfig};
pub use lock_table::{DisruptionGuard, DisruptionLockTable};
pub use router::{ProcessRef, ProcessRouter};
pub use target_selection::select_targets;
