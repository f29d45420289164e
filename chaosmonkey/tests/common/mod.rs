//! Common test utilities and infrastructure
//!
//! Shared fixtures and helpers used across the chaos monkey test suites.

pub mod fixtures;
pub mod helpers;

// Re-export commonly used items for convenience
#[allow(unused_imports)]
pub use fixtures::{FakeRemoteProcess, TestFixtures};
#[allow(unused_imports)]
pub use helpers::TestHelpers;
