//! On-demand disruption request and service description types

use serde::{Deserialize, Serialize};

use crate::errors::{SharedError, SharedResult};
use crate::types::Action;

/// Optional arguments accompanying an on-demand disruption request
///
/// Target selection uses `nodes` when present, otherwise `count` or
/// `percentage` of the service's processes, otherwise all of them. The
/// rolling restart fields override the service's configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionArguments {
    #[serde(default)]
    pub nodes: Option<Vec<String>>,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub delay_between_batches_secs: Option<u64>,
    #[serde(default)]
    pub healthy_timeout_secs: Option<u64>,
}

impl ActionArguments {
    /// Reject argument combinations that cannot describe a target set
    pub fn validate(&self) -> SharedResult<()> {
        let selectors = [self.nodes.is_some(), self.count.is_some(), self.percentage.is_some()];
        if selectors.iter().filter(|set| **set).count() > 1 {
            return Err(SharedError::InvalidArgument {
                field: "nodes/count/percentage".to_string(),
                value: "only one target selector may be given".to_string(),
            });
        }
        if let Some(count) = self.count {
            if count == 0 {
                return Err(invalid("count", count));
            }
        }
        if let Some(percentage) = self.percentage {
            if !(percentage > 0.0 && percentage <= 100.0) {
                return Err(invalid("percentage", percentage));
            }
        }
        if let Some(batch_size) = self.batch_size {
            if batch_size == 0 {
                return Err(invalid("batch_size", batch_size));
            }
        }
        Ok(())
    }
}

fn invalid(field: &str, value: impl ToString) -> SharedError {
    SharedError::InvalidArgument {
        field: field.to_string(),
        value: value.to_string(),
    }
}

/// A service known to the engine and the disruptions available to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    #[serde(default)]
    pub disruptions: Vec<String>,
}

impl ServiceInfo {
    /// Describe a service that supports every registered action
    pub fn with_all_actions(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            disruptions: Action::commands(),
        }
    }
}
