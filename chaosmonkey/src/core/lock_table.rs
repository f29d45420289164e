//! Per-(service, action) exclusive execution guard for on-demand disruptions
//!
//! The table is populated once with every known service crossed with every
//! [`Action`]; the set of keys never changes afterwards, so lookups need no
//! locking and only the per-pair flags are mutated, via compare-and-swap.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use shared::Action;

pub struct DisruptionLockTable {
    flags: HashMap<String, HashMap<Action, Arc<AtomicBool>>>,
}

impl DisruptionLockTable {
    /// Pre-populate a flag for every service and action
    pub fn new<I, S>(services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let flags = services
            .into_iter()
            .map(|service| {
                let per_action = Action::ALL
                    .iter()
                    .map(|action| (*action, Arc::new(AtomicBool::new(false))))
                    .collect();
                (service.into(), per_action)
            })
            .collect();
        Self { flags }
    }

    fn flag(&self, service: &str, action: Action) -> Option<&Arc<AtomicBool>> {
        self.flags.get(service).and_then(|per_action| per_action.get(&action))
    }

    /// Atomically claim the pair; `false` if already held or unknown
    pub fn try_acquire(&self, service: &str, action: Action) -> bool {
        self.flag(service, action)
            .map(|flag| flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_ok())
            .unwrap_or(false)
    }

    /// Clear the pair's flag unconditionally
    pub fn release(&self, service: &str, action: Action) {
        if let Some(flag) = self.flag(service, action) {
            flag.store(false, Ordering::Release);
        }
    }

    pub fn is_running(&self, service: &str, action: Action) -> bool {
        self.flag(service, action)
            .map(|flag| flag.load(Ordering::Acquire))
            .unwrap_or(false)
    }

    /// Claim the pair and return a guard that releases it when dropped
    ///
    /// The guard owns its flag, so it can move into a detached task and
    /// outlive the borrow of the table.
    pub fn acquire_guard(&self, service: &str, action: Action) -> Option<DisruptionGuard> {
        let flag = self.flag(service, action)?;
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| DisruptionGuard {
                service: service.to_string(),
                action,
                flag: Arc::clone(flag),
            })
    }

    pub fn contains_service(&self, service: &str) -> bool {
        self.flags.contains_key(service)
    }

    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.flags.keys().map(String::as_str)
    }
}

/// Scoped ownership of one (service, action) flag
#[derive(Debug)]
pub struct DisruptionGuard {
    service: String,
    action: Action,
    flag: Arc<AtomicBool>,
}

impl DisruptionGuard {
    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn action(&self) -> Action {
        self.action
    }
}

impl Drop for DisruptionGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        tracing::debug!(service = %self.service, action = %self.action, "released disruption lock");
    }
}
