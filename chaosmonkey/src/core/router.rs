//! Read-only indices resolving a host address or service name to processes
//!
//! Built once at startup from the full process collection and never mutated
//! afterwards, so concurrent readers need no synchronization.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use shared::ServiceInfo;

use crate::traits::RemoteProcess;

/// Shared handle to a remote process
pub type ProcessRef = Arc<dyn RemoteProcess>;

#[derive(Default)]
pub struct ProcessRouter {
    by_address: HashMap<String, Vec<ProcessRef>>,
    by_service: HashMap<String, Vec<ProcessRef>>,
}

impl ProcessRouter {
    /// Index every process under its own address and service name
    ///
    /// A second process with the same (name, address) identity is ignored.
    pub fn new<I>(processes: I) -> Self
    where
        I: IntoIterator<Item = ProcessRef>,
    {
        let mut router = Self::default();
        let mut seen = HashSet::new();

        for process in processes {
            let (name, address) = (process.name(), process.address());
            if !seen.insert((name.clone(), address.clone())) {
                tracing::warn!(service = %name, address = %address, "duplicate process ignored by router");
                continue;
            }
            router.by_address.entry(address).or_default().push(Arc::clone(&process));
            router.by_service.entry(name).or_default().push(process);
        }

        router
    }

    /// Processes on the given host; empty for an unknown address
    pub fn by_address(&self, address: &str) -> Vec<ProcessRef> {
        self.by_address.get(address).cloned().unwrap_or_default()
    }

    /// Processes of the given service; empty for an unknown service
    pub fn by_service(&self, service: &str) -> Vec<ProcessRef> {
        self.by_service.get(service).cloned().unwrap_or_default()
    }

    pub fn host_count(&self, service: &str) -> usize {
        self.by_service.get(service).map(Vec::len).unwrap_or(0)
    }

    pub fn contains_service(&self, service: &str) -> bool {
        self.by_service.contains_key(service)
    }

    /// Known service names, sorted
    pub fn services(&self) -> Vec<String> {
        self.by_service.keys().cloned().collect::<BTreeSet<_>>().into_iter().collect()
    }

    /// Known host addresses, sorted
    pub fn addresses(&self) -> Vec<String> {
        self.by_address.keys().cloned().collect::<BTreeSet<_>>().into_iter().collect()
    }

    pub fn service_infos(&self) -> Vec<ServiceInfo> {
        self.services().into_iter().map(ServiceInfo::with_all_actions).collect()
    }
}
