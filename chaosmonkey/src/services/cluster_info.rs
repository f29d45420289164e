//! Cluster topology sources

use async_trait::async_trait;
use std::collections::BTreeMap;

use shared::NodeProperties;

use crate::error::ChaosResult;
use crate::traits::ClusterInfoCollector;

/// Collector backed by a fixed node list, typically from the config file
#[derive(Debug, Clone, Default)]
pub struct StaticClusterInfoCollector {
    nodes: Vec<NodeProperties>,
}

impl StaticClusterInfoCollector {
    pub fn new(nodes: Vec<NodeProperties>) -> Self {
        Self { nodes }
    }
}

#[async_trait]
impl ClusterInfoCollector for StaticClusterInfoCollector {
    async fn node_properties(&self) -> ChaosResult<Vec<NodeProperties>> {
        Ok(self.nodes.clone())
    }
}

/// Invert host → services into service → host addresses
///
/// Addresses keep the order in which nodes were reported; a node listing the
/// same service twice contributes one address.
pub fn service_topology(nodes: &[NodeProperties]) -> BTreeMap<String, Vec<String>> {
    let mut topology: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for node in nodes {
        for service in &node.services {
            let addresses = topology.entry(service.clone()).or_default();
            if !addresses.contains(&node.access_ip_address) {
                addresses.push(node.access_ip_address.clone());
            }
        }
    }
    topology
}
