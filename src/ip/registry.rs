//! Endpoint registry.
//!
//! Tracks which service owns every (address, port) pair of a topology so
//! that a custom port table with duplicates is caught before any artifact
//! is written.

use super::ports::node_endpoints;
use crate::topology::types::{Deployment, NetworkTopology};
use crate::utils::version::supports_graphql;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// Two services were given the same endpoint
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollisionError {
    #[error("Port collision: {ip}:{port} is used by both {existing} and {requested}")]
    Endpoint {
        ip: Ipv4Addr,
        port: u16,
        existing: String,
        requested: String,
    },
    #[error("Address collision: {ip} is used by both {existing} and {requested}")]
    Address {
        ip: Ipv4Addr,
        existing: String,
        requested: String,
    },
}

/// Registry of claimed endpoints
#[derive(Debug, Default)]
pub struct EndpointRegistry {
    /// (ip, port) -> owner label
    endpoints: BTreeMap<(Ipv4Addr, u16), String>,
    /// ip -> owner label, for container addresses
    addresses: BTreeMap<Ipv4Addr, String>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim an (ip, port) pair. The same owner may claim it twice.
    pub fn register_endpoint(&mut self, ip: Ipv4Addr, port: u16, owner: &str) -> Result<(), CollisionError> {
        match self.endpoints.get(&(ip, port)) {
            Some(existing) if existing != owner => Err(CollisionError::Endpoint {
                ip,
                port,
                existing: existing.clone(),
                requested: owner.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.endpoints.insert((ip, port), owner.to_string());
                Ok(())
            }
        }
    }

    /// Claim a whole address (container mode)
    pub fn register_address(&mut self, ip: Ipv4Addr, owner: &str) -> Result<(), CollisionError> {
        match self.addresses.get(&ip) {
            Some(existing) if existing != owner => Err(CollisionError::Address {
                ip,
                existing: existing.clone(),
                requested: owner.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.addresses.insert(ip, owner.to_string());
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Build a registry from every endpoint of a topology.
    ///
    /// Host-process networks claim each bound (ip, port). Container networks
    /// claim each container address plus the host side of every published
    /// port; in-container ports repeat across nodes by design and are not
    /// claimed.
    pub fn from_topology(topology: &NetworkTopology) -> Result<Self, CollisionError> {
        let mut registry = Self::new();

        match topology.deployment {
            Deployment::HostProcess => {
                let graphql = supports_graphql(&topology.quorum_version);
                for (number, node) in topology.numbered_nodes() {
                    for (ip, port, service) in node_endpoints(node, graphql) {
                        registry.register_endpoint(ip, port, &format!("node{} {}", number, service))?;
                    }
                }
                if let Some(explorer) = &topology.explorer {
                    registry.register_endpoint(explorer.ip, explorer.port, "cakeshop")?;
                }
            }
            Deployment::Container => {
                let host = Ipv4Addr::UNSPECIFIED;
                let graphql = topology
                    .container
                    .as_ref()
                    .is_some_and(|c| c.ports.quorum.graphql_port.is_some());
                for (number, node) in topology.numbered_nodes() {
                    let q = &node.consensus;
                    registry.register_address(q.ip, &format!("node{}", number))?;
                    registry.register_endpoint(host, q.rpc_port, &format!("node{} rpc", number))?;
                    registry.register_endpoint(host, q.ws_port, &format!("node{} ws", number))?;
                    if graphql {
                        registry.register_endpoint(host, q.graphql_port, &format!("node{} graphql", number))?;
                    }
                    if let Some(tm) = &node.privacy {
                        registry.register_address(tm.ip, &format!("txmanager{}", number))?;
                        registry.register_endpoint(host, tm.third_party_port, &format!("txmanager{} 3party", number))?;
                    }
                }
                if let Some(explorer) = &topology.explorer {
                    registry.register_address(explorer.ip, "cakeshop")?;
                    registry.register_endpoint(host, explorer.port, "cakeshop")?;
                }
            }
        }

        log::debug!("Endpoint registry holds {} endpoints", registry.len());
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_endpoint_conflict() {
        let mut registry = EndpointRegistry::new();
        let ip = Ipv4Addr::LOCALHOST;
        registry.register_endpoint(ip, 21000, "node1 p2p").unwrap();
        // Re-registering by the same owner is fine
        registry.register_endpoint(ip, 21000, "node1 p2p").unwrap();
        // Same port on another address is fine
        registry.register_endpoint(Ipv4Addr::new(10, 0, 0, 1), 21000, "node2 p2p").unwrap();

        let err = registry.register_endpoint(ip, 21000, "node2 rpc").unwrap_err();
        assert!(err.to_string().contains("127.0.0.1:21000"));
        assert!(err.to_string().contains("node1 p2p"));
        assert_eq!(registry.len(), 2);
    }

    fn topology(yaml: &str) -> NetworkTopology {
        NetworkTopology::from_answers(&crate::topology::builder::tests::answers(yaml)).unwrap()
    }

    #[test]
    fn test_unpublished_graphql_port_is_not_claimed() {
        let container = topology(
            r#"
name: old
numberNodes: 2
consensus: raft
deployment: docker-compose
quorumVersion: 2.5.0
customizePorts: true
nodes:
  - quorum: { graphQlPort: "22001" }
  - quorum: { rpcPort: "22001" }
"#,
        );
        assert!(container.container.as_ref().unwrap().ports.quorum.graphql_port.is_none());
        assert!(EndpointRegistry::from_topology(&container).is_ok());

        let host = topology(
            r#"
name: old
numberNodes: 2
consensus: raft
deployment: bash
quorumVersion: 2.5.0
customizePorts: true
nodes:
  - quorum: { graphQlPort: "22001" }
  - quorum: { rpcPort: "22001" }
"#,
        );
        assert!(EndpointRegistry::from_topology(&host).is_ok());
    }

    #[test]
    fn test_published_graphql_port_is_claimed() {
        let container = topology(
            r#"
name: new
numberNodes: 2
consensus: raft
deployment: docker-compose
quorumVersion: 2.6.0
customizePorts: true
nodes:
  - quorum: { graphQlPort: "22001" }
  - quorum: { rpcPort: "22001" }
"#,
        );
        assert!(matches!(
            EndpointRegistry::from_topology(&container),
            Err(CollisionError::Endpoint { port: 22001, .. })
        ));
    }

    #[test]
    fn test_register_address_conflict() {
        let mut registry = EndpointRegistry::new();
        let ip = Ipv4Addr::new(172, 16, 239, 11);
        registry.register_address(ip, "node1").unwrap();
        assert!(matches!(
            registry.register_address(ip, "cakeshop"),
            Err(CollisionError::Address { .. })
        ));
    }
}
