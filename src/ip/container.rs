//! Container port plan.
//!
//! Inside the compose network every node listens on the same canonical port
//! per service; nodes are told apart by their subnet address. Only the
//! host side of a port mapping changes from node to node.

use super::ports::NodeOverride;
use super::subnet::{quorum_node_address, tm_node_address, RangeError};
use crate::topology::types::{ConsensusEndpoint, NodeIdentity, PrivacyEndpoint};
use crate::utils::version::supports_graphql;
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

/// Subnet used when the answers do not name one
pub const DEFAULT_DOCKER_SUBNET: &str = "172.16.239.0/24";

/// In-container consensus ports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumContainerPorts {
    pub rpc_port: u16,
    pub p2p_port: u16,
    pub raft_port: u16,
    pub ws_port: u16,
    /// Only exposed by runtimes that support GraphQL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graphql_port: Option<u16>,
}

/// In-container privacy manager ports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TesseraContainerPorts {
    pub p2p_port: u16,
    pub third_party_port: u16,
    pub enclave_port: u16,
}

/// Canonical in-container port table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerPorts {
    pub quorum: QuorumContainerPorts,
    pub tm: TesseraContainerPorts,
}

/// Resolve the container port table for a quorum version
pub fn resolve(quorum_version: &str) -> ContainerPorts {
    let graphql_port = if supports_graphql(quorum_version) {
        Some(8547)
    } else {
        None
    };

    ContainerPorts {
        quorum: QuorumContainerPorts {
            rpc_port: 8545,
            p2p_port: 21000,
            raft_port: 50400,
            ws_port: 8645,
            graphql_port,
        },
        tm: TesseraContainerPorts {
            p2p_port: 9000,
            third_party_port: 9080,
            enclave_port: 9180,
        },
    }
}

/// Host-exposed ports of one container node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostExposedPorts {
    pub rpc_port: u16,
    pub ws_port: u16,
    pub graphql_port: u16,
    pub tm_third_party_port: u16,
}

/// Default host-exposed ports for node `index` (0-based)
pub fn default_host_ports(index: usize) -> HostExposedPorts {
    let i = index as u16;
    HostExposedPorts {
        rpc_port: 22000 + i,
        ws_port: 23000 + i,
        graphql_port: 24000 + i,
        tm_third_party_port: 9081 + i,
    }
}

/// Produce one `NodeIdentity` per container node.
///
/// Addresses come from the subnet; in-container ports come from `ports`.
/// Overrides may only change host-exposed ports, anything else in them is
/// ignored.
pub fn allocate(
    subnet: &Ipv4Net,
    ports: &ContainerPorts,
    node_count: usize,
    raft: bool,
    tessera: bool,
    overrides: &[NodeOverride],
) -> Result<Vec<NodeIdentity>, RangeError> {
    (0..node_count)
        .map(|index| {
            let mut host = default_host_ports(index);
            if let Some(over) = overrides.get(index) {
                host.rpc_port = over.rpc_port.unwrap_or(host.rpc_port);
                host.ws_port = over.ws_port.unwrap_or(host.ws_port);
                host.graphql_port = over.graphql_port.unwrap_or(host.graphql_port);
                host.tm_third_party_port = over.tm_third_party_port.unwrap_or(host.tm_third_party_port);
            }

            let consensus = ConsensusEndpoint {
                ip: quorum_node_address(subnet, index)?,
                p2p_port: ports.quorum.p2p_port,
                rpc_port: host.rpc_port,
                ws_port: host.ws_port,
                graphql_port: host.graphql_port,
                raft_port: raft.then_some(ports.quorum.raft_port),
            };

            let privacy = if tessera {
                Some(PrivacyEndpoint {
                    ip: tm_node_address(subnet, index)?,
                    third_party_port: host.tm_third_party_port,
                    p2p_port: ports.tm.p2p_port,
                    enclave_port: ports.tm.enclave_port,
                })
            } else {
                None
            };

            Ok(NodeIdentity { consensus, privacy })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip::subnet::parse_subnet;

    #[test]
    fn test_graphql_port_is_version_gated() {
        assert_eq!(resolve("2.6.0").quorum.graphql_port, Some(8547));
        assert_eq!(resolve("2.5.0").quorum.graphql_port, None);
    }

    #[test]
    fn test_canonical_ports_do_not_depend_on_version() {
        let old = resolve("2.4.0");
        let new = resolve("2.7.0");
        assert_eq!(old.quorum.p2p_port, new.quorum.p2p_port);
        assert_eq!(old.quorum.raft_port, new.quorum.raft_port);
        assert_eq!(old.tm, new.tm);
    }

    #[test]
    fn test_default_host_ports_increment() {
        let first = default_host_ports(0);
        let third = default_host_ports(2);
        assert_eq!(first.rpc_port, 22000);
        assert_eq!(third.rpc_port, 22002);
        assert_eq!(third.tm_third_party_port, 9083);
    }

    #[test]
    fn test_allocate_shares_in_container_ports() {
        let subnet = parse_subnet(DEFAULT_DOCKER_SUBNET).unwrap();
        let ports = resolve("2.6.0");
        let nodes = allocate(&subnet, &ports, 4, true, true, &[]).unwrap();

        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[0].consensus.ip.to_string(), "172.16.239.11");
        assert_eq!(nodes[3].consensus.ip.to_string(), "172.16.239.14");
        assert_eq!(nodes[3].privacy.as_ref().unwrap().ip.to_string(), "172.16.239.104");
        assert!(nodes.iter().all(|n| n.consensus.p2p_port == 21000));
        assert!(nodes.iter().all(|n| n.consensus.raft_port == Some(50400)));
        assert_eq!(nodes[1].consensus.rpc_port, 22001);
    }

    #[test]
    fn test_allocate_overrides_only_host_ports() {
        let subnet = parse_subnet(DEFAULT_DOCKER_SUBNET).unwrap();
        let ports = resolve("2.6.0");
        let over = NodeOverride {
            rpc_port: Some(32000),
            p2p_port: Some(1),
            quorum_ip: Some(std::net::Ipv4Addr::new(1, 2, 3, 4)),
            ..Default::default()
        };
        let nodes = allocate(&subnet, &ports, 2, false, false, &[over]).unwrap();

        assert_eq!(nodes[0].consensus.rpc_port, 32000);
        assert_eq!(nodes[0].consensus.p2p_port, 21000);
        assert_eq!(nodes[0].consensus.ip.to_string(), "172.16.239.11");
        assert!(nodes[0].consensus.raft_port.is_none());
    }

    #[test]
    fn test_allocate_fails_on_small_subnet() {
        let subnet = parse_subnet("10.0.0.0/29").unwrap();
        let ports = resolve("2.6.0");
        assert!(allocate(&subnet, &ports, 2, true, false, &[]).is_err());
    }
}
