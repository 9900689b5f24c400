//! Host-process port plan.
//!
//! Every node runs on the same host, so every service of every node needs a
//! port of its own. The default plan gives each service a base port far
//! away from the others and adds the node index; a custom plan takes the
//! caller's table as-is.

use crate::topology::types::{ConsensusEndpoint, NodeIdentity, PrivacyEndpoint};
use std::net::Ipv4Addr;

/// Address every host-process service binds to unless told otherwise
pub const LOOPBACK: Ipv4Addr = Ipv4Addr::LOCALHOST;

pub const QUORUM_P2P_BASE: u16 = 21000;
pub const QUORUM_RPC_BASE: u16 = 22000;
pub const QUORUM_WS_BASE: u16 = 23000;
pub const QUORUM_GRAPHQL_BASE: u16 = 24000;
pub const QUORUM_RAFT_BASE: u16 = 50401;
pub const TM_P2P_BASE: u16 = 9001;
pub const TM_THIRD_PARTY_BASE: u16 = 9081;
pub const TM_ENCLAVE_BASE: u16 = 9180;
/// Host port of the explorer web UI
pub const DEFAULT_EXPLORER_PORT: u16 = 8999;

/// Caller-supplied values for one node. `None` falls back to the default
/// for that slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeOverride {
    pub quorum_ip: Option<Ipv4Addr>,
    pub p2p_port: Option<u16>,
    pub rpc_port: Option<u16>,
    pub ws_port: Option<u16>,
    pub graphql_port: Option<u16>,
    pub raft_port: Option<u16>,
    pub tm_ip: Option<Ipv4Addr>,
    pub tm_third_party_port: Option<u16>,
    pub tm_p2p_port: Option<u16>,
    pub tm_enclave_port: Option<u16>,
}

/// Port assignment strategy for host-process networks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortPlan {
    /// Incrementing ports from fixed per-service bases
    Default,
    /// One override per node, trusted verbatim
    Custom(Vec<NodeOverride>),
}

/// Default consensus endpoint for node `index` (0-based)
pub fn default_consensus_endpoint(index: usize, raft: bool) -> ConsensusEndpoint {
    let i = index as u16;
    ConsensusEndpoint {
        ip: LOOPBACK,
        p2p_port: QUORUM_P2P_BASE + i,
        rpc_port: QUORUM_RPC_BASE + i,
        ws_port: QUORUM_WS_BASE + i,
        graphql_port: QUORUM_GRAPHQL_BASE + i,
        raft_port: raft.then_some(QUORUM_RAFT_BASE + i),
    }
}

/// Default privacy manager endpoint for node `index` (0-based)
pub fn default_privacy_endpoint(index: usize) -> PrivacyEndpoint {
    let i = index as u16;
    PrivacyEndpoint {
        ip: LOOPBACK,
        third_party_port: TM_THIRD_PARTY_BASE + i,
        p2p_port: TM_P2P_BASE + i,
        enclave_port: TM_ENCLAVE_BASE + i,
    }
}

impl PortPlan {
    /// Produce one `NodeIdentity` per node.
    ///
    /// The custom table is not checked for duplicates here; colliding
    /// endpoints are reported when artifacts are rendered.
    pub fn allocate(&self, node_count: usize, raft: bool, tessera: bool) -> Vec<NodeIdentity> {
        (0..node_count)
            .map(|index| {
                let mut consensus = default_consensus_endpoint(index, raft);
                let mut privacy = tessera.then(|| default_privacy_endpoint(index));

                if let PortPlan::Custom(table) = self {
                    if let Some(over) = table.get(index) {
                        apply_consensus_override(&mut consensus, over, raft);
                        if let Some(tm) = privacy.as_mut() {
                            apply_privacy_override(tm, over);
                        }
                    }
                }

                NodeIdentity { consensus, privacy }
            })
            .collect()
    }
}

fn apply_consensus_override(endpoint: &mut ConsensusEndpoint, over: &NodeOverride, raft: bool) {
    if let Some(ip) = over.quorum_ip {
        endpoint.ip = ip;
    }
    if let Some(port) = over.p2p_port {
        endpoint.p2p_port = port;
    }
    if let Some(port) = over.rpc_port {
        endpoint.rpc_port = port;
    }
    if let Some(port) = over.ws_port {
        endpoint.ws_port = port;
    }
    if let Some(port) = over.graphql_port {
        endpoint.graphql_port = port;
    }
    if raft {
        if let Some(port) = over.raft_port {
            endpoint.raft_port = Some(port);
        }
    }
}

fn apply_privacy_override(endpoint: &mut PrivacyEndpoint, over: &NodeOverride) {
    if let Some(ip) = over.tm_ip {
        endpoint.ip = ip;
    }
    if let Some(port) = over.tm_third_party_port {
        endpoint.third_party_port = port;
    }
    if let Some(port) = over.tm_p2p_port {
        endpoint.p2p_port = port;
    }
    if let Some(port) = over.tm_enclave_port {
        endpoint.enclave_port = port;
    }
}

/// Every (ip, port) pair a host-process node binds. The graphql port is
/// only bound when the node is started with `--graphql`.
pub fn node_endpoints(node: &NodeIdentity, graphql: bool) -> Vec<(Ipv4Addr, u16, &'static str)> {
    let q = &node.consensus;
    let mut endpoints = vec![
        (q.ip, q.p2p_port, "p2p"),
        (q.ip, q.rpc_port, "rpc"),
        (q.ip, q.ws_port, "ws"),
    ];
    if graphql {
        endpoints.push((q.ip, q.graphql_port, "graphql"));
    }
    if let Some(raft) = q.raft_port {
        endpoints.push((q.ip, raft, "raft"));
    }
    if let Some(tm) = &node.privacy {
        endpoints.push((tm.ip, tm.third_party_port, "tm-3party"));
        endpoints.push((tm.ip, tm.p2p_port, "tm-p2p"));
        endpoints.push((tm.ip, tm.enclave_port, "tm-enclave"));
    }
    endpoints
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_plan_has_no_collisions() {
        for count in 2..=7 {
            let nodes = PortPlan::Default.allocate(count, true, true);
            assert_eq!(nodes.len(), count);

            let mut seen = HashSet::new();
            for node in &nodes {
                for (ip, port, _) in node_endpoints(node, true) {
                    assert!(seen.insert((ip, port)), "duplicate {}:{}", ip, port);
                }
            }
            assert!(!seen.contains(&(LOOPBACK, DEFAULT_EXPLORER_PORT)));
        }
    }

    #[test]
    fn test_raft_port_only_for_raft() {
        let raft = PortPlan::Default.allocate(3, true, false);
        let bft = PortPlan::Default.allocate(3, false, false);
        assert_eq!(raft[2].consensus.raft_port, Some(50403));
        assert!(bft.iter().all(|n| n.consensus.raft_port.is_none()));
        assert!(raft.iter().all(|n| n.privacy.is_none()));
    }

    #[test]
    fn test_custom_plan_is_taken_verbatim() {
        let table = vec![
            NodeOverride {
                p2p_port: Some(55001),
                rpc_port: Some(56000),
                tm_third_party_port: Some(5081),
                ..Default::default()
            },
            NodeOverride {
                quorum_ip: Some(Ipv4Addr::new(10, 0, 0, 2)),
                // Same p2p port as node 1: allowed at plan time
                p2p_port: Some(55001),
                ..Default::default()
            },
        ];
        let nodes = PortPlan::Custom(table).allocate(2, false, true);

        assert_eq!(nodes[0].consensus.p2p_port, 55001);
        assert_eq!(nodes[0].consensus.rpc_port, 56000);
        assert_eq!(nodes[0].consensus.ws_port, QUORUM_WS_BASE);
        assert_eq!(nodes[0].privacy.as_ref().unwrap().third_party_port, 5081);
        assert_eq!(nodes[1].consensus.ip, Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(nodes[1].consensus.p2p_port, 55001);
        assert_eq!(nodes[1].privacy.as_ref().unwrap().ip, LOOPBACK);
    }
}
