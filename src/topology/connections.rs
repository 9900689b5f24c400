//! Peer list generation.
//!
//! Every node is configured with the full static peer set, itself included,
//! so the lists are identical across nodes. Order follows node numbering.

use crate::resources::NodeKeys;
use crate::topology::types::NetworkTopology;
use serde::{Deserialize, Serialize};

/// One privacy-manager peer entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TesseraPeer {
    pub url: String,
}

/// Build the enode URL of one node
///
/// # Example
/// ```
/// let url = netforge::topology::connections::enode_url("abcd", "10.0.0.1".parse().unwrap(), 21000, Some(50401));
/// assert_eq!(url, "enode://abcd@10.0.0.1:21000?discport=0&raftport=50401");
/// ```
pub fn enode_url(enode_id: &str, ip: std::net::Ipv4Addr, p2p_port: u16, raft_port: Option<u16>) -> String {
    let mut url = format!("enode://{}@{}:{}?discport=0", enode_id, ip, p2p_port);
    if let Some(raft) = raft_port {
        url.push_str(&format!("&raftport={}", raft));
    }
    url
}

/// Static/permissioned peer list, one enode URL per node.
///
/// `keys` must be in node order and as long as the node table; a shorter
/// key list truncates the output.
pub fn enode_list(topology: &NetworkTopology, keys: &[NodeKeys]) -> Vec<String> {
    topology
        .nodes
        .iter()
        .zip(keys)
        .map(|(node, keys)| {
            let q = &node.consensus;
            enode_url(&keys.enode_id, q.ip, q.p2p_port, q.raft_port)
        })
        .collect()
}

/// Privacy-manager peer list. Empty when the privacy manager is disabled.
pub fn tessera_peer_list(topology: &NetworkTopology) -> Vec<TesseraPeer> {
    topology
        .nodes
        .iter()
        .filter_map(|node| node.privacy.as_ref())
        .map(|tm| TesseraPeer {
            url: format!("http://{}:{}", tm.ip, tm.p2p_port),
        })
        .collect()
}
