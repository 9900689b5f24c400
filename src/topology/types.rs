//! Topology type definitions.
//!
//! This file contains the resolved, strongly typed network model. A
//! `NetworkTopology` is built once from the answers record and is read-only
//! for every generator downstream of it.

use crate::ip::container::ContainerPorts;
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::path::PathBuf;

/// Smallest supported network
pub const MIN_NODES: usize = 2;
/// Largest supported network
pub const MAX_NODES: usize = 7;
/// Network id reserved by the public Ethereum mainnet
pub const MAINNET_NETWORK_ID: u64 = 1;

/// Consensus algorithm of the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Consensus {
    /// Raft: leader-based, on-demand block creation
    #[serde(rename = "raft")]
    Raft,
    /// Istanbul BFT: validator set encoded in the genesis extra-data
    #[serde(rename = "istanbul")]
    Bft,
}

impl fmt::Display for Consensus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Consensus::Raft => write!(f, "raft"),
            Consensus::Bft => write!(f, "istanbul"),
        }
    }
}

/// Private transaction manager layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PrivacyManager {
    None,
    Tessera { version: String },
}

impl PrivacyManager {
    pub fn is_enabled(&self) -> bool {
        matches!(self, PrivacyManager::Tessera { .. })
    }
}

/// How the nodes are started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Deployment {
    /// Local processes sharing one host, told apart by port
    #[serde(rename = "bash")]
    HostProcess,
    /// Containers on a computed subnet, told apart by address
    #[serde(rename = "docker-compose")]
    Container,
}

/// Where the genesis file comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "path", rename_all = "snake_case")]
pub enum GenesisSource {
    Synthesized,
    UserSupplied(PathBuf),
}

/// Where node key material comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "path", rename_all = "snake_case")]
pub enum KeySource {
    /// Pre-generated key directories (`key1`, `key2`, ...) copied from disk
    Directory(PathBuf),
    /// Keys produced by the container-runtime resource generator
    Remote,
}

/// Consensus layer addressing of one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusEndpoint {
    pub ip: Ipv4Addr,
    pub p2p_port: u16,
    pub rpc_port: u16,
    pub ws_port: u16,
    pub graphql_port: u16,
    /// Present iff the network runs raft
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raft_port: Option<u16>,
}

/// Privacy manager addressing of one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacyEndpoint {
    pub ip: Ipv4Addr,
    pub third_party_port: u16,
    pub p2p_port: u16,
    pub enclave_port: u16,
}

/// Addressing of one node. Nodes are identified by position only; the
/// node number used in paths and service names is `index + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdentity {
    pub consensus: ConsensusEndpoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privacy: Option<PrivacyEndpoint>,
}

/// Explorer (cakeshop) addressing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerEndpoint {
    pub ip: Ipv4Addr,
    pub port: u16,
}

/// Container-only part of the topology
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerNetwork {
    pub subnet: Ipv4Net,
    pub ports: ContainerPorts,
}

/// Fully resolved network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkTopology {
    pub name: String,
    pub node_count: usize,
    pub consensus: Consensus,
    pub privacy_manager: PrivacyManager,
    pub deployment: Deployment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explorer: Option<ExplorerEndpoint>,
    pub network_id: u64,
    pub quorum_version: String,
    pub genesis: GenesisSource,
    pub key_source: KeySource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<ContainerNetwork>,
    pub nodes: Vec<NodeIdentity>,
}

impl NetworkTopology {
    pub fn is_raft(&self) -> bool {
        self.consensus == Consensus::Raft
    }

    pub fn has_tessera(&self) -> bool {
        self.privacy_manager.is_enabled()
    }

    pub fn has_explorer(&self) -> bool {
        self.explorer.is_some()
    }

    pub fn is_container(&self) -> bool {
        self.deployment == Deployment::Container
    }

    /// Iterate nodes with their 1-based node number
    pub fn numbered_nodes(&self) -> impl Iterator<Item = (usize, &NodeIdentity)> {
        self.nodes.iter().enumerate().map(|(i, node)| (i + 1, node))
    }
}
