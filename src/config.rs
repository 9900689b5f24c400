//! Answers record produced by the question flow.
//!
//! This is the only loosely typed structure in the crate: numbers may arrive
//! as strings, enum choices arrive as the labels the question flow offers.
//! Everything is converted into typed values here and nowhere else.

use crate::ip::ports::NodeOverride;
use crate::topology::types::{
    Consensus, Deployment, GenesisSource, KeySource, PrivacyManager, MAINNET_NETWORK_ID, MAX_NODES, MIN_NODES,
};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::PathBuf;

pub const DEFAULT_QUORUM_VERSION: &str = "2.6.0";
pub const DEFAULT_TESSERA_VERSION: &str = "0.10.5";
pub const DEFAULT_NETWORK_ID: u64 = 10;
pub const DEFAULT_KEY_DIR: &str = "7nodes";

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Number of nodes must be between {min} and {max} (inclusive), got {got}")]
    NodeCount { got: u64, min: usize, max: usize },
    #[error("Ethereum Mainnet has a network id of 1. Please choose another id")]
    ReservedNetworkId,
    #[error("Docker registry url should NOT include http(s):// at the beginning: {0}")]
    RegistryScheme(String),
    #[error("Network name was empty or contained invalid characters")]
    EmptyNetworkName,
    #[error("Invalid value for {field}: '{value}'")]
    InvalidValue { field: &'static str, value: String },
    #[error("Custom node table has {got} entries but the network has {expected} nodes")]
    NodeTableLength { got: usize, expected: usize },
    #[error("Invalid docker subnet: {0}")]
    Subnet(String),
}

/// A number that may have been typed in as text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseNumber {
    Number(u64),
    Signed(i64),
    Text(String),
}

impl LooseNumber {
    /// Parse as a non-negative integer
    pub fn to_u64(&self, field: &'static str) -> Result<u64, ValidationError> {
        let invalid = |value: String| ValidationError::InvalidValue { field, value };
        match self {
            LooseNumber::Number(n) => Ok(*n),
            LooseNumber::Signed(n) => u64::try_from(*n).map_err(|_| invalid(n.to_string())),
            LooseNumber::Text(s) => s.trim().parse().map_err(|_| invalid(s.clone())),
        }
    }

    pub fn to_port(&self, field: &'static str) -> Result<u16, ValidationError> {
        let value = self.to_u64(field)?;
        u16::try_from(value).map_err(|_| ValidationError::InvalidValue {
            field,
            value: value.to_string(),
        })
    }
}

fn default_network_id() -> LooseNumber {
    LooseNumber::Number(DEFAULT_NETWORK_ID)
}

fn default_transaction_manager() -> String {
    "none".to_string()
}

/// Custom consensus node values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuorumNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_p2p_port: Option<LooseNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_port: Option<LooseNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_port: Option<LooseNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_ql_port: Option<LooseNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raft_port: Option<LooseNumber>,
}

/// Custom privacy manager node values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTmNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub third_party_port: Option<LooseNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p2p_port: Option<LooseNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enclave_port: Option<LooseNumber>,
}

/// One row of the custom port table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawNode {
    #[serde(default)]
    pub quorum: RawQuorumNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tm: Option<RawTmNode>,
}

/// Answers collected by the question flow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answers {
    pub name: String,
    pub number_nodes: LooseNumber,
    pub consensus: String,
    #[serde(default = "default_transaction_manager")]
    pub transaction_manager: String,
    pub deployment: String,
    #[serde(default)]
    pub cakeshop: bool,
    #[serde(default = "default_network_id")]
    pub network_id: LooseNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genesis_location: Option<String>,
    #[serde(default)]
    pub customize_ports: bool,
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub generate_keys: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cakeshop_port: Option<LooseNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quorum_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_subnet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_dir: Option<String>,
}

impl Answers {
    /// Node count, checked against the supported range
    pub fn node_count(&self) -> Result<usize, ValidationError> {
        let got = self.number_nodes.to_u64("numberNodes")?;
        if got < MIN_NODES as u64 || got > MAX_NODES as u64 {
            return Err(ValidationError::NodeCount {
                got,
                min: MIN_NODES,
                max: MAX_NODES,
            });
        }
        Ok(got as usize)
    }

    pub fn consensus(&self) -> Result<Consensus, ValidationError> {
        match self.consensus.trim().to_lowercase().as_str() {
            "raft" => Ok(Consensus::Raft),
            "istanbul" | "ibft" | "bft" => Ok(Consensus::Bft),
            _ => Err(ValidationError::InvalidValue {
                field: "consensus",
                value: self.consensus.clone(),
            }),
        }
    }

    /// `none` disables the privacy manager, `tessera` selects the default
    /// version, anything else is taken as a tessera version
    pub fn privacy_manager(&self) -> PrivacyManager {
        match self.transaction_manager.trim() {
            "" | "none" => PrivacyManager::None,
            "tessera" => PrivacyManager::Tessera {
                version: DEFAULT_TESSERA_VERSION.to_string(),
            },
            version => PrivacyManager::Tessera {
                version: version.to_string(),
            },
        }
    }

    pub fn deployment(&self) -> Result<Deployment, ValidationError> {
        match self.deployment.trim() {
            "bash" => Ok(Deployment::HostProcess),
            "docker-compose" | "docker" => Ok(Deployment::Container),
            _ => Err(ValidationError::InvalidValue {
                field: "deployment",
                value: self.deployment.clone(),
            }),
        }
    }

    pub fn network_id(&self) -> Result<u64, ValidationError> {
        let id = self.network_id.to_u64("networkId")?;
        if id == MAINNET_NETWORK_ID {
            return Err(ValidationError::ReservedNetworkId);
        }
        Ok(id)
    }

    pub fn genesis(&self) -> GenesisSource {
        match self.genesis_location.as_deref().map(str::trim) {
            None | Some("") | Some("none") => GenesisSource::Synthesized,
            Some(path) => GenesisSource::UserSupplied(PathBuf::from(path)),
        }
    }

    pub fn key_source(&self) -> KeySource {
        if self.generate_keys {
            KeySource::Remote
        } else {
            KeySource::Directory(PathBuf::from(self.key_dir.as_deref().unwrap_or(DEFAULT_KEY_DIR)))
        }
    }

    pub fn quorum_version(&self) -> String {
        self.quorum_version
            .clone()
            .unwrap_or_else(|| DEFAULT_QUORUM_VERSION.to_string())
    }

    /// Custom per-node overrides; empty unless `customizePorts` is set
    pub fn overrides(&self, node_count: usize) -> Result<Vec<NodeOverride>, ValidationError> {
        if !self.customize_ports {
            return Ok(Vec::new());
        }
        if self.nodes.len() != node_count {
            return Err(ValidationError::NodeTableLength {
                got: self.nodes.len(),
                expected: node_count,
            });
        }
        self.nodes.iter().map(RawNode::to_override).collect()
    }
}

fn parse_ip(value: &Option<String>, field: &'static str) -> Result<Option<Ipv4Addr>, ValidationError> {
    value
        .as_deref()
        .map(|ip| {
            ip.trim().parse::<Ipv4Addr>().map_err(|_| ValidationError::InvalidValue {
                field,
                value: ip.to_string(),
            })
        })
        .transpose()
}

fn parse_port(value: &Option<LooseNumber>, field: &'static str) -> Result<Option<u16>, ValidationError> {
    value.as_ref().map(|n| n.to_port(field)).transpose()
}

impl RawNode {
    pub fn to_override(&self) -> Result<NodeOverride, ValidationError> {
        let q = &self.quorum;
        let tm = self.tm.clone().unwrap_or_default();
        Ok(NodeOverride {
            quorum_ip: parse_ip(&q.ip, "quorum.ip")?,
            p2p_port: parse_port(&q.dev_p2p_port, "quorum.devP2pPort")?,
            rpc_port: parse_port(&q.rpc_port, "quorum.rpcPort")?,
            ws_port: parse_port(&q.ws_port, "quorum.wsPort")?,
            graphql_port: parse_port(&q.graph_ql_port, "quorum.graphQlPort")?,
            raft_port: parse_port(&q.raft_port, "quorum.raftPort")?,
            tm_ip: parse_ip(&tm.ip, "tm.ip")?,
            tm_third_party_port: parse_port(&tm.third_party_port, "tm.thirdPartyPort")?,
            tm_p2p_port: parse_port(&tm.p2p_port, "tm.p2pPort")?,
            tm_enclave_port: parse_port(&tm.enclave_port, "tm.enclavePort")?,
        })
    }
}
