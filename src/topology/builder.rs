//! Topology construction.
//!
//! Converts the answers record into a `NetworkTopology`, choosing the
//! host-process port plan or the container subnet plan. Validation errors
//! surface here, before any file is touched.

use super::types::{
    ContainerNetwork, Deployment, ExplorerEndpoint, NetworkTopology, MAINNET_NETWORK_ID, MAX_NODES, MIN_NODES,
};
use crate::config::{Answers, ValidationError};
use crate::ip::container;
use crate::ip::ports::{PortPlan, DEFAULT_EXPLORER_PORT, LOOPBACK};
use crate::ip::subnet::{host_address, parse_subnet, EXPLORER_OFFSET};
use crate::utils::sanitize::sanitize_name;
use log::info;

impl NetworkTopology {
    /// Build and validate a topology from the question-flow answers
    pub fn from_answers(answers: &Answers) -> Result<Self, ValidationError> {
        let name = sanitize_name(&answers.name);
        if name.is_empty() {
            return Err(ValidationError::EmptyNetworkName);
        }

        let node_count = answers.node_count()?;
        let consensus = answers.consensus()?;
        let deployment = answers.deployment()?;
        let network_id = answers.network_id()?;
        let privacy_manager = answers.privacy_manager();
        let quorum_version = answers.quorum_version();
        let overrides = answers.overrides(node_count)?;

        let raft = consensus == super::types::Consensus::Raft;
        let tessera = privacy_manager.is_enabled();
        let explorer_port = answers
            .cakeshop_port
            .as_ref()
            .map(|port| port.to_port("cakeshopPort"))
            .transpose()?
            .unwrap_or(DEFAULT_EXPLORER_PORT);

        let (nodes, container, explorer) = match deployment {
            Deployment::HostProcess => {
                let plan = if overrides.is_empty() {
                    PortPlan::Default
                } else {
                    PortPlan::Custom(overrides)
                };
                let nodes = plan.allocate(node_count, raft, tessera);
                let explorer = answers.cakeshop.then_some(ExplorerEndpoint {
                    ip: LOOPBACK,
                    port: explorer_port,
                });
                (nodes, None, explorer)
            }
            Deployment::Container => {
                let cidr = answers
                    .docker_subnet
                    .as_deref()
                    .unwrap_or(container::DEFAULT_DOCKER_SUBNET);
                let subnet = parse_subnet(cidr).map_err(|e| ValidationError::Subnet(format!("{}: {}", cidr, e)))?;
                let ports = container::resolve(&quorum_version);
                let nodes = container::allocate(&subnet, &ports, node_count, raft, tessera, &overrides)
                    .map_err(|e| ValidationError::Subnet(e.to_string()))?;
                let explorer = if answers.cakeshop {
                    Some(ExplorerEndpoint {
                        ip: host_address(&subnet, EXPLORER_OFFSET).map_err(|e| ValidationError::Subnet(e.to_string()))?,
                        port: explorer_port,
                    })
                } else {
                    None
                };
                (nodes, Some(ContainerNetwork { subnet, ports }), explorer)
            }
        };

        info!(
            "Resolved topology '{}': {} nodes, {}, {:?}, privacy manager enabled: {}",
            name, node_count, consensus, deployment, tessera
        );

        Ok(Self {
            name,
            node_count,
            consensus,
            privacy_manager,
            deployment,
            explorer,
            network_id,
            quorum_version,
            genesis: answers.genesis(),
            key_source: answers.key_source(),
            container,
            nodes,
        })
    }

    /// Re-check invariants of a topology loaded from persisted state
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyNetworkName);
        }
        if sanitize_name(&self.name) != self.name {
            return Err(ValidationError::InvalidValue {
                field: "name",
                value: self.name.clone(),
            });
        }
        if self.node_count < MIN_NODES || self.node_count > MAX_NODES {
            return Err(ValidationError::NodeCount {
                got: self.node_count as u64,
                min: MIN_NODES,
                max: MAX_NODES,
            });
        }
        if self.nodes.len() != self.node_count {
            return Err(ValidationError::NodeTableLength {
                got: self.nodes.len(),
                expected: self.node_count,
            });
        }
        if self.network_id == MAINNET_NETWORK_ID {
            return Err(ValidationError::ReservedNetworkId);
        }
        if self.is_container() != self.container.is_some() {
            return Err(ValidationError::InvalidValue {
                field: "container",
                value: format!("{:?} deployment with container section present: {}", self.deployment, self.container.is_some()),
            });
        }
        for node in &self.nodes {
            if node.consensus.raft_port.is_some() != self.is_raft() {
                return Err(ValidationError::InvalidValue {
                    field: "raft_port",
                    value: format!("{:?}", node.consensus.raft_port),
                });
            }
            if node.privacy.is_some() != self.has_tessera() {
                return Err(ValidationError::InvalidValue {
                    field: "privacy",
                    value: format!("{:?}", node.privacy),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::topology::types::{Consensus, GenesisSource, KeySource};
    use std::collections::HashSet;
    use std::path::Path;

    pub(crate) fn answers(yaml: &str) -> Answers {
        serde_yaml::from_str(yaml).unwrap()
    }

    /// 3-node raft + tessera host-process topology with keys under `base/keys`
    pub(crate) fn sample_topology(base: &Path) -> NetworkTopology {
        let mut a = answers(
            "name: sample\nnumberNodes: 3\nconsensus: raft\ntransactionManager: tessera\ndeployment: bash\n",
        );
        a.key_dir = Some(base.join("keys").to_string_lossy().to_string());
        NetworkTopology::from_answers(&a).unwrap()
    }

    #[test]
    fn test_host_process_topology() {
        let t = answers(
            "name: my net\nnumberNodes: 3\nconsensus: raft\ntransactionManager: tessera\ndeployment: bash\ncakeshop: true\n",
        );
        let topology = NetworkTopology::from_answers(&t).unwrap();

        assert_eq!(topology.name, "my net");
        assert_eq!(topology.nodes.len(), 3);
        assert_eq!(topology.node_count, 3);
        assert!(topology.container.is_none());
        assert_eq!(topology.explorer.as_ref().unwrap().port, DEFAULT_EXPLORER_PORT);
        assert!(topology.nodes.iter().all(|n| n.consensus.raft_port.is_some() && n.privacy.is_some()));
        assert_eq!(topology.genesis, GenesisSource::Synthesized);
        assert!(topology.validate().is_ok());
    }

    #[test]
    fn test_container_topology_explorer_address() {
        let t = answers(
            "name: dock\nnumberNodes: 2\nconsensus: istanbul\ntransactionManager: tessera\ndeployment: docker-compose\ncakeshop: true\n",
        );
        let topology = NetworkTopology::from_answers(&t).unwrap();
        let container = topology.container.as_ref().unwrap();

        assert_eq!(topology.consensus, Consensus::Bft);
        assert_eq!(
            topology.explorer.as_ref().unwrap().ip,
            host_address(&container.subnet, 2).unwrap()
        );
        let ips: HashSet<_> = topology.nodes.iter().map(|n| n.consensus.ip).collect();
        assert_eq!(ips.len(), 2);
        assert!(topology.nodes.iter().all(|n| n.consensus.raft_port.is_none()));
    }

    #[test]
    fn test_empty_sanitized_name_fails() {
        let t = answers("name: \"///\"\nnumberNodes: 3\nconsensus: raft\ndeployment: bash\n");
        assert!(matches!(
            NetworkTopology::from_answers(&t),
            Err(ValidationError::EmptyNetworkName)
        ));
    }

    #[test]
    fn test_validation_errors_before_generation() {
        let too_many = answers("name: n\nnumberNodes: 9\nconsensus: raft\ndeployment: bash\n");
        assert!(matches!(
            NetworkTopology::from_answers(&too_many),
            Err(ValidationError::NodeCount { got: 9, .. })
        ));

        let mainnet = answers("name: n\nnumberNodes: 2\nconsensus: raft\ndeployment: bash\nnetworkId: \"1\"\n");
        assert!(matches!(
            NetworkTopology::from_answers(&mainnet),
            Err(ValidationError::ReservedNetworkId)
        ));

        let subnet = answers("name: n\nnumberNodes: 2\nconsensus: raft\ndeployment: docker-compose\ndockerSubnet: 10.0.0.0/29\n");
        assert!(matches!(
            NetworkTopology::from_answers(&subnet),
            Err(ValidationError::Subnet(_))
        ));
    }

    #[test]
    fn test_custom_ports_flow_into_nodes() {
        let t = answers(
            r#"
name: custom
numberNodes: 2
consensus: raft
transactionManager: tessera
deployment: bash
customizePorts: true
nodes:
  - quorum: { ip: "127.0.0.1", devP2pPort: "55001", rpcPort: "56000", wsPort: "57001", raftPort: "50501" }
    tm: { ip: "127.0.0.1", thirdPartyPort: "5081", p2pPort: "5001", enclavePort: "5181" }
  - quorum: { ip: "127.0.0.1", devP2pPort: "55002", rpcPort: "56001", wsPort: "57002", raftPort: "50502" }
    tm: { ip: "127.0.0.1", thirdPartyPort: "5082", p2pPort: "5002", enclavePort: "5182" }
"#,
        );
        let topology = NetworkTopology::from_answers(&t).unwrap();
        assert_eq!(topology.nodes[1].consensus.p2p_port, 55002);
        assert_eq!(topology.nodes[1].consensus.raft_port, Some(50502));
        assert_eq!(topology.nodes[0].privacy.as_ref().unwrap().p2p_port, 5001);
    }

    #[test]
    fn test_sample_topology_uses_key_dir() {
        let topology = sample_topology(Path::new("/tmp/base"));
        assert_eq!(topology.key_source, KeySource::Directory("/tmp/base/keys".into()));
    }

    #[test]
    fn test_validate_rejects_tampered_state() {
        let mut topology = sample_topology(Path::new("/tmp/base"));
        topology.nodes.pop();
        assert!(topology.validate().is_err());

        let mut topology = sample_topology(Path::new("/tmp/base"));
        topology.nodes[0].consensus.raft_port = None;
        assert!(topology.validate().is_err());
    }

    #[test]
    fn test_validate_reports_unsafe_name() {
        let mut topology = sample_topology(Path::new("/tmp/base"));
        topology.name = "../escape".to_string();
        assert!(matches!(
            topology.validate(),
            Err(ValidationError::InvalidValue { field: "name", .. })
        ));

        topology.name = String::new();
        assert!(matches!(topology.validate(), Err(ValidationError::EmptyNetworkName)));
    }
}
