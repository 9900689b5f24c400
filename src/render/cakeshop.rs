//! Explorer (cakeshop) configuration.

use crate::topology::types::NetworkTopology;
use serde::{Deserialize, Serialize};

pub const CAKESHOP_DIR: &str = "qdata/cakeshop/local";
pub const PROPERTIES_FILE: &str = "application.properties";
pub const NODES_FILE: &str = "cakeshop.json";
/// Where the explorer entrypoint copies its config inside the container
const CONTAINER_CAKESHOP_DIR: &str = "/qdata/cakeshop/local";

/// One node entry of `cakeshop.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CakeshopNode {
    pub name: String,
    pub rpc_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_manager_url: Option<String>,
}

/// Node list the explorer connects to.
///
/// Container explorers reach nodes over the compose network, so they use
/// node addresses with the in-container ports. Host-process explorers use
/// the node's own endpoint.
pub fn cakeshop_nodes(topology: &NetworkTopology) -> Vec<CakeshopNode> {
    let container_ports = topology.container.as_ref().map(|c| &c.ports);

    topology
        .numbered_nodes()
        .map(|(number, node)| {
            let q = &node.consensus;
            let rpc_port = container_ports.map_or(q.rpc_port, |p| p.quorum.rpc_port);
            let transaction_manager_url = node.privacy.as_ref().map(|tm| {
                let port = container_ports.map_or(tm.third_party_port, |p| p.tm.third_party_port);
                format!("http://{}:{}", tm.ip, port)
            });
            CakeshopNode {
                name: format!("node{}", number),
                rpc_url: format!("http://{}:{}", q.ip, rpc_port),
                transaction_manager_url,
            }
        })
        .collect()
}

/// `application.properties`; `None` when the explorer is disabled
pub fn application_properties(topology: &NetworkTopology) -> Option<String> {
    let explorer = topology.explorer.as_ref()?;
    let (port, dir) = if topology.is_container() {
        (super::compose::CAKESHOP_CONTAINER_PORT, CONTAINER_CAKESHOP_DIR)
    } else {
        (explorer.port, CAKESHOP_DIR)
    };

    let mut properties = String::new();
    properties.push_str(&format!("cakeshop.initialnodes={}/{}\n", dir, NODES_FILE));
    properties.push_str(&format!("server.port={}\n", port));
    properties.push_str("cakeshop.selected_node=1\n");
    properties.push_str("cakeshop.database.vendor=hsqldb\n");
    properties.push_str("contract.registry.addr=\n");
    Some(properties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::builder::tests::answers;

    #[test]
    fn test_host_process_nodes_use_own_endpoints() {
        let t = NetworkTopology::from_answers(&answers(
            "name: c\nnumberNodes: 2\nconsensus: raft\ntransactionManager: tessera\ndeployment: bash\ncakeshop: true\ncakeshopPort: 8080\n",
        ))
        .unwrap();
        let nodes = cakeshop_nodes(&t);

        assert_eq!(nodes[1].rpc_url, "http://127.0.0.1:22001");
        assert_eq!(nodes[1].transaction_manager_url.as_deref(), Some("http://127.0.0.1:9082"));
        let properties = application_properties(&t).unwrap();
        assert!(properties.contains("server.port=8080\n"));
        assert!(properties.contains("cakeshop.initialnodes=qdata/cakeshop/local/cakeshop.json\n"));
    }

    #[test]
    fn test_container_nodes_use_in_container_ports() {
        let t = NetworkTopology::from_answers(&answers(
            "name: c\nnumberNodes: 2\nconsensus: raft\ndeployment: docker-compose\ncakeshop: true\n",
        ))
        .unwrap();
        let nodes = cakeshop_nodes(&t);

        assert_eq!(nodes[0].rpc_url, "http://172.16.239.11:8545");
        assert!(nodes[0].transaction_manager_url.is_none());
        let properties = application_properties(&t).unwrap();
        assert!(properties.contains("server.port=8999\n"));
        assert!(properties.contains("cakeshop.initialnodes=/qdata/cakeshop/local/cakeshop.json\n"));
    }

    #[test]
    fn test_disabled_explorer() {
        let t = NetworkTopology::from_answers(&answers(
            "name: c\nnumberNodes: 2\nconsensus: raft\ndeployment: bash\n",
        ))
        .unwrap();
        assert!(application_properties(&t).is_none());
    }
}
