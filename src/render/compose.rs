//! Compose document for container deployments.
//!
//! Static definitions are anchored YAML fragments shipped with the crate;
//! the per-node service blocks reference them with merge keys. The output
//! is assembled as text so the anchors survive.

use crate::ip::container::ContainerPorts;
use crate::topology::types::{ContainerNetwork, ExplorerEndpoint, NetworkTopology, NodeIdentity, PrivacyEndpoint};

pub const COMPOSE_FILE: &str = "docker-compose.yml";

const QUORUM_DEFINITIONS: &str = include_str!("templates/quorum-definitions.yml");
const TESSERA_DEFINITIONS: &str = include_str!("templates/tessera-definitions.yml");
const CAKESHOP_DEFINITIONS: &str = include_str!("templates/cakeshop-definitions.yml");

/// Port the explorer listens on inside its container
pub const CAKESHOP_CONTAINER_PORT: u16 = 8999;

fn node_service(topology: &NetworkTopology, ports: &ContainerPorts, number: usize, node: &NodeIdentity) -> String {
    let name = &topology.name;
    let q = &node.consensus;

    let mut service = format!("\n  node{}:\n    << : *quorum-def\n    hostname: node{}\n    ports:\n", number, number);
    service.push_str(&format!("      - \"{}:{}\"\n", q.rpc_port, ports.quorum.rpc_port));
    service.push_str(&format!("      - \"{}:{}\"\n", q.ws_port, ports.quorum.ws_port));
    if let Some(graphql) = ports.quorum.graphql_port {
        service.push_str(&format!("      - \"{}:{}\"\n", q.graphql_port, graphql));
    }
    service.push_str(&format!(
        "    volumes:\n      - {}-vol{}:/qdata\n      - ./qdata:/examples:ro\n",
        name, number
    ));
    if node.privacy.is_some() {
        service.push_str(&format!(
            "    depends_on:\n      - txmanager{}\n    environment:\n      - PRIVATE_CONFIG=/qdata/tm/tm.ipc\n",
            number
        ));
    } else {
        service.push_str("    environment:\n      - PRIVATE_CONFIG=ignore\n");
    }
    service.push_str(&format!("      - NODE_ID={}\n", number));
    service.push_str(&format!("      - NETWORK_ID={}\n", topology.network_id));
    service.push_str(&format!(
        "    networks:\n      {}-net:\n        ipv4_address: {}",
        name, q.ip
    ));
    service
}

fn tessera_service(name: &str, ports: &ContainerPorts, number: usize, tm: &PrivacyEndpoint) -> String {
    format!(
        "\n  txmanager{n}:\n    << : *tx-manager-def\n    hostname: txmanager{n}\n    ports:\n      - \"{host}:{container}\"\n    volumes:\n      - {name}-vol{n}:/qdata\n      - ./qdata:/examples:ro\n    networks:\n      {name}-net:\n        ipv4_address: {ip}\n    environment:\n      - NODE_ID={n}",
        n = number,
        host = tm.third_party_port,
        container = ports.tm.third_party_port,
        name = name,
        ip = tm.ip,
    )
}

fn cakeshop_service(name: &str, explorer: &ExplorerEndpoint) -> String {
    format!(
        "\n  cakeshop:\n    << : *cakeshop-def\n    hostname: cakeshop\n    ports:\n      - \"{port}:{container}\"\n    volumes:\n      - {name}-cakeshopvol:/qdata\n      - ./qdata:/examples:ro\n    networks:\n      {name}-net:\n        ipv4_address: {ip}",
        port = explorer.port,
        container = CAKESHOP_CONTAINER_PORT,
        name = name,
        ip = explorer.ip,
    )
}

fn end_block(topology: &NetworkTopology, network: &ContainerNetwork) -> String {
    let name = &topology.name;
    let mut block = format!(
        "\nnetworks:\n  {name}-net:\n    name: {name}-net\n    driver: bridge\n    ipam:\n      driver: default\n      config:\n        - subnet: {subnet}\nvolumes:",
        name = name,
        subnet = network.subnet,
    );
    for (number, _) in topology.numbered_nodes() {
        block.push_str(&format!("\n  \"{}-vol{}\":", name, number));
    }
    if topology.has_explorer() {
        block.push_str(&format!("\n  \"{}-cakeshopvol\":", name));
    }
    block.push('\n');
    block
}

fn with_newline(fragment: &str) -> String {
    if fragment.is_empty() || fragment.ends_with('\n') {
        fragment.to_string()
    } else {
        format!("{}\n", fragment)
    }
}

/// Render the compose document. Returns `None` for host-process networks.
pub fn build_compose(topology: &NetworkTopology) -> Option<String> {
    let network = topology.container.as_ref()?;
    let ports = &network.ports;

    let mut document = with_newline(QUORUM_DEFINITIONS);
    if topology.has_tessera() {
        document.push_str(&with_newline(TESSERA_DEFINITIONS));
    }
    if topology.has_explorer() {
        document.push_str(&with_newline(CAKESHOP_DEFINITIONS));
    }

    document.push_str("services:");
    for (number, node) in topology.numbered_nodes() {
        document.push_str(&node_service(topology, ports, number, node));
        if let Some(tm) = &node.privacy {
            document.push_str(&tessera_service(&topology.name, ports, number, tm));
        }
    }
    if let Some(explorer) = &topology.explorer {
        document.push_str(&cakeshop_service(&topology.name, explorer));
    }
    document.push_str(&end_block(topology, network));

    Some(document)
}
