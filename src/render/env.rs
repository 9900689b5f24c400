//! `.env` file consumed by the compose document.

use crate::ip::subnet::{host_address, RangeError, DOCKER_IP_OFFSET};
use crate::registry::DockerRegistry;
use crate::topology::types::{NetworkTopology, PrivacyManager};
use crate::utils::version::supports_graphql;

pub const ENV_FILE: &str = ".env";

/// Render `KEY=value` lines. Conditional keys are added whole or not at all;
/// values are never quoted. Returns `Ok(None)` for host-process networks.
pub fn build_env_file(topology: &NetworkTopology, registry: &DockerRegistry) -> Result<Option<String>, RangeError> {
    let Some(network) = &topology.container else {
        return Ok(None);
    };
    let ports = &network.ports;

    let mut lines = vec![
        format!("QUORUM_CONSENSUS={}", topology.consensus),
        format!("QUORUM_DOCKER_IMAGE=quorumengineering/quorum:{}", topology.quorum_version),
        format!("QUORUM_P2P_PORT={}", ports.quorum.p2p_port),
        format!("QUORUM_RAFT_PORT={}", ports.quorum.raft_port),
        format!("QUORUM_RPC_PORT={}", ports.quorum.rpc_port),
        format!("QUORUM_WS_PORT={}", ports.quorum.ws_port),
        format!("DOCKER_IP={}", host_address(&network.subnet, DOCKER_IP_OFFSET)?),
    ];

    if let PrivacyManager::Tessera { version } = &topology.privacy_manager {
        lines.push(format!("QUORUM_TX_MANAGER_DOCKER_IMAGE=quorumengineering/tessera:{}", version));
        lines.push(format!("TESSERA_P2P_PORT={}", ports.tm.p2p_port));
        lines.push(format!("TESSERA_3PARTY_PORT={}", ports.tm.third_party_port));
    }

    if let Some(graphql) = ports.quorum.graphql_port.filter(|_| supports_graphql(&topology.quorum_version)) {
        lines.push(format!("QUORUM_GRAPHQL_PORT={}", graphql));
        lines.push(format!(
            "QUORUM_GETH_ARGS=--allow-insecure-unlock --graphql --graphql.port {} --graphql.corsdomain=* --graphql.addr=0.0.0.0",
            graphql
        ));
    }

    if !registry.is_default() {
        lines.push(format!("DOCKER_REGISTRY={}", registry));
    }

    let mut env = lines.join("\n");
    env.push('\n');
    Ok(Some(env))
}
