//! Privacy manager (tessera 0.9+) node configuration.

use crate::topology::connections::TesseraPeer;
use crate::topology::types::{NetworkTopology, PrivacyEndpoint};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Shared template copied into every container node
pub const CONTAINER_CONFIG_FILE: &str = "tessera-config-09.json";

/// Per-node config name for host-process networks
pub fn host_config_file(number: usize) -> String {
    format!("tessera-config-09-{}.json", number)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JdbcConfig {
    pub username: String,
    pub password: String,
    pub url: String,
    pub auto_create_tables: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SslConfig {
    pub tls: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    pub app: String,
    pub enabled: bool,
    pub server_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_config: Option<SslConfig>,
    pub communication_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    pub private_key_path: String,
    pub public_key_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyConfig {
    pub passwords: Vec<String>,
    pub key_data: Vec<KeyPair>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TesseraConfig {
    pub use_white_list: bool,
    pub jdbc: JdbcConfig,
    pub server_configs: Vec<ServerConfig>,
    pub peer: Vec<TesseraPeer>,
    pub keys: KeyConfig,
    pub always_send_to: Vec<String>,
}

fn rest(app: &str, server_address: String, ssl: bool) -> ServerConfig {
    ServerConfig {
        app: app.to_string(),
        enabled: true,
        server_address,
        ssl_config: ssl.then(|| SslConfig { tls: "OFF".to_string() }),
        communication_type: "REST".to_string(),
    }
}

impl TesseraConfig {
    fn new(tm_dir: &str, db_name: &str, third_party: String, p2p: String, peers: &[TesseraPeer]) -> Self {
        Self {
            use_white_list: false,
            jdbc: JdbcConfig {
                username: "sa".to_string(),
                password: String::new(),
                url: format!("jdbc:h2:{}/{};MODE=Oracle;TRACE_LEVEL_SYSTEM_OUT=0", tm_dir, db_name),
                auto_create_tables: true,
            },
            server_configs: vec![
                rest("ThirdParty", third_party, false),
                rest("Q2T", format!("unix:{}/tm.ipc", tm_dir), false),
                rest("P2P", p2p, true),
            ],
            peer: peers.to_vec(),
            keys: KeyConfig {
                passwords: Vec::new(),
                key_data: vec![KeyPair {
                    private_key_path: format!("{}/tm.key", tm_dir),
                    public_key_path: format!("{}/tm.pub", tm_dir),
                }],
            },
            always_send_to: Vec::new(),
        }
    }

    /// Config of one host-process node, keyed by its own endpoint
    pub fn for_host_node(tm_dir: &Path, number: usize, tm: &PrivacyEndpoint, peers: &[TesseraPeer]) -> Self {
        Self::new(
            &tm_dir.to_string_lossy(),
            &format!("db{}", number),
            format!("http://{}:{}", tm.ip, tm.third_party_port),
            format!("http://{}:{}", tm.ip, tm.p2p_port),
            peers,
        )
    }

    /// Shared container template; `%THIS_NODE%` is replaced by the
    /// container's hostname at startup
    pub fn container_template(topology: &NetworkTopology, peers: &[TesseraPeer]) -> Option<Self> {
        let network = topology.container.as_ref()?;
        let tm = &network.ports.tm;
        Some(Self::new(
            "/qdata/tm",
            "db",
            format!("http://%THIS_NODE%:{}", tm.third_party_port),
            format!("http://%THIS_NODE%:{}", tm.p2p_port),
            peers,
        ))
    }
}
