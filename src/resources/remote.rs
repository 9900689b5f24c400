//! Remote resource generation.
//!
//! Key material can be produced by the qubernetes image instead of being
//! copied from disk. The image is pulled and run synchronously; any
//! non-zero exit aborts generation. There is no retry.

use super::ResourceError;
use crate::registry::DockerRegistry;
use crate::topology::types::{NetworkTopology, PrivacyManager};
use crate::utils::files::{copy_dir, create_dir, write_file};
use log::{error, info};
use serde::Serialize;
use std::path::Path;
use std::process::Command;

/// Image tag of the resource generator
pub const QUBERNETES_VERSION: &str = "0.1.1";
pub const QUBERNETES_FILE: &str = "qubernetes.yaml";

/// Runs a command line and reports whether it succeeded
pub trait CommandExecutor {
    fn execute(&self, command: &str, cwd: &Path) -> Result<(), ResourceError>;
}

/// Executes commands through `sh -c`
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellExecutor;

impl CommandExecutor for ShellExecutor {
    fn execute(&self, command: &str, cwd: &Path) -> Result<(), ResourceError> {
        info!("Running: {}", command);
        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(cwd)
            .status()
            .map_err(|e| ResourceError::io(cwd, e))?;

        if !status.success() {
            return Err(ResourceError::CommandFailed {
                command: command.to_string(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Serialize, Debug)]
struct QubeQuorumVersion {
    consensus: String,
    #[serde(rename = "Quorum_Version")]
    quorum_version: String,
}

#[derive(Serialize, Debug)]
struct QubeTm {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Tm_Version")]
    tm_version: String,
}

#[derive(Serialize, Debug)]
struct QubeQuorum {
    quorum: QubeQuorumVersion,
    tm: QubeTm,
}

#[derive(Serialize, Debug)]
struct QubeNode {
    #[serde(rename = "Node_UserIdent")]
    user_ident: String,
    #[serde(rename = "Key_Dir")]
    key_dir: String,
    quorum: QubeQuorum,
}

#[derive(Serialize, Debug)]
struct QubeGenesis {
    consensus: String,
    #[serde(rename = "Quorum_Version")]
    quorum_version: String,
    #[serde(rename = "Chain_Id")]
    chain_id: u64,
}

/// Resource description consumed by the qubernetes image
#[derive(Serialize, Debug)]
struct QubernetesResource {
    sep_deployment_files: bool,
    nodes: Vec<QubeNode>,
    genesis: QubeGenesis,
}

/// Render `qubernetes.yaml` for a topology
pub fn build_qubernetes_resource(topology: &NetworkTopology) -> Result<String, serde_yaml::Error> {
    let (tm_name, tm_version) = match &topology.privacy_manager {
        PrivacyManager::Tessera { version } => ("tessera".to_string(), version.clone()),
        PrivacyManager::None => ("none".to_string(), String::new()),
    };

    let nodes = (1..=topology.node_count)
        .map(|number| QubeNode {
            user_ident: format!("quorum-node{}", number),
            key_dir: format!("key{}", number),
            quorum: QubeQuorum {
                quorum: QubeQuorumVersion {
                    consensus: topology.consensus.to_string(),
                    quorum_version: topology.quorum_version.clone(),
                },
                tm: QubeTm {
                    name: tm_name.clone(),
                    tm_version: tm_version.clone(),
                },
            },
        })
        .collect();

    serde_yaml::to_string(&QubernetesResource {
        sep_deployment_files: true,
        nodes,
        genesis: QubeGenesis {
            consensus: topology.consensus.to_string(),
            quorum_version: topology.quorum_version.clone(),
            chain_id: topology.network_id,
        },
    })
}

/// Command lines that pull and run the generator
pub fn remote_commands(network_path: &Path, registry: &DockerRegistry) -> Vec<String> {
    let image = registry.image(&format!("quorumengineering/qubernetes:{}", QUBERNETES_VERSION));
    vec![
        format!("docker pull {}", image),
        format!(
            "docker run --rm -v {}:/qubernetes/qubernetes.yaml -v {}:/qubernetes/out {} /bin/bash -c \"./quorum-init --action=update qubernetes.yaml\"",
            network_path.join(QUBERNETES_FILE).display(),
            network_path.join("out").display(),
            image
        ),
    ]
}

/// Generate key material in the qubernetes container and copy it to `config_dir`
pub fn generate_resources_remote(
    topology: &NetworkTopology,
    network_path: &Path,
    config_dir: &Path,
    registry: &DockerRegistry,
    executor: &dyn CommandExecutor,
) -> Result<(), ResourceError> {
    info!("Pulling docker container and generating network resources...");

    let resource_path = network_path.join(QUBERNETES_FILE);
    let resource = build_qubernetes_resource(topology).map_err(|e| ResourceError::Serialize {
        path: resource_path.clone(),
        reason: e.to_string(),
    })?;
    write_file(&resource_path, &resource)?;
    create_dir(&network_path.join("out"))?;

    for command in remote_commands(network_path, registry) {
        if let Err(e) = executor.execute(&command, network_path) {
            error!(
                "Generating resources in the qubernetes container failed. \
                 You may not be able to access DockerHub from your machine. \
                 If you have a custom docker registry, re-run with --registry yourcustomregistry.example.com"
            );
            return Err(e);
        }
    }

    copy_dir(&network_path.join("out").join("config"), config_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct RecordingExecutor {
        commands: RefCell<Vec<String>>,
        fail_on: Option<usize>,
    }

    impl CommandExecutor for RecordingExecutor {
        fn execute(&self, command: &str, _cwd: &Path) -> Result<(), ResourceError> {
            let index = self.commands.borrow().len();
            self.commands.borrow_mut().push(command.to_string());
            if self.fail_on == Some(index) {
                return Err(ResourceError::CommandFailed {
                    command: command.to_string(),
                    status: "exit status: 1".to_string(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn test_remote_commands_use_registry() {
        let registry = DockerRegistry::parse(Some("mirror.local")).unwrap();
        let commands = remote_commands(Path::new("/tmp/net"), &registry);
        assert_eq!(commands.len(), 2);
        assert!(commands[0].starts_with("docker pull mirror.local/quorumengineering/qubernetes:"));
        assert!(commands[1].contains("-v /tmp/net/qubernetes.yaml:/qubernetes/qubernetes.yaml"));
    }

    #[test]
    fn test_failing_command_stops_generation() {
        let dir = tempfile::TempDir::new().unwrap();
        let topology = crate::topology::builder::tests::sample_topology(dir.path());
        let executor = RecordingExecutor {
            commands: RefCell::new(Vec::new()),
            fail_on: Some(0),
        };

        let result = generate_resources_remote(
            &topology,
            dir.path(),
            &dir.path().join("resources"),
            &DockerRegistry::default(),
            &executor,
        );

        assert!(matches!(result, Err(ResourceError::CommandFailed { .. })));
        // The run command is never attempted after the pull fails
        assert_eq!(executor.commands.borrow().len(), 1);
        assert!(dir.path().join(QUBERNETES_FILE).exists());
    }

    #[test]
    fn test_qubernetes_resource_lists_nodes() {
        let dir = tempfile::TempDir::new().unwrap();
        let topology = crate::topology::builder::tests::sample_topology(dir.path());
        let yaml = build_qubernetes_resource(&topology).unwrap();
        assert!(yaml.contains("Node_UserIdent: quorum-node1"));
        assert!(yaml.contains("Key_Dir: key3"));
        assert!(yaml.contains("Chain_Id: 10"));
    }
}
