//! Network resources: key material and generated configuration inputs.
//!
//! Before anything is rendered, the network's `resources/` directory must
//! hold one key directory per node. They are either copied from a
//! pre-generated key set or materialised by the remote generator running
//! in a container.

pub mod keys;
pub mod remote;

use crate::topology::types::{GenesisSource, KeySource, NetworkTopology};
use crate::utils::files::{copy_dir, create_dir};
use log::info;
use std::path::{Path, PathBuf};

pub use keys::NodeKeys;
pub use remote::{CommandExecutor, ShellExecutor};

/// Errors from missing or broken inputs and failed external commands
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("Required file not found: {0}")]
    MissingFile(PathBuf),
    #[error("Genesis file not found: {0}")]
    GenesisNotFound(PathBuf),
    #[error("Malformed key material in {path}: {reason}")]
    MalformedKey { path: PathBuf, reason: String },
    #[error("Command failed ({status}): {command}")]
    CommandFailed { command: String, status: String },
    #[error("Failed to serialize {path}: {reason}")]
    Serialize { path: PathBuf, reason: String },
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ResourceError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        ResourceError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Fail early if a user-supplied genesis file does not exist
pub fn check_genesis_source(genesis: &GenesisSource) -> Result<(), ResourceError> {
    match genesis {
        GenesisSource::UserSupplied(path) if !path.is_file() => Err(ResourceError::GenesisNotFound(path.clone())),
        _ => Ok(()),
    }
}

/// Populate `config_dir` with one key directory per node.
///
/// `Directory` sources are copied; `Remote` sources run the container-based
/// generator through `executor`. Either way the result is checked for
/// every key file the topology needs.
pub fn prepare_key_material(
    topology: &NetworkTopology,
    network_path: &Path,
    config_dir: &Path,
    registry: &crate::registry::DockerRegistry,
    executor: &dyn CommandExecutor,
) -> Result<(), ResourceError> {
    create_dir(config_dir)?;

    match &topology.key_source {
        KeySource::Directory(source) => {
            info!("Copying key material from {:?}", source);
            copy_dir(source, config_dir)?;
        }
        KeySource::Remote => {
            remote::generate_resources_remote(topology, network_path, config_dir, registry, executor)?;
        }
    }

    keys::check_key_material(config_dir, topology.node_count, topology.has_tessera())
}
