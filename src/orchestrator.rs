//! Generation pipeline.
//!
//! Runs once per invocation, in order: genesis source check, network
//! directory and persisted state, key material, genesis and peer lists,
//! artifact rendering (with the endpoint collision check), then file
//! writes. Nothing is retried; the first error aborts the run and
//! partially written output is left in place.

use crate::config_loader::{load_state, STATE_FILE};
use crate::consensus::{ConsensusPlan, GENESIS_FILE};
use crate::registry::DockerRegistry;
use crate::render::{render, Artifacts, RenderContext};
use crate::resources::keys::{self, key_dir};
use crate::resources::{check_genesis_source, prepare_key_material, CommandExecutor, ResourceError, ShellExecutor};
use crate::topology::connections::enode_list;
use crate::topology::types::NetworkTopology;
use crate::utils::files::{copy_file, create_dir, read_to_string, remove_dir, write_file, write_json};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{debug, info};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

pub const PERMISSIONED_NODES_FILE: &str = "permissioned-nodes.json";
pub const STATIC_NODES_FILE: &str = "static-nodes.json";
/// Directory inside the network holding key material and shared files
pub const RESOURCES_DIR: &str = "resources";

/// Settings that apply to a whole generation run
pub struct GenerationContext {
    pub registry: DockerRegistry,
    /// Networks are created under `<base_dir>/network/<name>`
    pub base_dir: PathBuf,
    pub executor: Box<dyn CommandExecutor + Send + Sync>,
}

impl GenerationContext {
    pub fn new(base_dir: impl Into<PathBuf>, registry: DockerRegistry) -> Self {
        Self {
            registry,
            base_dir: base_dir.into(),
            executor: Box::new(ShellExecutor),
        }
    }

    pub fn with_executor(mut self, executor: Box<dyn CommandExecutor + Send + Sync>) -> Self {
        self.executor = executor;
        self
    }

    pub fn network_path(&self, topology: &NetworkTopology) -> PathBuf {
        self.base_dir.join("network").join(&topology.name)
    }
}

/// What a run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSummary {
    pub network_path: PathBuf,
    pub enodes: Vec<String>,
    pub artifacts: Artifacts,
}

/// Generate a complete network directory for `topology`
pub fn generate_network(topology: &NetworkTopology, ctx: &GenerationContext) -> Result<GenerationSummary> {
    check_genesis_source(&topology.genesis)?;

    let network_path = ctx.network_path(topology);
    let config_dir = network_path.join(RESOURCES_DIR);

    create_network(topology, &network_path)?;

    prepare_key_material(topology, &network_path, &config_dir, &ctx.registry, ctx.executor.as_ref())
        .wrap_err("Failed to prepare key material")?;
    let node_keys = keys::read_all(&config_dir, topology.node_count)?;

    let plan = ConsensusPlan::for_topology(topology);
    debug!("Consensus plan: {:?}", plan);
    let genesis = plan.genesis(topology, &node_keys).wrap_err("Failed to build genesis")?;
    let enodes = enode_list(topology, &node_keys);

    let private_for = if topology.has_tessera() && topology.node_count > 1 {
        Some(read_to_string(&key_dir(&config_dir, 2).join(keys::TM_PUB))?.trim().to_string())
    } else {
        None
    };

    let artifacts = render(
        topology,
        &RenderContext {
            registry: &ctx.registry,
            network_path: &network_path,
            private_for: private_for.as_deref(),
        },
    )
    .wrap_err("Failed to render network artifacts")?;

    write_file(&config_dir.join(GENESIS_FILE), &genesis)?;
    write_json(&config_dir, PERMISSIONED_NODES_FILE, &enodes)?;

    create_qdata(topology, &network_path, &config_dir)?;
    artifacts.write_all(&network_path)?;

    info!("Network '{}' created at {:?}", topology.name, network_path);
    Ok(GenerationSummary {
        network_path,
        enodes,
        artifacts,
    })
}

/// Rebuild a network from its persisted `config.json`
pub fn regenerate_network(state_path: &Path, ctx: &GenerationContext) -> Result<GenerationSummary> {
    let topology = load_state(state_path)?;
    generate_network(&topology, ctx)
}

/// Recreate the network directory and persist the topology in it
fn create_network(topology: &NetworkTopology, network_path: &Path) -> Result<()> {
    info!("Building network directory...");
    remove_dir(network_path)?;
    create_dir(network_path)?;
    write_json(network_path, STATE_FILE, topology)?;
    Ok(())
}

/// Populate `qdata/` with one consensus and one privacy directory per node.
/// Node directories are disjoint, so they are filled in parallel.
fn create_qdata(topology: &NetworkTopology, network_path: &Path, config_dir: &Path) -> Result<()> {
    info!("Building qdata directory...");
    let qdata = network_path.join("qdata");
    create_dir(&qdata.join("logs"))?;

    topology
        .numbered_nodes()
        .collect::<Vec<_>>()
        .par_iter()
        .try_for_each(|(number, node)| populate_node(&qdata, config_dir, *number, node.privacy.is_some()))
        .wrap_err("Failed to populate node directories")?;

    Ok(())
}

fn populate_node(qdata: &Path, config_dir: &Path, number: usize, tessera: bool) -> Result<(), ResourceError> {
    let keys = key_dir(config_dir, number);
    let quorum_dir = qdata.join(format!("dd{}", number));
    let geth_dir = quorum_dir.join("geth");
    let keystore = quorum_dir.join("keystore");
    create_dir(&geth_dir)?;
    create_dir(&keystore)?;

    let peers = config_dir.join(PERMISSIONED_NODES_FILE);
    copy_file(&peers, &quorum_dir.join(PERMISSIONED_NODES_FILE))?;
    copy_file(&peers, &quorum_dir.join(STATIC_NODES_FILE))?;
    copy_file(&keys.join(keys::ACCOUNT_KEYFILE), &keystore.join("key"))?;
    copy_file(&keys.join(keys::NODEKEY), &geth_dir.join("nodekey"))?;
    copy_file(&keys.join(keys::PASSWORD), &keystore.join(keys::PASSWORD))?;
    copy_file(&config_dir.join(GENESIS_FILE), &quorum_dir.join(GENESIS_FILE))?;

    if tessera {
        let tm_dir = qdata.join(format!("c{}", number));
        create_dir(&tm_dir)?;
        copy_file(&keys.join(keys::TM_KEY), &tm_dir.join(keys::TM_KEY))?;
        copy_file(&keys.join(keys::TM_PUB), &tm_dir.join(keys::TM_PUB))?;
    }

    debug!("Populated node {} directories", number);
    Ok(())
}
