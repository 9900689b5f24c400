//! Artifact rendering.
//!
//! Everything the network directory needs beyond copied key material is
//! rendered here into an in-memory `Artifacts` set. Rendering starts with
//! the endpoint collision check, so a bad custom port table fails before a
//! single artifact reaches the disk. Every address in every artifact is
//! read from the topology's `NodeIdentity` values.

pub mod cakeshop;
pub mod compose;
pub mod env;
pub mod scripts;
pub mod tessera;

use crate::ip::registry::{CollisionError, EndpointRegistry};
use crate::ip::subnet::RangeError;
use crate::registry::DockerRegistry;
use crate::resources::ResourceError;
use crate::topology::connections::tessera_peer_list;
use crate::topology::types::NetworkTopology;
use crate::utils::files::{create_dir, write_file, write_script};
use log::debug;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tessera::TesseraConfig;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Collision(#[from] CollisionError),
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error("Failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One rendered file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub content: String,
    pub executable: bool,
}

/// Rendered files keyed by path relative to the network directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Artifacts {
    files: BTreeMap<PathBuf, Artifact>,
}

impl Artifacts {
    pub fn insert(&mut self, path: impl Into<PathBuf>, content: String) {
        self.files.insert(
            path.into(),
            Artifact {
                content,
                executable: false,
            },
        );
    }

    pub fn insert_script(&mut self, path: impl Into<PathBuf>, content: String) {
        self.files.insert(
            path.into(),
            Artifact {
                content,
                executable: true,
            },
        );
    }

    fn insert_json<T: serde::Serialize>(&mut self, path: PathBuf, value: &T) -> Result<(), RenderError> {
        let json = serde_json::to_string_pretty(value).map_err(|source| RenderError::Serialize {
            path: path.clone(),
            source,
        })?;
        self.insert(path, json);
        Ok(())
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(|a| a.content.as_str())
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.files.contains_key(path.as_ref())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write every artifact below `root`, creating parent directories
    pub fn write_all(&self, root: &Path) -> Result<(), ResourceError> {
        for (relative, artifact) in &self.files {
            let path = root.join(relative);
            if let Some(parent) = path.parent() {
                create_dir(parent)?;
            }
            if artifact.executable {
                let (dir, name) = (path.parent().unwrap_or(root), relative_name(relative));
                write_script(dir, &name, &artifact.content)?;
            } else {
                write_file(&path, &artifact.content)?;
            }
            debug!("Wrote {:?}", path);
        }
        Ok(())
    }
}

fn relative_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Inputs to rendering that do not live in the topology
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    pub registry: &'a DockerRegistry,
    /// Absolute network directory, used inside host-process configs
    pub network_path: &'a Path,
    /// Privacy public key of the private-contract recipient
    pub private_for: Option<&'a str>,
}

/// Render every generated artifact of a network
pub fn render(topology: &NetworkTopology, ctx: &RenderContext<'_>) -> Result<Artifacts, RenderError> {
    let registry = EndpointRegistry::from_topology(topology)?;
    debug!("Endpoint check passed for {} endpoints", registry.len());

    let mut artifacts = Artifacts::default();
    let peers = tessera_peer_list(topology);

    if let Some(document) = compose::build_compose(topology) {
        artifacts.insert(compose::COMPOSE_FILE, document);
    }
    if let Some(env) = env::build_env_file(topology, ctx.registry)? {
        artifacts.insert(env::ENV_FILE, env);
    }

    if topology.has_tessera() {
        if let Some(template) = TesseraConfig::container_template(topology, &peers) {
            for (number, _) in topology.numbered_nodes() {
                let path = PathBuf::from(format!("qdata/c{}", number)).join(tessera::CONTAINER_CONFIG_FILE);
                artifacts.insert_json(path, &template)?;
            }
        } else {
            for (number, node) in topology.numbered_nodes() {
                if let Some(tm) = &node.privacy {
                    let relative = PathBuf::from(format!("qdata/c{}", number));
                    let tm_dir = ctx.network_path.join(&relative);
                    let config = TesseraConfig::for_host_node(&tm_dir, number, tm, &peers);
                    artifacts.insert_json(relative.join(tessera::host_config_file(number)), &config)?;
                }
            }
        }
    }

    if let Some(properties) = cakeshop::application_properties(topology) {
        let dir = PathBuf::from(cakeshop::CAKESHOP_DIR);
        artifacts.insert(dir.join(cakeshop::PROPERTIES_FILE), properties);
        artifacts.insert_json(dir.join(cakeshop::NODES_FILE), &cakeshop::cakeshop_nodes(topology))?;
    }

    for script in scripts::build_scripts(topology, ctx.private_for) {
        if script.executable {
            artifacts.insert_script(script.name, script.content);
        } else {
            artifacts.insert(script.name, script.content);
        }
    }

    Ok(artifacts)
}
