//! Consensus configuration.
//!
//! One `ConsensusPlan` is chosen per network and is the only place the
//! consensus variant is branched on when producing the genesis file.

pub mod extra_data;
pub mod genesis;

use crate::resources::{NodeKeys, ResourceError};
use crate::topology::types::{Consensus, GenesisSource, NetworkTopology};
use crate::utils::files::read_to_string;
use log::{debug, info};
use std::path::PathBuf;

pub use genesis::Genesis;

pub const GENESIS_FILE: &str = "genesis.json";

#[derive(Debug, thiserror::Error)]
pub enum ConsensusError {
    #[error("Expected key material for {expected} nodes, found {found}")]
    KeyCount { expected: usize, found: usize },
    #[error("Cannot derive validator address of node {node}: {reason}")]
    ValidatorAddress { node: usize, reason: String },
    #[error("Failed to serialize genesis: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

/// How the genesis file is obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsensusPlan {
    Raft,
    Bft,
    /// Copied verbatim, never inspected
    UserSupplied(PathBuf),
}

impl ConsensusPlan {
    pub fn for_topology(topology: &NetworkTopology) -> Self {
        match (&topology.genesis, topology.consensus) {
            (GenesisSource::UserSupplied(path), _) => ConsensusPlan::UserSupplied(path.clone()),
            (GenesisSource::Synthesized, Consensus::Raft) => ConsensusPlan::Raft,
            (GenesisSource::Synthesized, Consensus::Bft) => ConsensusPlan::Bft,
        }
    }

    /// Produce the genesis file contents.
    ///
    /// `keys` must hold one entry per node in node order; synthesized plans
    /// fund every account and the BFT plan derives its validators from them.
    pub fn genesis(&self, topology: &NetworkTopology, keys: &[NodeKeys]) -> Result<String, ConsensusError> {
        let accounts = || -> Result<Vec<String>, ConsensusError> {
            if keys.len() != topology.node_count {
                return Err(ConsensusError::KeyCount {
                    expected: topology.node_count,
                    found: keys.len(),
                });
            }
            Ok(keys.iter().map(|k| k.account_address.clone()).collect())
        };

        let genesis = match self {
            ConsensusPlan::UserSupplied(path) => {
                info!("Using genesis file {:?}", path);
                if !path.is_file() {
                    return Err(ResourceError::GenesisNotFound(path.clone()).into());
                }
                return Ok(read_to_string(path)?);
            }
            ConsensusPlan::Raft => Genesis::raft(topology.network_id, &accounts()?),
            ConsensusPlan::Bft => {
                let accounts = accounts()?;
                let validators = keys
                    .iter()
                    .enumerate()
                    .map(|(i, k)| {
                        k.validator_address()
                            .map_err(|reason| ConsensusError::ValidatorAddress { node: i + 1, reason })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                debug!("Istanbul validators: {:?}", validators.iter().map(hex::encode).collect::<Vec<_>>());
                Genesis::istanbul(
                    topology.network_id,
                    &accounts,
                    extra_data::istanbul_extra_data(&validators),
                )
            }
        };

        Ok(serde_json::to_string_pretty(&genesis)?)
    }
}
