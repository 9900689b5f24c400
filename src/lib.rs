//! # Netforge - Topology and configuration generator for Quorum test networks
//!
//! This library turns a handful of network choices into a fully addressed,
//! collision-free network topology and renders it into the files needed to
//! start a small (2-7 node) Quorum network on one host or one docker subnet.
//!
//! ## Overview
//!
//! A network is described by an answers record (node count, consensus,
//! privacy manager, deployment style, optional explorer). The library
//! resolves it into a `NetworkTopology`, persists that topology, and derives
//! every generated file from it so that all artifacts agree on the same
//! addresses and ports.
//!
//! ## Key Features
//!
//! - **Two addressing regimes**: incrementing local ports for host-process
//!   networks, subnet addresses with fixed in-container ports for docker
//! - **Raft and Istanbul BFT**: synthesized genesis with validator
//!   extra-data, or a user-supplied genesis copied verbatim
//! - **Tessera privacy manager**: per-node configs and peer lists
//! - **Cakeshop explorer**: optional explorer service and node list
//! - **Reproducible**: identical inputs produce byte-identical artifacts
//!
//! ## Architecture
//!
//! - `config`: Answers record and validation errors
//! - `config_loader`: Answers and persisted state loading
//! - `ip`: Subnet arithmetic, port plans and the endpoint registry
//! - `topology`: Network model, its construction and peer lists
//! - `consensus`: Genesis synthesis per consensus algorithm
//! - `resources`: Key material and remote resource generation
//! - `render`: Compose document, env file, node configs and scripts
//! - `registry`: Docker registry normalization
//! - `utils`: Filesystem wrappers and helpers
//! - `orchestrator`: The generation pipeline
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use netforge::{config_loader, orchestrator, registry::DockerRegistry};
//! use std::path::Path;
//!
//! let topology = config_loader::load_topology(Path::new("answers.yaml"))?;
//! let ctx = orchestrator::GenerationContext::new(".", DockerRegistry::default());
//! let summary = orchestrator::generate_network(&topology, &ctx)?;
//!
//! // summary.network_path now contains:
//! // - config.json: the persisted topology
//! // - resources/: key material, genesis.json, permissioned-nodes.json
//! // - qdata/: one dd<n> (and c<n>) directory per node
//! // - start.sh, stop.sh, attach.sh, runscript.sh and contract examples
//! // - docker-compose.yml and .env for docker networks
//! # Ok::<(), color_eyre::eyre::Error>(())
//! ```
//!
//! ## Answers Format
//!
//! ```yaml
//! name: "3-nodes-raft-tessera-bash"
//! numberNodes: 3
//! consensus: raft            # raft | istanbul
//! transactionManager: tessera  # none | tessera | <tessera version>
//! deployment: bash           # bash | docker-compose
//! cakeshop: false
//! networkId: 10
//! genesisLocation: none
//! customizePorts: false
//! generateKeys: false
//! ```
//!
//! ## Error Handling
//!
//! Each concern has a typed `thiserror` error (`ValidationError`,
//! `RangeError`, `CollisionError`, `ResourceError`, `ConsensusError`). The
//! pipeline and binary report them through `color_eyre`.

pub mod config;
pub mod config_loader;
pub mod consensus;
pub mod ip;
pub mod orchestrator;
pub mod registry;
pub mod render;
pub mod resources;
pub mod topology;
pub mod utils;
