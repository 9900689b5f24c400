//! Network topology module.
//!
//! This module contains the resolved network model, its construction from
//! the answers record, and the peer lists derived from it.

pub mod builder;
pub mod connections;
pub mod types;

// Re-export key types and functions for easier access
pub use connections::{enode_list, tessera_peer_list, TesseraPeer};
pub use types::{Consensus, Deployment, NetworkTopology, NodeIdentity, PrivacyManager};
