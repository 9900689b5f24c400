//! IP address and port allocation module.
//!
//! This module handles address allocation for network nodes: subnet
//! arithmetic for container networks, per-service port plans for
//! host-process networks, and the registry that detects collisions.

pub mod container;
pub mod ports;
pub mod registry;
pub mod subnet;

// Re-export commonly used types
pub use container::{ContainerPorts, DEFAULT_DOCKER_SUBNET};
pub use ports::{NodeOverride, PortPlan};
pub use registry::{CollisionError, EndpointRegistry};
pub use subnet::{host_address, RangeError};
