//! Subnet arithmetic.
//!
//! Maps a CIDR block and a host offset to a concrete IPv4 address. Every
//! container address in a generated network comes from here, so the same
//! `(subnet, offset)` pair always has to produce the same address.

use ipnet::Ipv4Net;
use std::net::Ipv4Addr;

/// Host offset of the explorer container
pub const EXPLORER_OFFSET: u32 = 2;
/// Host offset exported to containers as `DOCKER_IP`
pub const DOCKER_IP_OFFSET: u32 = 10;
/// First host offset used by consensus nodes (node index is added)
pub const QUORUM_NODE_OFFSET: u32 = 11;
/// First host offset used by privacy manager nodes (node index is added)
pub const TM_NODE_OFFSET: u32 = 101;

/// Offset does not fit inside the subnet
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Host offset {offset} is outside subnet {subnet} ({usable} usable hosts)")]
pub struct RangeError {
    pub subnet: Ipv4Net,
    pub offset: u32,
    pub usable: u32,
}

/// Number of usable host addresses (network and broadcast excluded)
pub fn usable_hosts(subnet: &Ipv4Net) -> u32 {
    let host_bits = 32 - u32::from(subnet.prefix_len());
    let size: u64 = 1u64 << host_bits;
    size.saturating_sub(2) as u32
}

/// Return the address `offset` hosts above the network address of `subnet`.
///
/// Offsets start at 1 (the first usable host). Offset 0 is the network
/// address itself and is rejected along with anything past the last
/// usable host.
///
/// # Examples
/// ```
/// use netforge::ip::subnet::host_address;
///
/// let subnet = "172.16.239.0/24".parse().unwrap();
/// assert_eq!(host_address(&subnet, 11).unwrap().to_string(), "172.16.239.11");
/// assert!(host_address(&subnet, 255).is_err());
/// ```
pub fn host_address(subnet: &Ipv4Net, offset: u32) -> Result<Ipv4Addr, RangeError> {
    let usable = usable_hosts(subnet);
    if offset == 0 || offset > usable {
        return Err(RangeError {
            subnet: *subnet,
            offset,
            usable,
        });
    }
    let network = u32::from(subnet.network());
    Ok(Ipv4Addr::from(network + offset))
}

/// Address of the consensus container for node `index` (0-based)
pub fn quorum_node_address(subnet: &Ipv4Net, index: usize) -> Result<Ipv4Addr, RangeError> {
    host_address(subnet, QUORUM_NODE_OFFSET + index as u32)
}

/// Address of the privacy manager container for node `index` (0-based)
pub fn tm_node_address(subnet: &Ipv4Net, index: usize) -> Result<Ipv4Addr, RangeError> {
    host_address(subnet, TM_NODE_OFFSET + index as u32)
}

/// Parse a CIDR string, normalising host bits away (`10.0.0.7/24` -> `10.0.0.0/24`)
pub fn parse_subnet(cidr: &str) -> Result<Ipv4Net, ipnet::AddrParseError> {
    cidr.trim().parse::<Ipv4Net>().map(|net| net.trunc())
}
