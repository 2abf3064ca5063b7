//! Common network primitive types for VLAN gateway synchronization.
//!
//! This crate provides type-safe representations of the network primitives
//! used throughout the sync daemon:
//!
//! - [`VlanId`]: IEEE 802.1Q VLAN identifiers
//! - [`Ipv4Address`]: IPv4 addresses
//! - [`Ipv4Net`]: IPv4 network prefixes (CIDR notation) with netmask,
//!   broadcast and gateway derivation

mod ip;
mod vlan;

pub use ip::{Ipv4Address, Ipv4Net};
pub use vlan::VlanId;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid IPv4 address format: {0}")]
    InvalidIpAddress(String),

    #[error("invalid IPv4 prefix format: {0}")]
    InvalidIpPrefix(String),

    #[error("invalid VLAN ID: {0} (must be 1-4094)")]
    InvalidVlanId(String),
}
