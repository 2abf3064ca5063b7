//! Domain model for VLAN gateway synchronization.

use gwsync_types::{Ipv4Address, Ipv4Net, VlanId};
use std::fmt;

/// IPv4 gateway assignment: a dotted address paired with a dotted netmask,
/// as issued on the device CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatewayV4 {
    /// The gateway address (one below the network's broadcast address).
    pub address: Ipv4Address,
    /// The network's dotted netmask.
    pub netmask: Ipv4Address,
}

impl fmt::Display for GatewayV4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.address, self.netmask)
    }
}

/// Desired state of one network, normalized from the catalog.
///
/// Rebuilt fresh on every poll cycle; never mutated or cached across cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkDefinition {
    /// Catalog identifier of the network; used as the interface description.
    pub id: String,
    /// The VLAN carrying this network.
    pub vlan_id: VlanId,
    /// The network's IPv4 CIDR.
    pub ipv4_cidr: Ipv4Net,
    /// The gateway derived from `ipv4_cidr`.
    pub gateway_v4: GatewayV4,
    /// The network's IPv6 CIDR. Carried through but currently unused.
    pub ipv6_cidr: String,
}

impl NetworkDefinition {
    /// Builds a definition from catalog fields, deriving the gateway from
    /// the IPv4 CIDR.
    pub fn new(
        id: impl Into<String>,
        vlan_id: VlanId,
        ipv4_cidr: Ipv4Net,
        ipv6_cidr: impl Into<String>,
    ) -> Self {
        let gateway_v4 = GatewayV4 {
            address: ipv4_cidr.gateway(),
            netmask: ipv4_cidr.netmask(),
        };
        Self {
            id: id.into(),
            vlan_id,
            ipv4_cidr,
            gateway_v4,
            ipv6_cidr: ipv6_cidr.into(),
        }
    }
}

/// Live state of one VLAN interface as read from a device.
///
/// Rebuilt fresh on every sync cycle and discarded after the diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceVlanState {
    /// The VLAN interface's ID.
    pub vlan_id: VlanId,
    /// Whether the interface is administratively and operationally up.
    pub is_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_gateway_derived_from_cidr() {
        let cidr: Ipv4Net = "10.0.0.0/24".parse().unwrap();
        let network = NetworkDefinition::new("net-a", VlanId::new(300).unwrap(), cidr, "");

        assert_eq!(network.gateway_v4.address.to_string(), "10.0.0.254");
        assert_eq!(network.gateway_v4.netmask.to_string(), "255.255.255.0");
    }

    #[test]
    fn test_gateway_display() {
        let cidr: Ipv4Net = "10.0.0.0/24".parse().unwrap();
        let network = NetworkDefinition::new("net-a", VlanId::new(300).unwrap(), cidr, "");

        assert_eq!(network.gateway_v4.to_string(), "10.0.0.254 255.255.255.0");
    }
}
