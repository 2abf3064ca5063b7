//! IOS command builders and status-table constants for VLAN gateway
//! operations.

use crate::types::NetworkDefinition;
use gwsync_types::VlanId;

/// VLAN interface name prefix in status output.
pub const VLAN_PREFIX: &str = "Vlan";

/// Banner and column-heading lines preceding the first interface row of
/// `show interface summary`.
pub const SUMMARY_HEADER_LINES: usize = 11;

/// Marker in column 0 of an interface row that is up.
pub const UP_MARKER: u8 = b'*';

/// Column at which the interface name field begins.
pub const NAME_COLUMN: usize = 2;

/// Read-only status-summary command.
pub const SHOW_INTERFACE_SUMMARY: &str = "show interface summary";

/// Disables terminal paging so tabular output is not truncated mid-page.
pub const DISABLE_PAGING: &str = "terminal length 0";

/// Builds the config set removing a VLAN interface definition entirely.
pub fn build_delete_vlan_cmds(vlan_id: VlanId) -> Vec<String> {
    vec![format!("no interface vlan {}", vlan_id)]
}

/// Builds the config set creating or re-applying a VLAN gateway interface:
/// enter the interface context, set the description to the network's
/// catalog identifier, assign the gateway address, and bring the interface
/// up.
pub fn build_upsert_vlan_cmds(network: &NetworkDefinition) -> Vec<String> {
    vec![
        format!("interface vlan {}", network.vlan_id),
        format!("description {}", network.id),
        format!(
            "ip address {} {}",
            network.gateway_v4.address, network.gateway_v4.netmask
        ),
        "no shutdown".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use gwsync_types::Ipv4Net;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_delete_vlan_cmds() {
        let cmds = build_delete_vlan_cmds(VlanId::new(200).unwrap());
        assert_eq!(cmds, vec!["no interface vlan 200"]);
    }

    #[test]
    fn test_build_upsert_vlan_cmds() {
        let cidr: Ipv4Net = "10.0.0.0/24".parse().unwrap();
        let network = NetworkDefinition::new("tenant-a", VlanId::new(300).unwrap(), cidr, "");

        let cmds = build_upsert_vlan_cmds(&network);
        assert_eq!(
            cmds,
            vec![
                "interface vlan 300",
                "description tenant-a",
                "ip address 10.0.0.254 255.255.255.0",
                "no shutdown",
            ]
        );
    }
}
