//! Pure reconciliation engine: computes the operations needed to converge a
//! device's live VLAN state to the desired catalog state.
//!
//! No I/O and no mutable state; the sole "already converged" signal for a
//! desired VLAN is presence-and-enabled. Gateway address or description
//! drift on an already-enabled VLAN does not trigger a re-apply.

use crate::types::{DeviceVlanState, NetworkDefinition};
use gwsync_types::VlanId;
use std::collections::BTreeMap;

/// Highest system-reserved VLAN ID. Reserved VLANs are never created,
/// updated or deleted by this tool, regardless of catalog or device state.
pub const RESERVED_VLAN_MAX: u16 = 100;

/// A single convergence operation against one device.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOp {
    /// Remove the VLAN interface definition entirely.
    Delete(VlanId),
    /// Create or re-apply the VLAN interface for this network.
    Upsert(NetworkDefinition),
}

impl ReconcileOp {
    /// The VLAN ID this operation targets.
    pub fn vlan_id(&self) -> VlanId {
        match self {
            ReconcileOp::Delete(vlan_id) => *vlan_id,
            ReconcileOp::Upsert(network) => network.vlan_id,
        }
    }
}

/// Computes the ordered operation list converging `current` to `desired`.
///
/// Deletions come first, then upserts; each group is ordered by VLAN ID, so
/// identical inputs always produce the identical operation list. A given
/// VLAN ID appears at most once in the result: indexing both sides by ID
/// makes the delete and upsert sets disjoint by construction.
pub fn diff(current: &[DeviceVlanState], desired: &[NetworkDefinition]) -> Vec<ReconcileOp> {
    let current_by_id: BTreeMap<VlanId, bool> = current
        .iter()
        .map(|state| (state.vlan_id, state.is_enabled))
        .collect();
    let desired_by_id: BTreeMap<VlanId, &NetworkDefinition> = desired
        .iter()
        .map(|network| (network.vlan_id, network))
        .collect();

    let mut ops = Vec::new();

    for &vlan_id in current_by_id.keys() {
        if vlan_id.as_u16() <= RESERVED_VLAN_MAX {
            continue;
        }
        if !desired_by_id.contains_key(&vlan_id) {
            ops.push(ReconcileOp::Delete(vlan_id));
        }
    }

    for (&vlan_id, &network) in &desired_by_id {
        if vlan_id.as_u16() <= RESERVED_VLAN_MAX {
            continue;
        }
        match current_by_id.get(&vlan_id) {
            // Present and enabled: converged, leave untouched.
            Some(true) => {}
            // Absent, or present but not enabled: (re-)apply.
            Some(false) | None => ops.push(ReconcileOp::Upsert(network.clone())),
        }
    }

    ops
}
