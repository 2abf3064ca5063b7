//! Device adapter capability interface.
//!
//! One implementation per vendor CLI dialect; the engine and agent only see
//! this trait. The provided [`DeviceAdapter::sync`] drives a full converge
//! pass for one device: open, read, diff, apply, close.

use crate::error::SyncResult;
use crate::reconcile::{self, ReconcileOp};
use crate::session::CliSession;
use crate::types::{DeviceVlanState, NetworkDefinition};
use async_trait::async_trait;
use gwsync_types::VlanId;
use tracing::{debug, warn};

/// Outcome of one device converge pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Operations accepted by the device.
    pub applied: usize,
    /// Operations rejected by the device. Failed operations do not abort
    /// the remaining ones, but are never silent: the caller sees the count.
    pub failed: usize,
}

impl SyncReport {
    /// Whether any configuration change was applied.
    pub fn changed(&self) -> bool {
        self.applied > 0
    }
}

/// Capabilities a vendor adapter must provide.
#[async_trait]
pub trait DeviceAdapter: Send + Sync {
    /// Device identity for logs and error context.
    fn name(&self) -> &str;

    /// Opens an authenticated, privileged session.
    async fn open(&self) -> SyncResult<Box<dyn CliSession>>;

    /// Reads the live VLAN interface states from the device.
    async fn current_states(
        &self,
        session: &mut dyn CliSession,
    ) -> SyncResult<Vec<DeviceVlanState>>;

    /// Removes a VLAN interface definition. Returns true on acceptance.
    async fn apply_delete(&self, session: &mut dyn CliSession, vlan_id: VlanId)
        -> SyncResult<bool>;

    /// Creates or re-applies a VLAN gateway interface. Returns true on
    /// acceptance.
    async fn apply_upsert(
        &self,
        session: &mut dyn CliSession,
        network: &NetworkDefinition,
    ) -> SyncResult<bool>;

    /// Releases the session.
    async fn close(&self, session: &mut dyn CliSession) -> SyncResult<()>;

    /// Converges this device to the desired network set.
    ///
    /// The session is released on every exit path, including mid-apply
    /// failures.
    async fn sync(&self, desired: &[NetworkDefinition]) -> SyncResult<SyncReport> {
        let mut session = self.open().await?;
        let result = self.converge(&mut *session, desired).await;
        if let Err(error) = self.close(&mut *session).await {
            debug!(device = self.name(), %error, "session close failed");
        }
        result
    }

    /// Reads current state, diffs against `desired`, and applies the
    /// operations in order on an already-open session.
    async fn converge(
        &self,
        session: &mut dyn CliSession,
        desired: &[NetworkDefinition],
    ) -> SyncResult<SyncReport> {
        let current = self.current_states(session).await?;
        let ops = reconcile::diff(&current, desired);
        debug!(
            device = self.name(),
            current = current.len(),
            desired = desired.len(),
            operations = ops.len(),
            "state diff computed"
        );

        let mut report = SyncReport::default();
        for op in &ops {
            let outcome = match op {
                ReconcileOp::Delete(vlan_id) => self.apply_delete(session, *vlan_id).await,
                ReconcileOp::Upsert(network) => self.apply_upsert(session, network).await,
            };
            match outcome {
                Ok(true) => report.applied += 1,
                Ok(false) => {}
                Err(error) => {
                    warn!(
                        device = self.name(),
                        vlan_id = %op.vlan_id(),
                        %error,
                        "operation failed, continuing with remaining operations"
                    );
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }
}
