//! Catalyst (IOS CLI dialect) device adapter.

use crate::adapter::DeviceAdapter;
use crate::commands::{
    build_delete_vlan_cmds, build_upsert_vlan_cmds, DISABLE_PAGING, NAME_COLUMN,
    SHOW_INTERFACE_SUMMARY, SUMMARY_HEADER_LINES, UP_MARKER, VLAN_PREFIX,
};
use crate::config::DeviceConfig;
use crate::error::{SyncError, SyncResult};
use crate::session::{CliSession, SessionFactory, SshSessionFactory};
use crate::types::{DeviceVlanState, NetworkDefinition};
use async_trait::async_trait;
use gwsync_types::VlanId;
use tracing::info;

/// Adapter for Catalyst 4948-family switches.
pub struct CatalystAdapter {
    name: String,
    factory: Box<dyn SessionFactory>,
}

impl CatalystAdapter {
    /// Creates an adapter connecting over SSH with the device's credentials.
    pub fn new(device: &DeviceConfig) -> Self {
        Self {
            name: device.address.clone(),
            factory: Box::new(SshSessionFactory::new(device.clone())),
        }
    }

    /// Creates an adapter with a custom session factory.
    pub fn with_factory(name: impl Into<String>, factory: Box<dyn SessionFactory>) -> Self {
        Self {
            name: name.into(),
            factory,
        }
    }

    /// Parses `show interface summary` output into VLAN interface states.
    ///
    /// Precondition on device output ordering: the table lists VLAN
    /// interfaces first and contiguously. Parsing stops at the first row
    /// whose interface is not a VLAN interface; rows after that point are
    /// never inspected. This is not a general-purpose table parser.
    fn parse_interface_summary(&self, output: &str) -> SyncResult<Vec<DeviceVlanState>> {
        let lines: Vec<&str> = output.lines().collect();
        if lines.len() < SUMMARY_HEADER_LINES {
            return Err(SyncError::device_parse(
                &self.name,
                format!(
                    "summary table has {} lines, expected at least {} header lines",
                    lines.len(),
                    SUMMARY_HEADER_LINES
                ),
            ));
        }

        let mut states = Vec::new();
        for line in &lines[SUMMARY_HEADER_LINES..] {
            let is_enabled = line.as_bytes().first() == Some(&UP_MARKER);
            let Some(name) = line
                .get(NAME_COLUMN..)
                .and_then(|rest| rest.split_whitespace().next())
            else {
                break;
            };
            let Some(id_text) = name.strip_prefix(VLAN_PREFIX) else {
                break;
            };
            let vlan_id: VlanId = id_text.parse().map_err(|_| {
                SyncError::device_parse(
                    &self.name,
                    format!("bad VLAN interface name '{}'", name),
                )
            })?;
            states.push(DeviceVlanState {
                vlan_id,
                is_enabled,
            });
        }

        Ok(states)
    }
}

#[async_trait]
impl DeviceAdapter for CatalystAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn open(&self) -> SyncResult<Box<dyn CliSession>> {
        let mut session = self.factory.connect().await?;
        session.enable().await?;
        session.send_command(DISABLE_PAGING).await?;
        Ok(session)
    }

    async fn current_states(
        &self,
        session: &mut dyn CliSession,
    ) -> SyncResult<Vec<DeviceVlanState>> {
        let output = session.send_command(SHOW_INTERFACE_SUMMARY).await?;
        self.parse_interface_summary(&output)
    }

    async fn apply_delete(
        &self,
        session: &mut dyn CliSession,
        vlan_id: VlanId,
    ) -> SyncResult<bool> {
        info!(device = %self.name, %vlan_id, "removing vlan interface");
        session
            .send_config_set(&build_delete_vlan_cmds(vlan_id))
            .await
            .map_err(|e| {
                SyncError::apply(&self.name, format!("delete vlan {}", vlan_id), e.to_string())
            })?;
        Ok(true)
    }

    async fn apply_upsert(
        &self,
        session: &mut dyn CliSession,
        network: &NetworkDefinition,
    ) -> SyncResult<bool> {
        info!(
            device = %self.name,
            vlan_id = %network.vlan_id,
            network = %network.id,
            gateway = %network.gateway_v4,
            "configuring vlan gateway interface"
        );
        session
            .send_config_set(&build_upsert_vlan_cmds(network))
            .await
            .map_err(|e| {
                SyncError::apply(
                    &self.name,
                    format!("upsert vlan {}", network.vlan_id),
                    e.to_string(),
                )
            })?;
        Ok(true)
    }

    async fn close(&self, session: &mut dyn CliSession) -> SyncResult<()> {
        session.close().await
    }
}
