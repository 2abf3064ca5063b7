//! The scheduling loop: poll the catalog, converge each device, wait, repeat.

use crate::adapter::DeviceAdapter;
use crate::catalog::CatalogSource;
use crate::telemetry::TelemetryHandle;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Per-cycle outcome counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Devices whose converge pass completed (possibly with failed ops).
    pub devices_synced: usize,
    /// Devices whose converge pass aborted (session or parse failure).
    pub devices_failed: usize,
    /// Operations accepted across all devices.
    pub operations_applied: usize,
    /// Operations rejected across all devices.
    pub operations_failed: usize,
}

/// Drives the fleet: one catalog source, any number of device adapters.
pub struct SyncAgent {
    catalog: Box<dyn CatalogSource>,
    devices: Vec<Box<dyn DeviceAdapter>>,
    interval: Duration,
    telemetry: TelemetryHandle,
}

impl SyncAgent {
    pub fn new(
        catalog: Box<dyn CatalogSource>,
        devices: Vec<Box<dyn DeviceAdapter>>,
        interval: Duration,
        telemetry: TelemetryHandle,
    ) -> Self {
        Self {
            catalog,
            devices,
            interval,
            telemetry,
        }
    }

    /// Runs sync cycles until `shutdown` is set.
    ///
    /// A failed cycle never terminates the loop, and the wait interval
    /// elapses once per completed cycle.
    pub async fn run(&self, shutdown: Arc<AtomicBool>) {
        info!(
            devices = self.devices.len(),
            interval_secs = self.interval.as_secs(),
            "starting VLAN gateway sync agent"
        );
        while !shutdown.load(Ordering::Relaxed) {
            let stats = self.run_cycle().await;
            info!(
                devices_synced = stats.devices_synced,
                devices_failed = stats.devices_failed,
                operations_applied = stats.operations_applied,
                operations_failed = stats.operations_failed,
                "cycle complete"
            );
            tokio::time::sleep(self.interval).await;
        }
        info!("sync agent stopped");
    }

    /// One full fleet pass: poll the catalog once, then converge each device
    /// in turn. Device failures are isolated; a catalog failure skips the
    /// whole pass (the next cycle is the retry).
    pub async fn run_cycle(&self) -> CycleStats {
        let mut stats = CycleStats::default();

        let desired = match self.catalog.poll().await {
            Ok(networks) => {
                info!(networks = networks.len(), "catalog poll complete");
                networks
            }
            Err(error) => {
                error!(%error, "catalog poll failed, retrying next cycle");
                self.telemetry.report(&error);
                return stats;
            }
        };

        for device in &self.devices {
            info!(device = device.name(), "device sync started");
            match device.sync(&desired).await {
                Ok(report) => {
                    stats.devices_synced += 1;
                    stats.operations_applied += report.applied;
                    stats.operations_failed += report.failed;
                    if report.failed > 0 {
                        warn!(
                            device = device.name(),
                            applied = report.applied,
                            failed = report.failed,
                            "device sync finished with failed operations"
                        );
                    } else {
                        info!(
                            device = device.name(),
                            applied = report.applied,
                            changed = report.changed(),
                            "device sync done"
                        );
                    }
                }
                Err(error) => {
                    stats.devices_failed += 1;
                    error!(device = device.name(), %error, "device sync failed");
                    self.telemetry.report(&error);
                }
            }
        }

        stats
    }
}
