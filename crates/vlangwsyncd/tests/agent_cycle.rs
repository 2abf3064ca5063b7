//! End-to-end cycle test: a static catalog, a real Catalyst adapter, and a
//! scripted CLI session. Exercises the full poll → parse → diff → apply
//! path without a network or a device.

use async_trait::async_trait;
use gwsync_types::{Ipv4Net, VlanId};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vlangwsyncd::adapter::DeviceAdapter;
use vlangwsyncd::agent::SyncAgent;
use vlangwsyncd::catalog::CatalogSource;
use vlangwsyncd::catalyst::CatalystAdapter;
use vlangwsyncd::error::SyncResult;
use vlangwsyncd::session::{CliSession, SessionFactory};
use vlangwsyncd::telemetry;
use vlangwsyncd::types::NetworkDefinition;

/// `show interface summary` output with exactly the expected 11 header
/// lines: legend, blank separators, column headings, and the rule line.
const SUMMARY_OUTPUT: &str = "\
 *: interface is up
 IHQ: pkts in input hold queue     IQD: pkts dropped from input queue
 OHQ: pkts in output hold queue    OQD: pkts dropped from output queue
 RXBS: rx rate (bits/sec)          RXPS: rx rate (pkts/sec)
 TXBS: tx rate (bits/sec)          TXPS: tx rate (pkts/sec)
 TRTL: throttle count



  Interface               IHQ       IQD       OHQ       OQD      RXBS
-----------------------------------------------------------------------
* Vlan1                     0         0         0         0         0
* Vlan200                   0         0         0         0         0
  Vlan300                   0         0         0         0         0
* GigabitEthernet1/1        0         0         0         0         0";

struct StaticCatalog {
    networks: Vec<NetworkDefinition>,
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn poll(&self) -> SyncResult<Vec<NetworkDefinition>> {
        Ok(self.networks.clone())
    }
}

#[derive(Clone, Default)]
struct CommandLog(Arc<Mutex<Vec<String>>>);

struct ScriptedSession {
    log: CommandLog,
}

#[async_trait]
impl CliSession for ScriptedSession {
    async fn send_command(&mut self, command: &str) -> SyncResult<String> {
        self.log.0.lock().unwrap().push(command.to_string());
        if command == "show interface summary" {
            Ok(SUMMARY_OUTPUT.to_string())
        } else {
            Ok(String::new())
        }
    }

    async fn send_config_set(&mut self, commands: &[String]) -> SyncResult<String> {
        let mut log = self.log.0.lock().unwrap();
        for command in commands {
            log.push(command.clone());
        }
        Ok(String::new())
    }

    async fn enable(&mut self) -> SyncResult<()> {
        self.log.0.lock().unwrap().push("ENABLE".to_string());
        Ok(())
    }

    async fn close(&mut self) -> SyncResult<()> {
        self.log.0.lock().unwrap().push("CLOSE".to_string());
        Ok(())
    }
}

struct ScriptedFactory {
    log: CommandLog,
}

#[async_trait]
impl SessionFactory for ScriptedFactory {
    async fn connect(&self) -> SyncResult<Box<dyn CliSession>> {
        Ok(Box::new(ScriptedSession {
            log: self.log.clone(),
        }))
    }
}

fn network(id: &str, vlan_id: u16, cidr: &str) -> NetworkDefinition {
    let cidr: Ipv4Net = cidr.parse().unwrap();
    NetworkDefinition::new(id, VlanId::new(vlan_id).unwrap(), cidr, "")
}

#[tokio::test]
async fn full_cycle_converges_device() {
    // Device state (from SUMMARY_OUTPUT): Vlan1 up (reserved), Vlan200 up,
    // Vlan300 down. Desired: 300 and 400. Expected: delete 200, re-apply
    // 300, create 400; Vlan1 untouched.
    let desired = vec![
        network("tenant-a", 300, "10.0.0.0/24"),
        network("tenant-b", 400, "10.0.1.0/24"),
    ];

    let log = CommandLog::default();
    let adapter = CatalystAdapter::with_factory(
        "switch-a",
        Box::new(ScriptedFactory { log: log.clone() }),
    );

    let (telemetry, guard) = telemetry::init(None).unwrap();
    let agent = SyncAgent::new(
        Box::new(StaticCatalog { networks: desired }),
        vec![Box::new(adapter) as Box<dyn DeviceAdapter>],
        Duration::from_secs(1),
        telemetry,
    );

    let stats = agent.run_cycle().await;

    assert_eq!(stats.devices_synced, 1);
    assert_eq!(stats.devices_failed, 0);
    assert_eq!(stats.operations_applied, 3);
    assert_eq!(stats.operations_failed, 0);

    let entries = log.0.lock().unwrap().clone();

    // Session lifecycle: escalate, disable paging, read state, close last.
    assert_eq!(entries[0], "ENABLE");
    assert_eq!(entries[1], "terminal length 0");
    assert_eq!(entries[2], "show interface summary");
    assert_eq!(entries.last().unwrap(), "CLOSE");

    // Deletion precedes the upserts.
    let delete_pos = entries
        .iter()
        .position(|c| c == "no interface vlan 200")
        .expect("vlan 200 must be deleted");
    let upsert_300 = entries
        .iter()
        .position(|c| c == "interface vlan 300")
        .expect("vlan 300 must be re-applied");
    let upsert_400 = entries
        .iter()
        .position(|c| c == "interface vlan 400")
        .expect("vlan 400 must be created");
    assert!(delete_pos < upsert_300);
    assert!(upsert_300 < upsert_400);

    // Gateway assignment derived from the CIDRs.
    assert!(entries.contains(&"ip address 10.0.0.254 255.255.255.0".to_string()));
    assert!(entries.contains(&"ip address 10.0.1.254 255.255.255.0".to_string()));
    assert!(entries.contains(&"description tenant-a".to_string()));
    assert!(entries.contains(&"description tenant-b".to_string()));

    // The reserved VLAN 1 was never targeted.
    assert!(!entries.iter().any(|c| c.contains("vlan 1")));

    guard.shutdown().await;
}

#[tokio::test]
async fn converged_vlan_left_untouched() {
    // Vlan200 is desired and already enabled on the device: no commands
    // for it. Vlan300 is on the device but not desired: deleted.
    let desired = vec![network("tenant-a", 200, "10.0.0.0/24")];

    let log = CommandLog::default();
    let adapter = CatalystAdapter::with_factory(
        "switch-a",
        Box::new(ScriptedFactory { log: log.clone() }),
    );

    let (telemetry, guard) = telemetry::init(None).unwrap();
    let agent = SyncAgent::new(
        Box::new(StaticCatalog { networks: desired }),
        vec![Box::new(adapter) as Box<dyn DeviceAdapter>],
        Duration::from_secs(1),
        telemetry,
    );

    let stats = agent.run_cycle().await;
    assert_eq!(stats.devices_synced, 1);

    let entries = log.0.lock().unwrap().clone();
    assert!(entries.contains(&"no interface vlan 300".to_string()));
    assert!(!entries.iter().any(|c| c.contains("interface vlan 200")));

    guard.shutdown().await;
}
