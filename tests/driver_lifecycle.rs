//! Power, state, addressing, and removal of an existing machine.

#[path = "common/fixtures.rs"]
mod fixtures;

use camino::Utf8PathBuf;
use rstest::*;
use selectel_machine::test_support::{CloudCall, CloudOperation, ScriptedCloud};
use selectel_machine::{Driver, DriverError, MachineRecord, MachineState, RemovalStep};

use fixtures::{fast_polling, provisioned_record};
use tempfile::TempDir;

#[fixture]
fn cloud() -> ScriptedCloud {
    ScriptedCloud::new()
}

fn driver(record: MachineRecord, cloud: &ScriptedCloud) -> Driver<ScriptedCloud> {
    Driver::new(record, cloud.clone()).with_polling(fast_polling())
}

#[rstest]
#[tokio::test]
async fn power_operations_target_recorded_server(cloud: ScriptedCloud) {
    let machine = driver(provisioned_record(), &cloud);

    machine.start().await.unwrap_or_else(|err| panic!("start: {err}"));
    machine.stop().await.unwrap_or_else(|err| panic!("stop: {err}"));
    machine.restart().await.unwrap_or_else(|err| panic!("restart: {err}"));
    machine.kill().await.unwrap_or_else(|err| panic!("kill: {err}"));

    let calls: Vec<(CloudOperation, String)> = cloud
        .calls()
        .into_iter()
        .map(|CloudCall { operation, target }| (operation, target))
        .collect();
    assert_eq!(
        calls,
        vec![
            (CloudOperation::StartServer, String::from("srv-1")),
            (CloudOperation::StopServer, String::from("srv-1")),
            (CloudOperation::RebootServer, String::from("srv-1")),
            (CloudOperation::StopServer, String::from("srv-1")),
        ]
    );
}

#[rstest]
#[tokio::test]
async fn operations_without_server_fail(cloud: ScriptedCloud) {
    let record = MachineRecord {
        server_id: None,
        ..provisioned_record()
    };
    let machine = driver(record, &cloud);

    let error = machine.start().await.expect_err("no server recorded");
    assert_eq!(
        error,
        DriverError::MissingServer {
            machine_name: String::from("builder"),
        }
    );
    assert!(machine.get_state().await.is_err());
    assert!(cloud.calls().is_empty());
}

#[rstest]
#[case("ACTIVE", MachineState::Running)]
#[case("PAUSED", MachineState::Paused)]
#[case("SUSPENDED", MachineState::Saved)]
#[case("SHUTOFF", MachineState::Stopped)]
#[case("BUILD", MachineState::Starting)]
#[case("ERROR", MachineState::Error)]
#[case("SHELVED_OFFLOADED", MachineState::None)]
#[tokio::test]
async fn state_maps_server_status(
    cloud: ScriptedCloud,
    #[case] status: &str,
    #[case] expected: MachineState,
) {
    cloud.push_server_statuses(&[status]);
    let machine = driver(provisioned_record(), &cloud);

    let state = machine
        .get_state()
        .await
        .unwrap_or_else(|err| panic!("state: {err}"));
    assert_eq!(state, expected);
}

#[rstest]
#[tokio::test]
async fn get_ip_attaches_first_unassigned_address(cloud: ScriptedCloud) {
    cloud.add_floating_ip("203.0.113.1", "ACTIVE");
    cloud.add_floating_ip("203.0.113.2", "DOWN");
    cloud.add_floating_ip("203.0.113.3", "DOWN");
    let mut machine = driver(provisioned_record(), &cloud);

    let address = machine
        .get_ip()
        .await
        .unwrap_or_else(|err| panic!("ip: {err}"));

    assert_eq!(address, "203.0.113.2");
    assert_eq!(machine.record().ip_address.as_deref(), Some("203.0.113.2"));
    assert_eq!(cloud.count(CloudOperation::AttachFloatingIp), 1);
}

#[rstest]
#[tokio::test]
async fn address_already_on_server_is_not_attached_again(cloud: ScriptedCloud) {
    cloud.add_floating_ip("203.0.113.2", "DOWN");
    cloud.add_floating_ip("203.0.113.3", "DOWN");
    let mut first = driver(provisioned_record(), &cloud);
    let mut second = driver(provisioned_record(), &cloud);

    let attached = first
        .get_ip()
        .await
        .unwrap_or_else(|err| panic!("first ip: {err}"));
    let reused = second
        .get_ip()
        .await
        .unwrap_or_else(|err| panic!("second ip: {err}"));

    assert_eq!(attached, "203.0.113.2");
    assert_eq!(reused, attached);
    assert_eq!(second.record().ip_address.as_deref(), Some("203.0.113.2"));
    assert_eq!(cloud.count(CloudOperation::AttachFloatingIp), 1);
    assert_eq!(cloud.count(CloudOperation::ListFloatingIps), 1);
}

#[rstest]
#[tokio::test]
async fn attached_address_survives_record_round_trip(cloud: ScriptedCloud) {
    cloud.add_floating_ip("203.0.113.2", "DOWN");
    let tmp = TempDir::new().unwrap_or_else(|err| panic!("temp dir: {err}"));
    let path = Utf8PathBuf::from_path_buf(tmp.path().join("builder.json"))
        .unwrap_or_else(|non_utf8| panic!("utf8 path: {}", non_utf8.display()));
    let mut machine = driver(provisioned_record(), &cloud);
    machine
        .get_ip()
        .await
        .unwrap_or_else(|err| panic!("ip: {err}"));

    machine
        .record()
        .save(&path)
        .unwrap_or_else(|err| panic!("save: {err}"));
    let reloaded = MachineRecord::load(&path).unwrap_or_else(|err| panic!("load: {err}"));
    let mut again = driver(reloaded, &cloud);
    let url = again
        .get_url()
        .await
        .unwrap_or_else(|err| panic!("url: {err}"));

    assert_eq!(url, "tcp://203.0.113.2:2376");
    assert_eq!(cloud.count(CloudOperation::GetServer), 1);
    assert_eq!(cloud.count(CloudOperation::AttachFloatingIp), 1);
}

#[rstest]
#[tokio::test]
async fn recorded_address_is_reused(cloud: ScriptedCloud) {
    let record = MachineRecord {
        ip_address: Some(String::from("198.51.100.4")),
        ..provisioned_record()
    };
    let mut machine = driver(record, &cloud);

    let hostname = machine
        .get_ssh_hostname()
        .await
        .unwrap_or_else(|err| panic!("hostname: {err}"));
    let url = machine
        .get_url()
        .await
        .unwrap_or_else(|err| panic!("url: {err}"));

    assert_eq!(hostname, "198.51.100.4");
    assert_eq!(url, "tcp://198.51.100.4:2376");
    assert!(cloud.calls().is_empty());
}

#[rstest]
#[tokio::test]
async fn empty_pool_reports_missing_floating_ip(cloud: ScriptedCloud) {
    let mut machine = driver(provisioned_record(), &cloud);

    let error = machine.get_url().await.expect_err("pool is empty");

    assert_eq!(
        error,
        DriverError::NoFreeFloatingIp {
            project_id: String::from("project"),
        }
    );
    assert_eq!(machine.record().ip_address, None);
}

#[rstest]
#[tokio::test]
async fn removal_deletes_server_then_volume(cloud: ScriptedCloud) {
    cloud.push_volume_statuses(&["in-use", "detaching", "available"]);
    let machine = driver(provisioned_record(), &cloud);

    let report = machine.remove().await;

    assert!(report.is_clean(), "failures: {:?}", report.failures);
    assert_eq!(
        report.attempted,
        vec![
            RemovalStep::DeleteServer,
            RemovalStep::WaitVolume,
            RemovalStep::DeleteVolume,
        ]
    );
    assert_eq!(cloud.count(CloudOperation::GetVolume), 3);
    assert_eq!(cloud.count(CloudOperation::DeleteFlavor), 0);
    assert_eq!(cloud.count(CloudOperation::DeleteKeyPair), 0);
}

#[rstest]
#[tokio::test]
async fn removal_continues_past_every_failure(cloud: ScriptedCloud) {
    for operation in [
        CloudOperation::DeleteServer,
        CloudOperation::GetVolume,
        CloudOperation::DeleteVolume,
        CloudOperation::DeleteFlavor,
        CloudOperation::DeleteKeyPair,
    ] {
        cloud.fail(operation);
    }
    let record = MachineRecord {
        flavor_created: true,
        key_pair_created: true,
        ..provisioned_record()
    };
    let machine = driver(record, &cloud);

    let report = machine.remove().await;

    let failed: Vec<RemovalStep> = report.failures.iter().map(|failure| failure.step).collect();
    assert_eq!(
        failed,
        vec![
            RemovalStep::DeleteServer,
            RemovalStep::WaitVolume,
            RemovalStep::DeleteVolume,
            RemovalStep::DeleteFlavor,
            RemovalStep::DeleteKeyPair,
        ]
    );
    assert_eq!(cloud.count(CloudOperation::GetVolume), 1);
    let flavor_calls: Vec<CloudCall> = cloud
        .calls()
        .into_iter()
        .filter(|call| call.operation == CloudOperation::DeleteFlavor)
        .collect();
    assert_eq!(
        flavor_calls,
        vec![CloudCall {
            operation: CloudOperation::DeleteFlavor,
            target: String::from("flv-9"),
        }]
    );
}

#[rstest]
#[tokio::test]
async fn removal_skips_unrecorded_resources(cloud: ScriptedCloud) {
    let record = MachineRecord {
        server_id: None,
        volume_id: None,
        ..provisioned_record()
    };
    let machine = driver(record, &cloud);

    let report = machine.remove().await;

    assert!(report.is_clean());
    assert!(report.attempted.is_empty());
    assert!(cloud.calls().is_empty());
}
