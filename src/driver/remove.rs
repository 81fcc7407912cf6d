//! Best-effort teardown of everything a machine owns.

use std::fmt;

use tracing::{error, info, warn};

use super::{Driver, DriverError};
use crate::openstack::{CloudClient, VOLUME_AVAILABLE};

/// Individual teardown steps, in execution order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RemovalStep {
    /// Delete the server.
    DeleteServer,
    /// Wait for the boot volume to detach.
    WaitVolume,
    /// Delete the boot volume.
    DeleteVolume,
    /// Delete the generated flavor.
    DeleteFlavor,
    /// Delete the registered key-pair.
    DeleteKeyPair,
}

impl fmt::Display for RemovalStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::DeleteServer => "delete server",
            Self::WaitVolume => "wait for volume",
            Self::DeleteVolume => "delete volume",
            Self::DeleteFlavor => "delete flavor",
            Self::DeleteKeyPair => "delete key-pair",
        };
        f.write_str(label)
    }
}

/// A step that failed during removal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RemovalFailure {
    /// Step that failed.
    pub step: RemovalStep,
    /// Identifier the step acted on.
    pub target: String,
    /// Rendered error.
    pub message: String,
}

/// Outcome of [`Driver::remove`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RemovalReport {
    /// Steps that ran, successful or not.
    pub attempted: Vec<RemovalStep>,
    /// Steps that failed.
    pub failures: Vec<RemovalFailure>,
}

impl RemovalReport {
    /// Whether every attempted step succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, step: RemovalStep, target: &str, result: Result<(), DriverError>) {
        self.attempted.push(step);
        match result {
            Ok(()) => info!(%step, %target, "removal step finished"),
            Err(err) => {
                error!(%step, %target, error = %err, "removal step failed");
                self.failures.push(RemovalFailure {
                    step,
                    target: target.to_owned(),
                    message: err.to_string(),
                });
            }
        }
    }
}

impl<C: CloudClient> Driver<C> {
    /// Deletes the server, waits for the volume to detach, then deletes the
    /// volume, the generated flavor, and the registered key-pair.
    ///
    /// Every step runs even if an earlier one failed; failures are logged and
    /// collected in the report instead of being returned. Steps whose
    /// identifier was never recorded are skipped. The flavor and key-pair are
    /// deleted only when this machine created them.
    pub async fn remove(&self) -> RemovalReport {
        let mut report = RemovalReport::default();
        let record = &self.record;

        match record.server_id.as_deref() {
            Some(server_id) => {
                info!(%server_id, "deleting server");
                let result = self.client.delete_server(server_id).await;
                report.record(RemovalStep::DeleteServer, server_id, result.map_err(Into::into));
            }
            None => warn!(
                machine = %record.machine_name,
                "no server recorded, skipping server removal"
            ),
        }

        if let Some(volume_id) = record.volume_id.as_deref() {
            let waited = self.wait_for_volume(volume_id, VOLUME_AVAILABLE).await;
            report.record(RemovalStep::WaitVolume, volume_id, waited);

            info!(%volume_id, "deleting volume");
            let result = self.client.delete_volume(volume_id).await;
            report.record(RemovalStep::DeleteVolume, volume_id, result.map_err(Into::into));
        }

        let flavor_id = record.config.flavor_id.as_str();
        if record.flavor_created && !flavor_id.is_empty() {
            info!(%flavor_id, "deleting generated flavor");
            let result = self.client.delete_flavor(flavor_id).await;
            report.record(RemovalStep::DeleteFlavor, flavor_id, result.map_err(Into::into));
        }

        let key_name = record.config.ssh_key_name.as_str();
        if record.key_pair_created && !key_name.is_empty() {
            info!(%key_name, "deleting key-pair");
            let result = self.client.delete_key_pair(key_name).await;
            report.record(RemovalStep::DeleteKeyPair, key_name, result.map_err(Into::into));
        }

        report
    }
}
