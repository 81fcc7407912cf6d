//! Pre-create checks and the volume-then-server provisioning sequence.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::{Driver, DriverError};
use crate::openstack::{
    CloudClient, PASSWORD_HASH_METADATA_KEY, PASSWORD_HASH_PLACEHOLDER, SERVER_ACTIVE,
    SERVER_ERROR, ServerBoot, VOLUME_AVAILABLE, VOLUME_ERROR, VolumeCreate,
};
use crate::poll::{WaitError, wait_for};

impl<C: CloudClient> Driver<C> {
    /// Runs the checks the host performs before `create`.
    ///
    /// Requires a free floating IP, resolves flavor and image, and makes sure
    /// the key-pair exists.
    ///
    /// # Errors
    ///
    /// Propagates the first failure of the three steps.
    pub async fn pre_create_check(&mut self) -> Result<(), DriverError> {
        self.require_free_floating_ip().await?;
        self.resolve_names_and_ids().await?;
        self.ensure_key_pair().await
    }

    /// Creates the boot volume, waits for it, boots the server from it, and
    /// waits for the server to become active.
    ///
    /// Identifiers are recorded as soon as each resource exists. Nothing is
    /// rolled back on failure; the host calls `remove` to clean up.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Cloud`] for failed calls,
    /// [`DriverError::VolumeFailed`] or [`DriverError::ServerFailed`] when a
    /// resource enters an error status, and [`DriverError::Timeout`] when the
    /// polling budget runs out.
    pub async fn create(&mut self) -> Result<(), DriverError> {
        let request = self.volume_request();
        info!(
            name = %request.name,
            size = request.size,
            volume_type = %request.volume_type,
            "creating volume"
        );
        let volume = self.client.create_volume(&request).await?;
        self.record.volume_id = Some(volume.id.clone());

        self.wait_for_volume(&volume.id, VOLUME_AVAILABLE).await?;

        let boot = self.boot_request(&volume.id);
        info!(
            name = %boot.name,
            flavor_id = %boot.flavor_id,
            volume_id = %volume.id,
            "booting server"
        );
        let server = self.client.boot_from_volume(&boot).await?;
        self.record.server_id = Some(server.id.clone());

        self.wait_for_server_active(&server.id).await?;
        info!(server_id = %server.id, "server is active");
        Ok(())
    }

    fn volume_request(&self) -> VolumeCreate {
        let config = &self.record.config;
        VolumeCreate {
            name: config.volume_name.clone(),
            size: config.volume_size,
            volume_type: config.volume_type.clone(),
            image_id: config.image_id.clone(),
            availability_zone: config.availability_zone.clone(),
        }
    }

    fn boot_request(&self, volume_id: &str) -> ServerBoot {
        let config = &self.record.config;
        ServerBoot {
            name: config.server_name.clone(),
            flavor_id: config.flavor_id.clone(),
            availability_zone: config.availability_zone.clone(),
            network_id: config.network_id.clone(),
            volume_id: volume_id.to_owned(),
            key_name: config.ssh_key_name.clone(),
            metadata: BTreeMap::from([(
                PASSWORD_HASH_METADATA_KEY.to_owned(),
                PASSWORD_HASH_PLACEHOLDER.to_owned(),
            )]),
        }
    }

    async fn volume_reached(&self, volume_id: &str, target: &str) -> Result<bool, DriverError> {
        let volume = self.client.get_volume(volume_id).await?;
        debug!(%volume_id, status = %volume.status, "volume status");
        if volume.status.eq_ignore_ascii_case(target) {
            return Ok(true);
        }
        if volume.status.eq_ignore_ascii_case(VOLUME_ERROR) {
            return Err(DriverError::VolumeFailed {
                volume_id: volume_id.to_owned(),
            });
        }
        Ok(false)
    }

    /// Polls the volume until it reports `target`.
    pub(crate) async fn wait_for_volume(
        &self,
        volume_id: &str,
        target: &str,
    ) -> Result<(), DriverError> {
        info!(%volume_id, %target, "waiting for volume");
        wait_for(self.polling.volume_policy(), move || {
            self.volume_reached(volume_id, target)
        })
        .await
        .map_err(|err| match err {
            WaitError::Check(source) => source,
            WaitError::Exhausted { attempts } => DriverError::Timeout {
                resource: "volume",
                id: volume_id.to_owned(),
                target: target.to_owned(),
                attempts,
            },
        })
    }

    async fn server_active(&self, server_id: &str) -> Result<bool, DriverError> {
        let server = self.client.get_server(server_id).await?;
        debug!(%server_id, status = %server.status, "server status");
        if server.status == SERVER_ACTIVE {
            return Ok(true);
        }
        if server.status == SERVER_ERROR {
            return Err(DriverError::ServerFailed {
                server_id: server_id.to_owned(),
            });
        }
        Ok(false)
    }

    async fn wait_for_server_active(&self, server_id: &str) -> Result<(), DriverError> {
        info!(%server_id, "waiting for server to become active");
        wait_for(self.polling.server_policy(), move || {
            self.server_active(server_id)
        })
        .await
        .map_err(|err| match err {
            WaitError::Check(source) => source,
            WaitError::Exhausted { attempts } => DriverError::Timeout {
                resource: "server",
                id: server_id.to_owned(),
                target: SERVER_ACTIVE.to_owned(),
                attempts,
            },
        })
    }
}
