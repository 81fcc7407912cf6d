//! Floating IP selection and association.

use tracing::info;

use super::{Driver, DriverError};
use crate::openstack::{CloudClient, FloatingIp};

const UNASSIGNED_STATUS: &str = "DOWN";

impl<C: CloudClient> Driver<C> {
    async fn first_free_floating_ip(&self) -> Result<FloatingIp, DriverError> {
        self.client
            .list_free_floating_ips()
            .await?
            .into_iter()
            .find(|ip| ip.status.eq_ignore_ascii_case(UNASSIGNED_STATUS))
            .ok_or_else(|| DriverError::NoFreeFloatingIp {
                project_id: self.record.config.project_id.clone(),
            })
    }

    /// Fails early when the project has no unassigned floating IP.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::NoFreeFloatingIp`] or [`DriverError::Cloud`].
    pub async fn require_free_floating_ip(&self) -> Result<(), DriverError> {
        let ip = self.first_free_floating_ip().await?;
        info!(address = %ip.floating_ip_address, "free floating ip available");
        Ok(())
    }

    /// Associates the first unassigned floating IP with `server_id` and
    /// returns its address.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::NoFreeFloatingIp`] when the pool is empty and
    /// [`DriverError::Cloud`] when listing or association fails.
    pub async fn acquire_floating_ip(&self, server_id: &str) -> Result<String, DriverError> {
        let ip = self.first_free_floating_ip().await?;
        info!(%server_id, address = %ip.floating_ip_address, "associating floating ip");
        self.client
            .attach_floating_ip(server_id, &ip.floating_ip_address)
            .await?;
        Ok(ip.floating_ip_address)
    }
}
