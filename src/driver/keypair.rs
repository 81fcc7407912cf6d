//! Ensures the remote key-pair exists before the server boots.

use tracing::{debug, info};

use super::{Driver, DriverError};
use crate::config::read_key_file;
use crate::openstack::CloudClient;

impl<C: CloudClient> Driver<C> {
    /// Registers the local public key unless a key-pair with the configured
    /// name already exists.
    ///
    /// Only a key-pair registered here is deleted again on removal.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Config`] when the public key cannot be read and
    /// [`DriverError::Cloud`] when a compute call fails.
    pub async fn ensure_key_pair(&mut self) -> Result<(), DriverError> {
        let config = &self.record.config;
        if self.client.get_key_pair(&config.ssh_key_name).await?.is_some() {
            debug!(key_name = %config.ssh_key_name, "key-pair already registered");
            return Ok(());
        }

        info!(
            key_name = %config.ssh_key_name,
            path = %config.ssh_public_key_path,
            "registering public key"
        );
        let public_key = read_key_file(&config.ssh_public_key_path)?;
        self.client
            .create_key_pair(&config.ssh_key_name, &public_key)
            .await?;
        self.record.key_pair_created = true;
        Ok(())
    }
}
