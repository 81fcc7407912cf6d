//! Turns flavor and image names into identifiers.

use tracing::info;
use uuid::Uuid;

use super::{Driver, DriverError};
use crate::openstack::{CloudClient, FlavorCreate};

const GENERATED_FLAVOR_NAME_LEN: usize = 31;

/// Random flavor name built from the hex digits of a v4 UUID.
pub(crate) fn generated_flavor_name() -> String {
    let mut name = Uuid::new_v4().simple().to_string();
    name.truncate(GENERATED_FLAVOR_NAME_LEN);
    name
}

impl<C: CloudClient> Driver<C> {
    /// Resolves the flavor and image the server boots with.
    ///
    /// A configured flavor id is checked for existence, a flavor name is
    /// looked up, and with neither a private flavor is created from the CPU
    /// and RAM settings. An image name is replaced by its id; a configured
    /// image id is used as is.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Cloud`] when a lookup finds nothing, finds
    /// several matches, or a call fails.
    pub async fn resolve_names_and_ids(&mut self) -> Result<(), DriverError> {
        let config = &mut self.record.config;

        if !config.flavor_id.is_empty() {
            info!(flavor_id = %config.flavor_id, "checking configured flavor");
            self.client.get_flavor(&config.flavor_id).await?;
            config.flavor_name.clear();
        } else if !config.flavor_name.is_empty() {
            info!(flavor_name = %config.flavor_name, "looking up flavor by name");
            let flavor = self.client.find_flavor(&config.flavor_name).await?;
            config.flavor_id = flavor.id;
        } else {
            let request = FlavorCreate {
                name: generated_flavor_name(),
                vcpus: config.cpu,
                ram: config.ram,
            };
            info!(
                name = %request.name,
                vcpus = request.vcpus,
                ram = request.ram,
                "creating flavor"
            );
            let flavor = self.client.create_flavor(&request).await?;
            config.flavor_id = flavor.id;
            config.flavor_name = request.name;
            self.record.flavor_created = true;
        }

        if !config.image_name.is_empty() {
            info!(image_name = %config.image_name, "looking up image by name");
            let image = self.client.find_image(&config.image_name).await?;
            config.image_id = image.id;
        }
        info!(
            flavor_id = %config.flavor_id,
            image_id = %config.image_id,
            "resolved flavor and image"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_name_is_31_hex_digits() {
        let name = generated_flavor_name();
        assert_eq!(name.len(), GENERATED_FLAVOR_NAME_LEN);
        assert!(name.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
