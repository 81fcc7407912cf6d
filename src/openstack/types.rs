//! Resource models exchanged with the OpenStack services.
//!
//! SDK resources are converted into these plain values at the client
//! boundary so the driver and its test doubles never touch SDK types.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::error::CloudError;

/// Volume status reported once a volume can be attached or deleted.
pub const VOLUME_AVAILABLE: &str = "available";

/// Volume status reported when the block storage service gave up.
pub const VOLUME_ERROR: &str = "error";

/// Server status of a booted server.
pub const SERVER_ACTIVE: &str = "ACTIVE";

/// Server status of a server the compute service failed to build.
pub const SERVER_ERROR: &str = "ERROR";

/// Metadata key Selectel reads the initial root password hash from.
pub const PASSWORD_HASH_METADATA_KEY: &str = "x_sel_server_password_hash";

/// Placeholder crypt(3) SHA-512 hash sent with every boot request.
pub const PASSWORD_HASH_PLACEHOLDER: &str = "$6$server_password_hash";

/// Block storage volume.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Volume {
    /// Volume identifier.
    pub id: String,
    /// Lower-case lifecycle status (`creating`, `available`, `in-use`, ...).
    pub status: String,
}

/// Compute server.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct Server {
    /// Server identifier.
    pub id: String,
    /// Upper-case lifecycle status; absent in the boot response.
    #[serde(default)]
    pub status: String,
    /// Floating IP already associated with the server.
    #[serde(skip)]
    pub floating_ip: Option<String>,
}

/// Compute flavor.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct Flavor {
    /// Flavor identifier.
    pub id: String,
    /// Flavor name.
    pub name: String,
}

/// Glance image.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Image {
    /// Image identifier.
    pub id: String,
    /// Image name.
    pub name: String,
}

/// Neutron floating IP.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FloatingIp {
    /// Floating IP identifier.
    pub id: String,
    /// Public address.
    pub floating_ip_address: String,
    /// `DOWN` while unassociated, `ACTIVE` once bound to a port.
    pub status: String,
}

/// Compute key-pair.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KeyPair {
    /// Key-pair name.
    pub name: String,
    /// OpenSSH public key.
    pub public_key: String,
}

/// Parameters for a new boot volume.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VolumeCreate {
    /// Volume name.
    pub name: String,
    /// Size in gigabytes.
    pub size: u32,
    /// Block storage volume type.
    pub volume_type: String,
    /// Image the volume is populated from.
    pub image_id: String,
    /// Availability zone of the volume.
    pub availability_zone: String,
}

/// Parameters for booting a server from an existing volume.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerBoot {
    /// Server name.
    pub name: String,
    /// Flavor identifier.
    pub flavor_id: String,
    /// Availability zone of the server.
    pub availability_zone: String,
    /// Network to attach the server to.
    pub network_id: String,
    /// Boot volume identifier.
    pub volume_id: String,
    /// Key-pair injected for SSH access.
    pub key_name: String,
    /// Server metadata.
    pub metadata: BTreeMap<String, String>,
}

/// Parameters for a new private flavor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FlavorCreate {
    /// Flavor name.
    pub name: String,
    /// Virtual CPU count.
    pub vcpus: u32,
    /// RAM in megabytes.
    pub ram: u32,
}

/// Picks the only element of `matches`, failing on zero or several.
pub(crate) fn single_match<T>(
    matches: impl Iterator<Item = T>,
    resource: &'static str,
    name: &str,
) -> Result<T, CloudError> {
    let mut found: Vec<T> = matches.collect();
    match found.len() {
        0 => Err(CloudError::NotFound {
            resource,
            name: name.to_owned(),
        }),
        1 => found.pop().ok_or_else(|| CloudError::NotFound {
            resource,
            name: name.to_owned(),
        }),
        count => Err(CloudError::Ambiguous {
            resource,
            name: name.to_owned(),
            count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_match_rejects_duplicates() {
        let error = single_match(["a", "a"].into_iter(), "image", "a")
            .expect_err("two matches must fail");
        assert_eq!(
            error,
            CloudError::Ambiguous {
                resource: "image",
                name: String::from("a"),
                count: 2,
            }
        );
    }

    #[test]
    fn single_match_reports_missing_name() {
        let error = single_match(std::iter::empty::<&str>(), "flavor", "SL1.1-1024")
            .expect_err("nothing matches");
        assert!(error.is_not_found());
    }
}
