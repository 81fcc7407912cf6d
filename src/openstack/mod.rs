//! OpenStack capability set used by the driver and its SDK implementation.
//!
//! [`CloudClient`] is the narrow seam between the lifecycle logic and the
//! cloud. [`OpenStackClient`] implements it on top of the `openstack` crate,
//! one helper module per service (compute, block storage, network, image).

mod auth;
mod block_storage;
mod client;
mod compute;
mod error;
mod image;
mod network;
mod types;

use std::future::Future;
use std::pin::Pin;

use compute::ServerAction;

pub(crate) use types::single_match;

pub use auth::AuthOptions;
pub use client::OpenStackClient;
pub use error::{CloudError, Fault};
pub use types::{
    FloatingIp, Flavor, FlavorCreate, Image, KeyPair, PASSWORD_HASH_METADATA_KEY,
    PASSWORD_HASH_PLACEHOLDER, SERVER_ACTIVE, SERVER_ERROR, Server, ServerBoot, VOLUME_AVAILABLE,
    VOLUME_ERROR, Volume, VolumeCreate,
};

/// Future returned by cloud operations.
pub type CloudFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CloudError>> + 'a>>;

/// Cloud operations the driver depends on.
pub trait CloudClient {
    /// Creates a block storage volume.
    fn create_volume<'a>(&'a self, request: &'a VolumeCreate) -> CloudFuture<'a, Volume>;

    /// Fetches a volume, including its current status.
    fn get_volume<'a>(&'a self, volume_id: &'a str) -> CloudFuture<'a, Volume>;

    /// Deletes a volume.
    fn delete_volume<'a>(&'a self, volume_id: &'a str) -> CloudFuture<'a, ()>;

    /// Boots a server whose root disk is an existing volume.
    fn boot_from_volume<'a>(&'a self, request: &'a ServerBoot) -> CloudFuture<'a, Server>;

    /// Fetches a server, including its current status.
    fn get_server<'a>(&'a self, server_id: &'a str) -> CloudFuture<'a, Server>;

    /// Deletes a server.
    fn delete_server<'a>(&'a self, server_id: &'a str) -> CloudFuture<'a, ()>;

    /// Powers a stopped server on.
    fn start_server<'a>(&'a self, server_id: &'a str) -> CloudFuture<'a, ()>;

    /// Shuts a server down.
    fn stop_server<'a>(&'a self, server_id: &'a str) -> CloudFuture<'a, ()>;

    /// Soft-reboots a server.
    fn reboot_server<'a>(&'a self, server_id: &'a str) -> CloudFuture<'a, ()>;

    /// Lists unassigned floating IPs of the project.
    fn list_free_floating_ips(&self) -> CloudFuture<'_, Vec<FloatingIp>>;

    /// Associates a floating IP address with a server.
    fn attach_floating_ip<'a>(
        &'a self,
        server_id: &'a str,
        address: &'a str,
    ) -> CloudFuture<'a, ()>;

    /// Fetches a key-pair, or `None` when it does not exist.
    fn get_key_pair<'a>(&'a self, name: &'a str) -> CloudFuture<'a, Option<KeyPair>>;

    /// Registers a public key under `name`.
    fn create_key_pair<'a>(&'a self, name: &'a str, public_key: &'a str) -> CloudFuture<'a, ()>;

    /// Deletes a key-pair.
    fn delete_key_pair<'a>(&'a self, name: &'a str) -> CloudFuture<'a, ()>;

    /// Fetches a flavor by id.
    fn get_flavor<'a>(&'a self, flavor_id: &'a str) -> CloudFuture<'a, Flavor>;

    /// Finds the single flavor carrying `name`.
    fn find_flavor<'a>(&'a self, name: &'a str) -> CloudFuture<'a, Flavor>;

    /// Creates a private flavor.
    fn create_flavor<'a>(&'a self, request: &'a FlavorCreate) -> CloudFuture<'a, Flavor>;

    /// Deletes a flavor.
    fn delete_flavor<'a>(&'a self, flavor_id: &'a str) -> CloudFuture<'a, ()>;

    /// Finds the single image carrying `name`.
    fn find_image<'a>(&'a self, name: &'a str) -> CloudFuture<'a, Image>;
}

impl CloudClient for OpenStackClient {
    fn create_volume<'a>(&'a self, request: &'a VolumeCreate) -> CloudFuture<'a, Volume> {
        Box::pin(self.post_volume(request))
    }

    fn get_volume<'a>(&'a self, volume_id: &'a str) -> CloudFuture<'a, Volume> {
        Box::pin(self.fetch_volume(volume_id))
    }

    fn delete_volume<'a>(&'a self, volume_id: &'a str) -> CloudFuture<'a, ()> {
        Box::pin(self.remove_volume(volume_id))
    }

    fn boot_from_volume<'a>(&'a self, request: &'a ServerBoot) -> CloudFuture<'a, Server> {
        Box::pin(self.boot_server(request))
    }

    fn get_server<'a>(&'a self, server_id: &'a str) -> CloudFuture<'a, Server> {
        Box::pin(self.fetch_server(server_id))
    }

    fn delete_server<'a>(&'a self, server_id: &'a str) -> CloudFuture<'a, ()> {
        Box::pin(self.remove_server(server_id))
    }

    fn start_server<'a>(&'a self, server_id: &'a str) -> CloudFuture<'a, ()> {
        Box::pin(self.server_action(server_id, ServerAction::Start))
    }

    fn stop_server<'a>(&'a self, server_id: &'a str) -> CloudFuture<'a, ()> {
        Box::pin(self.server_action(server_id, ServerAction::Stop))
    }

    fn reboot_server<'a>(&'a self, server_id: &'a str) -> CloudFuture<'a, ()> {
        Box::pin(self.server_action(server_id, ServerAction::SoftReboot))
    }

    fn list_free_floating_ips(&self) -> CloudFuture<'_, Vec<FloatingIp>> {
        Box::pin(self.unassigned_floating_ips())
    }

    fn attach_floating_ip<'a>(
        &'a self,
        server_id: &'a str,
        address: &'a str,
    ) -> CloudFuture<'a, ()> {
        Box::pin(self.add_floating_ip(server_id, address))
    }

    fn get_key_pair<'a>(&'a self, name: &'a str) -> CloudFuture<'a, Option<KeyPair>> {
        Box::pin(self.fetch_key_pair(name))
    }

    fn create_key_pair<'a>(&'a self, name: &'a str, public_key: &'a str) -> CloudFuture<'a, ()> {
        Box::pin(self.post_key_pair(name, public_key))
    }

    fn delete_key_pair<'a>(&'a self, name: &'a str) -> CloudFuture<'a, ()> {
        Box::pin(self.remove_key_pair(name))
    }

    fn get_flavor<'a>(&'a self, flavor_id: &'a str) -> CloudFuture<'a, Flavor> {
        Box::pin(self.fetch_flavor(flavor_id))
    }

    fn find_flavor<'a>(&'a self, name: &'a str) -> CloudFuture<'a, Flavor> {
        Box::pin(self.flavor_by_name(name))
    }

    fn create_flavor<'a>(&'a self, request: &'a FlavorCreate) -> CloudFuture<'a, Flavor> {
        Box::pin(self.post_flavor(request))
    }

    fn delete_flavor<'a>(&'a self, flavor_id: &'a str) -> CloudFuture<'a, ()> {
        Box::pin(self.remove_flavor(flavor_id))
    }

    fn find_image<'a>(&'a self, name: &'a str) -> CloudFuture<'a, Image> {
        Box::pin(self.image_by_name(name))
    }
}
