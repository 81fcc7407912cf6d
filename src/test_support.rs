//! Test support utilities shared across unit and integration tests.
//!
//! [`ScriptedCloud`] is an in-memory [`CloudClient`] whose status sequences,
//! inventory, and failures are seeded by the test. Every call is logged so
//! tests can assert on ordering.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::future::ready;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::openstack::{
    CloudClient, CloudError, CloudFuture, Fault, FloatingIp, Flavor, FlavorCreate, Image, KeyPair,
    SERVER_ACTIVE, Server, ServerBoot, VOLUME_AVAILABLE, Volume, VolumeCreate, single_match,
};

/// Cloud operations recorded by [`ScriptedCloud`].
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum CloudOperation {
    /// [`CloudClient::create_volume`].
    CreateVolume,
    /// [`CloudClient::get_volume`].
    GetVolume,
    /// [`CloudClient::delete_volume`].
    DeleteVolume,
    /// [`CloudClient::boot_from_volume`].
    BootFromVolume,
    /// [`CloudClient::get_server`].
    GetServer,
    /// [`CloudClient::delete_server`].
    DeleteServer,
    /// [`CloudClient::start_server`].
    StartServer,
    /// [`CloudClient::stop_server`].
    StopServer,
    /// [`CloudClient::reboot_server`].
    RebootServer,
    /// [`CloudClient::list_free_floating_ips`].
    ListFloatingIps,
    /// [`CloudClient::attach_floating_ip`].
    AttachFloatingIp,
    /// [`CloudClient::get_key_pair`].
    GetKeyPair,
    /// [`CloudClient::create_key_pair`].
    CreateKeyPair,
    /// [`CloudClient::delete_key_pair`].
    DeleteKeyPair,
    /// [`CloudClient::get_flavor`].
    GetFlavor,
    /// [`CloudClient::find_flavor`].
    FindFlavor,
    /// [`CloudClient::create_flavor`].
    CreateFlavor,
    /// [`CloudClient::delete_flavor`].
    DeleteFlavor,
    /// [`CloudClient::find_image`].
    FindImage,
}

/// One logged call: the operation and the identifier or name it targeted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CloudCall {
    /// Operation invoked.
    pub operation: CloudOperation,
    /// Identifier, name, or address passed to the operation.
    pub target: String,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<CloudCall>,
    failures: BTreeSet<CloudOperation>,
    volume_statuses: VecDeque<String>,
    server_statuses: VecDeque<String>,
    floating_ips: Vec<FloatingIp>,
    associations: BTreeMap<String, String>,
    key_pairs: Vec<KeyPair>,
    flavors: Vec<Flavor>,
    images: Vec<Image>,
    volume_requests: Vec<VolumeCreate>,
    boot_requests: Vec<ServerBoot>,
    flavor_requests: Vec<FlavorCreate>,
    next_id: u32,
}

impl State {
    fn log(&mut self, operation: CloudOperation, target: &str) -> Result<(), CloudError> {
        self.calls.push(CloudCall {
            operation,
            target: target.to_owned(),
        });
        if self.failures.contains(&operation) {
            return Err(CloudError::Api {
                fault: Fault::ServerError,
                message: format!("scripted failure of {operation:?}"),
            });
        }
        Ok(())
    }

    fn allocate(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

/// Advances a status script, holding on its final entry.
fn next_status(statuses: &mut VecDeque<String>, fallback: &str) -> String {
    if statuses.len() > 1 {
        statuses.pop_front().unwrap_or_else(|| fallback.to_owned())
    } else {
        statuses
            .front()
            .cloned()
            .unwrap_or_else(|| fallback.to_owned())
    }
}

fn not_found(resource: &str, id: &str) -> CloudError {
    CloudError::Api {
        fault: Fault::NotFound,
        message: format!("{resource} {id} could not be found"),
    }
}

/// Scripted in-memory cloud.
///
/// Volumes report `available` and servers `ACTIVE` unless a status script
/// is pushed. Clones share state.
#[derive(Clone, Debug, Default)]
pub struct ScriptedCloud {
    state: Arc<Mutex<State>>,
}

impl ScriptedCloud {
    /// Creates an empty cloud.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every call of `operation` fail with a server error.
    pub fn fail(&self, operation: CloudOperation) {
        self.state().failures.insert(operation);
    }

    /// Queues volume statuses returned by successive status checks.
    pub fn push_volume_statuses(&self, statuses: &[&str]) {
        self.state()
            .volume_statuses
            .extend(statuses.iter().map(|status| (*status).to_owned()));
    }

    /// Queues server statuses returned by successive status checks.
    pub fn push_server_statuses(&self, statuses: &[&str]) {
        self.state()
            .server_statuses
            .extend(statuses.iter().map(|status| (*status).to_owned()));
    }

    /// Adds a floating IP with the given status to the project.
    pub fn add_floating_ip(&self, address: &str, status: &str) {
        let mut state = self.state();
        let id = state.allocate("fip");
        state.floating_ips.push(FloatingIp {
            id,
            floating_ip_address: address.to_owned(),
            status: status.to_owned(),
        });
    }

    /// Adds an existing flavor.
    pub fn add_flavor(&self, id: &str, name: &str) {
        self.state().flavors.push(Flavor {
            id: id.to_owned(),
            name: name.to_owned(),
        });
    }

    /// Adds an existing image.
    pub fn add_image(&self, id: &str, name: &str) {
        self.state().images.push(Image {
            id: id.to_owned(),
            name: name.to_owned(),
        });
    }

    /// Adds an existing key-pair.
    pub fn add_key_pair(&self, name: &str) {
        self.state().key_pairs.push(KeyPair {
            name: name.to_owned(),
            public_key: String::from("ssh-ed25519 AAAA existing"),
        });
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<CloudCall> {
        self.state().calls.clone()
    }

    /// Operations invoked so far, in order.
    #[must_use]
    pub fn operations(&self) -> Vec<CloudOperation> {
        self.state()
            .calls
            .iter()
            .map(|call| call.operation)
            .collect()
    }

    /// Number of times `operation` was invoked.
    #[must_use]
    pub fn count(&self, operation: CloudOperation) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    /// Volume creation requests received.
    #[must_use]
    pub fn volume_requests(&self) -> Vec<VolumeCreate> {
        self.state().volume_requests.clone()
    }

    /// Boot requests received.
    #[must_use]
    pub fn boot_requests(&self) -> Vec<ServerBoot> {
        self.state().boot_requests.clone()
    }

    /// Flavor creation requests received.
    #[must_use]
    pub fn flavor_requests(&self) -> Vec<FlavorCreate> {
        self.state().flavor_requests.clone()
    }

    /// Key-pairs currently registered.
    #[must_use]
    pub fn key_pairs(&self) -> Vec<KeyPair> {
        self.state().key_pairs.clone()
    }
}

impl CloudClient for ScriptedCloud {
    fn create_volume<'a>(&'a self, request: &'a VolumeCreate) -> CloudFuture<'a, Volume> {
        let mut state = self.state();
        let result = state
            .log(CloudOperation::CreateVolume, &request.name)
            .map(|()| {
                state.volume_requests.push(request.clone());
                Volume {
                    id: state.allocate("vol"),
                    status: String::from("creating"),
                }
            });
        Box::pin(ready(result))
    }

    fn get_volume<'a>(&'a self, volume_id: &'a str) -> CloudFuture<'a, Volume> {
        let mut state = self.state();
        let result = state.log(CloudOperation::GetVolume, volume_id).map(|()| Volume {
            id: volume_id.to_owned(),
            status: next_status(&mut state.volume_statuses, VOLUME_AVAILABLE),
        });
        Box::pin(ready(result))
    }

    fn delete_volume<'a>(&'a self, volume_id: &'a str) -> CloudFuture<'a, ()> {
        Box::pin(ready(self.state().log(CloudOperation::DeleteVolume, volume_id)))
    }

    fn boot_from_volume<'a>(&'a self, request: &'a ServerBoot) -> CloudFuture<'a, Server> {
        let mut state = self.state();
        let result = state
            .log(CloudOperation::BootFromVolume, &request.name)
            .map(|()| {
                state.boot_requests.push(request.clone());
                Server {
                    id: state.allocate("srv"),
                    ..Server::default()
                }
            });
        Box::pin(ready(result))
    }

    fn get_server<'a>(&'a self, server_id: &'a str) -> CloudFuture<'a, Server> {
        let mut state = self.state();
        let result = state.log(CloudOperation::GetServer, server_id).map(|()| Server {
            id: server_id.to_owned(),
            status: next_status(&mut state.server_statuses, SERVER_ACTIVE),
            floating_ip: state.associations.get(server_id).cloned(),
        });
        Box::pin(ready(result))
    }

    fn delete_server<'a>(&'a self, server_id: &'a str) -> CloudFuture<'a, ()> {
        Box::pin(ready(self.state().log(CloudOperation::DeleteServer, server_id)))
    }

    fn start_server<'a>(&'a self, server_id: &'a str) -> CloudFuture<'a, ()> {
        Box::pin(ready(self.state().log(CloudOperation::StartServer, server_id)))
    }

    fn stop_server<'a>(&'a self, server_id: &'a str) -> CloudFuture<'a, ()> {
        Box::pin(ready(self.state().log(CloudOperation::StopServer, server_id)))
    }

    fn reboot_server<'a>(&'a self, server_id: &'a str) -> CloudFuture<'a, ()> {
        Box::pin(ready(self.state().log(CloudOperation::RebootServer, server_id)))
    }

    fn list_free_floating_ips(&self) -> CloudFuture<'_, Vec<FloatingIp>> {
        let mut state = self.state();
        let result = state
            .log(CloudOperation::ListFloatingIps, "")
            .map(|()| state.floating_ips.clone());
        Box::pin(ready(result))
    }

    fn attach_floating_ip<'a>(
        &'a self,
        server_id: &'a str,
        address: &'a str,
    ) -> CloudFuture<'a, ()> {
        let mut state = self.state();
        let result = state
            .log(CloudOperation::AttachFloatingIp, address)
            .map(|()| {
                for ip in &mut state.floating_ips {
                    if ip.floating_ip_address == address {
                        ip.status = String::from("ACTIVE");
                    }
                }
                state
                    .associations
                    .insert(server_id.to_owned(), address.to_owned());
            });
        Box::pin(ready(result))
    }

    fn get_key_pair<'a>(&'a self, name: &'a str) -> CloudFuture<'a, Option<KeyPair>> {
        let mut state = self.state();
        let result = state.log(CloudOperation::GetKeyPair, name).map(|()| {
            state
                .key_pairs
                .iter()
                .find(|pair| pair.name == name)
                .cloned()
        });
        Box::pin(ready(result))
    }

    fn create_key_pair<'a>(&'a self, name: &'a str, public_key: &'a str) -> CloudFuture<'a, ()> {
        let mut state = self.state();
        let result = state.log(CloudOperation::CreateKeyPair, name).map(|()| {
            state.key_pairs.push(KeyPair {
                name: name.to_owned(),
                public_key: public_key.trim().to_owned(),
            });
        });
        Box::pin(ready(result))
    }

    fn delete_key_pair<'a>(&'a self, name: &'a str) -> CloudFuture<'a, ()> {
        let mut state = self.state();
        let result = state.log(CloudOperation::DeleteKeyPair, name).map(|()| {
            state.key_pairs.retain(|pair| pair.name != name);
        });
        Box::pin(ready(result))
    }

    fn get_flavor<'a>(&'a self, flavor_id: &'a str) -> CloudFuture<'a, Flavor> {
        let mut state = self.state();
        let result = state.log(CloudOperation::GetFlavor, flavor_id).and_then(|()| {
            state
                .flavors
                .iter()
                .find(|flavor| flavor.id == flavor_id)
                .cloned()
                .ok_or_else(|| not_found("flavors", flavor_id))
        });
        Box::pin(ready(result))
    }

    fn find_flavor<'a>(&'a self, name: &'a str) -> CloudFuture<'a, Flavor> {
        let mut state = self.state();
        let result = state.log(CloudOperation::FindFlavor, name).and_then(|()| {
            single_match(
                state.flavors.iter().filter(|flavor| flavor.name == name).cloned(),
                "flavor",
                name,
            )
        });
        Box::pin(ready(result))
    }

    fn create_flavor<'a>(&'a self, request: &'a FlavorCreate) -> CloudFuture<'a, Flavor> {
        let mut state = self.state();
        let result = state
            .log(CloudOperation::CreateFlavor, &request.name)
            .map(|()| {
                state.flavor_requests.push(request.clone());
                let flavor = Flavor {
                    id: state.allocate("flv"),
                    name: request.name.clone(),
                };
                state.flavors.push(flavor.clone());
                flavor
            });
        Box::pin(ready(result))
    }

    fn delete_flavor<'a>(&'a self, flavor_id: &'a str) -> CloudFuture<'a, ()> {
        let mut state = self.state();
        let result = state.log(CloudOperation::DeleteFlavor, flavor_id).map(|()| {
            state.flavors.retain(|flavor| flavor.id != flavor_id);
        });
        Box::pin(ready(result))
    }

    fn find_image<'a>(&'a self, name: &'a str) -> CloudFuture<'a, Image> {
        let mut state = self.state();
        let result = state.log(CloudOperation::FindImage, name).and_then(|()| {
            single_match(
                state.images.iter().filter(|image| image.name == name).cloned(),
                "image",
                name,
            )
        });
        Box::pin(ready(result))
    }
}
