//! Compute (Nova) calls: servers, flavors, key-pairs, and floating IP
//! association.
//!
//! Servers, flavor lookups, and key-pairs go through the SDK. Booting from a
//! block device mapping, creating or deleting private flavors, and the
//! `addFloatingIp` action are not modelled by the SDK and are sent as raw
//! requests on its session.

use std::collections::BTreeMap;

use openstack::compute::RebootType;
use osauth::services::COMPUTE;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::client::OpenStackClient;
use super::error::{CloudError, absent_as_none};
use super::types::{Flavor, FlavorCreate, KeyPair, Server, ServerBoot, single_match};

#[derive(Serialize)]
struct BootRequest<'a> {
    server: BootServer<'a>,
}

#[derive(Serialize)]
struct BootServer<'a> {
    name: &'a str,
    #[serde(rename = "flavorRef")]
    flavor_ref: &'a str,
    availability_zone: &'a str,
    networks: [NetworkRef<'a>; 1],
    key_name: &'a str,
    metadata: &'a BTreeMap<String, String>,
    block_device_mapping_v2: [BlockDevice<'a>; 1],
}

#[derive(Serialize)]
struct NetworkRef<'a> {
    uuid: &'a str,
}

#[derive(Serialize)]
struct BlockDevice<'a> {
    boot_index: u32,
    uuid: &'a str,
    source_type: &'static str,
    destination_type: &'static str,
    delete_on_termination: bool,
}

impl<'a> BootRequest<'a> {
    fn from_boot(boot: &'a ServerBoot) -> Self {
        Self {
            server: BootServer {
                name: &boot.name,
                flavor_ref: &boot.flavor_id,
                availability_zone: &boot.availability_zone,
                networks: [NetworkRef {
                    uuid: &boot.network_id,
                }],
                key_name: &boot.key_name,
                metadata: &boot.metadata,
                block_device_mapping_v2: [BlockDevice {
                    boot_index: 0,
                    uuid: &boot.volume_id,
                    source_type: "volume",
                    destination_type: "volume",
                    delete_on_termination: false,
                }],
            },
        }
    }
}

#[derive(Deserialize)]
struct ServerEnvelope {
    server: Server,
}

#[derive(Serialize)]
struct FlavorRequest<'a> {
    flavor: FlavorBody<'a>,
}

#[derive(Serialize)]
struct FlavorBody<'a> {
    name: &'a str,
    vcpus: u32,
    ram: u32,
    disk: u32,
    #[serde(rename = "os-flavor-access:is_public")]
    is_public: bool,
}

impl<'a> FlavorRequest<'a> {
    fn private(flavor: &'a FlavorCreate) -> Self {
        Self {
            flavor: FlavorBody {
                name: &flavor.name,
                vcpus: flavor.vcpus,
                ram: flavor.ram,
                disk: 0,
                is_public: false,
            },
        }
    }
}

#[derive(Deserialize)]
struct FlavorEnvelope {
    flavor: Flavor,
}

/// Power actions issued through the SDK's server handle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ServerAction {
    Start,
    Stop,
    SoftReboot,
}

impl OpenStackClient {
    pub(crate) async fn boot_server(&self, boot: &ServerBoot) -> Result<Server, CloudError> {
        let envelope: ServerEnvelope = self
            .session
            .post(COMPUTE, ["os-volumes_boot"])
            .json(&BootRequest::from_boot(boot))
            .fetch()
            .await?;
        Ok(envelope.server)
    }

    pub(crate) async fn fetch_server(&self, server_id: &str) -> Result<Server, CloudError> {
        let server = self.cloud.get_server(server_id).await?;
        Ok(Server {
            id: server.id().to_owned(),
            status: server.status().to_string(),
            floating_ip: server.floating_ip().map(|address| address.to_string()),
        })
    }

    pub(crate) async fn remove_server(&self, server_id: &str) -> Result<(), CloudError> {
        let server = self.cloud.get_server(server_id).await?;
        Ok(server.delete().await.map(drop)?)
    }

    pub(crate) async fn server_action(
        &self,
        server_id: &str,
        action: ServerAction,
    ) -> Result<(), CloudError> {
        let mut server = self.cloud.get_server(server_id).await?;
        let outcome = match action {
            ServerAction::Start => server.start().await.map(drop),
            ServerAction::Stop => server.stop().await.map(drop),
            ServerAction::SoftReboot => server.reboot(RebootType::Soft).await.map(drop),
        };
        Ok(outcome?)
    }

    pub(crate) async fn add_floating_ip(
        &self,
        server_id: &str,
        address: &str,
    ) -> Result<(), CloudError> {
        let payload = json!({ "addFloatingIp": { "address": address } });
        let response = self
            .session
            .post(COMPUTE, ["servers", server_id, "action"])
            .json(&payload)
            .send()
            .await;
        Ok(response.map(drop)?)
    }

    pub(crate) async fn fetch_flavor(&self, flavor_id: &str) -> Result<Flavor, CloudError> {
        let flavor = self.cloud.get_flavor(flavor_id).await?;
        Ok(Flavor {
            id: flavor.id().to_owned(),
            name: flavor.name().to_owned(),
        })
    }

    pub(crate) async fn flavor_by_name(&self, name: &str) -> Result<Flavor, CloudError> {
        let summaries = self.cloud.find_flavors().all().await?;
        let flavors = summaries.iter().map(|summary| Flavor {
            id: summary.id().to_owned(),
            name: summary.name().to_owned(),
        });
        single_match(flavors.filter(|flavor| flavor.name == name), "flavor", name)
    }

    pub(crate) async fn post_flavor(&self, flavor: &FlavorCreate) -> Result<Flavor, CloudError> {
        let envelope: FlavorEnvelope = self
            .session
            .post(COMPUTE, ["flavors"])
            .json(&FlavorRequest::private(flavor))
            .fetch()
            .await?;
        Ok(envelope.flavor)
    }

    pub(crate) async fn remove_flavor(&self, flavor_id: &str) -> Result<(), CloudError> {
        let response = self.session.delete(COMPUTE, ["flavors", flavor_id]).send().await;
        Ok(response.map(drop)?)
    }

    /// Returns `None` when the compute service reports no such key-pair.
    pub(crate) async fn fetch_key_pair(&self, name: &str) -> Result<Option<KeyPair>, CloudError> {
        let found = absent_as_none(self.cloud.get_keypair(name).await)?;
        Ok(found.map(|pair| KeyPair {
            name: pair.name().to_owned(),
            public_key: pair.public_key().to_owned(),
        }))
    }

    pub(crate) async fn post_key_pair(
        &self,
        name: &str,
        public_key: &str,
    ) -> Result<(), CloudError> {
        let created = self
            .cloud
            .new_keypair(name)
            .with_public_key(public_key.trim())
            .create()
            .await;
        Ok(created.map(drop)?)
    }

    pub(crate) async fn remove_key_pair(&self, name: &str) -> Result<(), CloudError> {
        let pair = self.cloud.get_keypair(name).await?;
        Ok(pair.delete().await.map(drop)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openstack::types::{PASSWORD_HASH_METADATA_KEY, PASSWORD_HASH_PLACEHOLDER};

    #[test]
    fn boot_request_maps_volume_as_boot_device() {
        let boot = ServerBoot {
            name: String::from("builder"),
            flavor_id: String::from("flv-1"),
            availability_zone: String::from("ru-1a"),
            network_id: String::from("net-1"),
            volume_id: String::from("vol-1"),
            key_name: String::from("docker-machine-key"),
            metadata: BTreeMap::from([(
                PASSWORD_HASH_METADATA_KEY.to_owned(),
                PASSWORD_HASH_PLACEHOLDER.to_owned(),
            )]),
        };
        let json = serde_json::to_value(BootRequest::from_boot(&boot))
            .unwrap_or_else(|err| panic!("serialise: {err}"));
        let server = &json["server"];
        assert_eq!(server["flavorRef"], "flv-1");
        assert_eq!(server["networks"][0]["uuid"], "net-1");
        assert_eq!(server["key_name"], "docker-machine-key");
        assert_eq!(
            server["metadata"]["x_sel_server_password_hash"],
            "$6$server_password_hash"
        );
        let device = &server["block_device_mapping_v2"][0];
        assert_eq!(device["boot_index"], 0);
        assert_eq!(device["uuid"], "vol-1");
        assert_eq!(device["source_type"], "volume");
        assert_eq!(device["destination_type"], "volume");
    }

    #[test]
    fn flavor_request_is_private_without_disk() {
        let create = FlavorCreate {
            name: String::from("generated"),
            vcpus: 2,
            ram: 2048,
        };
        let json = serde_json::to_value(FlavorRequest::private(&create))
            .unwrap_or_else(|err| panic!("serialise: {err}"));
        assert_eq!(json["flavor"]["os-flavor-access:is_public"], false);
        assert_eq!(json["flavor"]["disk"], 0);
        assert_eq!(json["flavor"]["ram"], 2048);
    }

    #[test]
    fn boot_response_carries_only_the_id() {
        let body = r#"{"server":{"id":"srv-1","links":[],"adminPass":"x"}}"#;
        let envelope: ServerEnvelope =
            serde_json::from_str(body).unwrap_or_else(|err| panic!("decode: {err}"));
        assert_eq!(envelope.server.id, "srv-1");
        assert!(envelope.server.status.is_empty());
        assert_eq!(envelope.server.floating_ip, None);
    }
}
