//! Machine lifecycle on top of a [`CloudClient`].
//!
//! A [`Driver`] owns the persisted [`MachineRecord`] of one machine plus a
//! cloud client. Provisioning is split the way the host invokes it:
//! [`MachineRecord::from_flags`] validates configuration,
//! [`Driver::pre_create_check`] resolves names and prepares the key-pair, and
//! [`Driver::create`] builds the volume and the server. Every other
//! operation acts on the identifiers recorded along the way.

mod create;
mod error;
mod floating_ip;
mod keypair;
mod remove;
mod resolve;
mod state;

use std::net::{IpAddr, SocketAddr};

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{ConfigError, DriverConfig, read_record_file, write_record_file};
use crate::openstack::CloudClient;
use crate::poll::PollConfig;

pub use error::DriverError;
pub use remove::{RemovalFailure, RemovalReport, RemovalStep};
pub use state::MachineState;

/// Name the host uses to refer to this driver.
pub const DRIVER_NAME: &str = "selectel";

/// Port the Docker daemon listens on inside the machine.
pub const DOCKER_PORT: u16 = 2376;

/// Everything the host persists between driver invocations.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct MachineRecord {
    /// Host-side machine name.
    pub machine_name: String,
    /// Validated configuration, updated with resolved identifiers.
    pub config: DriverConfig,
    /// Identifier of the booted server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    /// Identifier of the boot volume.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_id: Option<String>,
    /// Floating IP associated with the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Whether the flavor was generated for this machine.
    #[serde(default)]
    pub flavor_created: bool,
    /// Whether the key-pair was registered for this machine.
    #[serde(default)]
    pub key_pair_created: bool,
}

impl MachineRecord {
    /// Builds a record from user configuration, filling derived defaults and
    /// validating the result.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found by [`DriverConfig::validate`].
    pub fn from_flags(machine_name: &str, mut config: DriverConfig) -> Result<Self, ConfigError> {
        config.apply_defaults(machine_name);
        config.validate()?;
        Ok(Self {
            machine_name: machine_name.to_owned(),
            config,
            ..Self::default()
        })
    }

    /// Loads a record previously written by [`MachineRecord::to_json`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Record`] when the file is unreadable or not a
    /// valid record.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        Self::from_json(&read_record_file(path)?)
    }

    /// Parses a record from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Record`] for malformed input.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|err| ConfigError::Record(err.to_string()))
    }

    /// Writes the record as JSON to `path`, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Record`] when serialisation or the write fails.
    pub fn save(&self, path: &Utf8Path) -> Result<(), ConfigError> {
        write_record_file(path, &self.to_json()?)
    }

    /// Renders the record as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Record`] if serialisation fails.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|err| ConfigError::Record(err.to_string()))
    }
}

/// Lifecycle driver for one machine.
#[derive(Debug)]
pub struct Driver<C> {
    record: MachineRecord,
    client: C,
    polling: PollConfig,
}

impl<C: CloudClient> Driver<C> {
    /// Wraps an existing record and client with default polling.
    #[must_use]
    pub fn new(record: MachineRecord, client: C) -> Self {
        Self {
            record,
            client,
            polling: PollConfig::standard(),
        }
    }

    /// Replaces the polling budget used by volume and server waits.
    #[must_use]
    pub fn with_polling(mut self, polling: PollConfig) -> Self {
        self.polling = polling;
        self
    }

    /// Current machine record.
    #[must_use]
    pub const fn record(&self) -> &MachineRecord {
        &self.record
    }

    /// Consumes the driver, returning the record for persistence.
    #[must_use]
    pub fn into_record(self) -> MachineRecord {
        self.record
    }

    /// Cloud client used by this driver.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Returns [`DRIVER_NAME`].
    #[must_use]
    pub const fn driver_name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn server_id(&self) -> Result<&str, DriverError> {
        self.record
            .server_id
            .as_deref()
            .ok_or_else(|| DriverError::MissingServer {
                machine_name: self.record.machine_name.clone(),
            })
    }

    /// Powers the server on.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::MissingServer`] before creation and
    /// [`DriverError::Cloud`] when the compute call fails.
    pub async fn start(&self) -> Result<(), DriverError> {
        let server_id = self.server_id()?;
        info!(%server_id, "starting server");
        self.client.start_server(server_id).await?;
        Ok(())
    }

    /// Shuts the server down.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::MissingServer`] before creation and
    /// [`DriverError::Cloud`] when the compute call fails.
    pub async fn stop(&self) -> Result<(), DriverError> {
        let server_id = self.server_id()?;
        info!(%server_id, "stopping server");
        self.client.stop_server(server_id).await?;
        Ok(())
    }

    /// Soft-reboots the server.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::MissingServer`] before creation and
    /// [`DriverError::Cloud`] when the compute call fails.
    pub async fn restart(&self) -> Result<(), DriverError> {
        let server_id = self.server_id()?;
        info!(%server_id, "restarting server");
        self.client.reboot_server(server_id).await?;
        Ok(())
    }

    /// Same as [`Driver::stop`]; the compute service offers no harder stop.
    ///
    /// # Errors
    ///
    /// See [`Driver::stop`].
    pub async fn kill(&self) -> Result<(), DriverError> {
        self.stop().await
    }

    /// Reads the server status and maps it to a [`MachineState`].
    ///
    /// Unmapped statuses yield [`MachineState::None`] with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::MissingServer`] before creation and
    /// [`DriverError::Cloud`] when the server cannot be fetched.
    pub async fn get_state(&self) -> Result<MachineState, DriverError> {
        let server_id = self.server_id()?;
        let server = self.client.get_server(server_id).await?;
        Ok(MachineState::from_server_status(&server.status).unwrap_or_else(|| {
            warn!(%server_id, status = %server.status, "unrecognised server status");
            MachineState::None
        }))
    }

    /// Returns the machine's floating IP and records it.
    ///
    /// A recorded address is returned as is. Otherwise the server is asked
    /// for an address it already holds, and only a server without one gets
    /// a free address associated.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::MissingServer`] before creation,
    /// [`DriverError::NoFreeFloatingIp`] when the pool is empty, and
    /// [`DriverError::Cloud`] when a lookup or the association fails.
    pub async fn get_ip(&mut self) -> Result<String, DriverError> {
        if let Some(address) = &self.record.ip_address {
            return Ok(address.clone());
        }
        let server_id = self.server_id()?.to_owned();
        let address = match self.client.get_server(&server_id).await?.floating_ip {
            Some(existing) => {
                info!(%server_id, address = %existing, "server already holds a floating ip");
                existing
            }
            None => self.acquire_floating_ip(&server_id).await?,
        };
        self.record.ip_address = Some(address.clone());
        Ok(address)
    }

    /// Host name used for SSH; the floating IP.
    ///
    /// # Errors
    ///
    /// See [`Driver::get_ip`].
    pub async fn get_ssh_hostname(&mut self) -> Result<String, DriverError> {
        self.get_ip().await
    }

    /// Docker daemon URL of the machine.
    ///
    /// # Errors
    ///
    /// See [`Driver::get_ip`].
    pub async fn get_url(&mut self) -> Result<String, DriverError> {
        let address = self.get_ip().await?;
        Ok(docker_url(&address))
    }
}

/// Formats `tcp://<address>:2376`, bracketing IPv6 literals.
#[must_use]
pub fn docker_url(address: &str) -> String {
    address.parse::<IpAddr>().map_or_else(
        |_| format!("tcp://{address}:{DOCKER_PORT}"),
        |ip| format!("tcp://{}", SocketAddr::new(ip, DOCKER_PORT)),
    )
}
