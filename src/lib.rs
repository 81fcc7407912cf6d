//! Docker Machine driver for Selectel's OpenStack cloud.
//!
//! The crate provisions a single machine as a volume-backed server: it
//! resolves (or creates) a flavor, resolves the image, registers an SSH
//! key-pair, creates a boot volume, boots a server from it, and associates a
//! free floating IP. Removal tears those resources down again on a
//! best-effort basis.
//!
//! [`openstack::CloudClient`] is the seam between the lifecycle logic in
//! [`driver`] and the REST implementation in [`openstack::OpenStackClient`].

pub mod config;
pub mod driver;
pub mod openstack;
pub mod poll;
pub mod test_support;

pub use config::{ConfigError, DEFAULT_IMAGE_NAME, DriverConfig};
pub use driver::{
    DOCKER_PORT, DRIVER_NAME, Driver, DriverError, MachineRecord, MachineState, RemovalFailure,
    RemovalReport, RemovalStep, docker_url,
};
pub use openstack::{AuthOptions, CloudClient, CloudError, Fault, OpenStackClient};
pub use poll::{PollConfig, PollConfigError, PollPolicy, WaitError, wait_for};
