//! Command-line interface definitions for the `docker-machine-driver-selectel`
//! binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use camino::Utf8PathBuf;
use clap::{Args, Parser};

/// Top-level CLI: one subcommand per lifecycle operation.
#[derive(Debug, Parser)]
#[command(
    name = "docker-machine-driver-selectel",
    about = "Provision Docker hosts on Selectel's OpenStack cloud",
    version,
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Validate flags, prepare flavor, image, and key-pair, then build the
    /// machine and print its record.
    #[command(name = "create")]
    Create(Box<CreateCommand>),
    /// Delete the server, volume, and any flavor or key-pair this machine
    /// created.
    #[command(name = "remove")]
    Remove(RecordArgs),
    /// Power the server on.
    #[command(name = "start")]
    Start(RecordArgs),
    /// Shut the server down.
    #[command(name = "stop")]
    Stop(RecordArgs),
    /// Soft-reboot the server.
    #[command(name = "restart")]
    Restart(RecordArgs),
    /// Shut the server down; same as stop.
    #[command(name = "kill")]
    Kill(RecordArgs),
    /// Print the machine state.
    #[command(name = "state")]
    State(RecordArgs),
    /// Print the floating IP of the machine.
    #[command(name = "ip")]
    Ip(RecordArgs),
    /// Print the Docker daemon URL.
    #[command(name = "url")]
    Url(RecordArgs),
    /// Print the host name used for SSH.
    #[command(name = "ssh-hostname")]
    SshHostname(RecordArgs),
    /// Print the driver name.
    #[command(name = "driver-name")]
    DriverName,
}

/// Arguments for commands acting on an existing machine.
#[derive(Debug, Args)]
pub(crate) struct RecordArgs {
    /// Machine record written by `create`.
    #[arg(long, value_name = "PATH")]
    pub(crate) record: Utf8PathBuf,
}

/// Arguments for `create`.
#[derive(Debug, Args)]
pub(crate) struct CreateCommand {
    /// Host-side machine name; default for the server name.
    #[arg(long, value_name = "NAME")]
    pub(crate) machine_name: String,
    #[command(flatten)]
    pub(crate) flags: DriverFlags,
}

/// Driver flags, each backed by an environment variable.
#[derive(Debug, Args)]
pub(crate) struct DriverFlags {
    /// Identity service URL.
    #[arg(long = "os-auth-url", env = "OS_AUTH_URL", default_value = "")]
    pub(crate) auth_url: String,
    /// Domain name of the user.
    #[arg(long = "os-domain-name", env = "OS_PROJECT_DOMAIN_NAME", default_value = "")]
    pub(crate) domain_name: String,
    /// Account name.
    #[arg(long = "os-username", env = "OS_USERNAME", default_value = "")]
    pub(crate) username: String,
    /// Account password.
    #[arg(
        long = "os-password",
        env = "OS_PASSWORD",
        default_value = "",
        hide_env_values = true
    )]
    pub(crate) password: String,
    /// Project id.
    #[arg(long = "os-project-id", env = "OS_PROJECT_ID", default_value = "")]
    pub(crate) project_id: String,
    /// Region name used to pick catalog endpoints.
    #[arg(long = "os-region", env = "OS_REGION_NAME", default_value = "")]
    pub(crate) region: String,
    /// Availability zone.
    #[arg(long = "os-availability-zone", env = "OS_AVAILABILITY_ZONE", default_value = "")]
    pub(crate) availability_zone: String,
    /// Flavor id.
    #[arg(long = "os-flavor-id", env = "OS_FLAVOR_ID", default_value = "")]
    pub(crate) flavor_id: String,
    /// Flavor name.
    #[arg(long = "os-flavor-name", env = "OS_FLAVOR_NAME", default_value = "")]
    pub(crate) flavor_name: String,
    /// Image id.
    #[arg(long = "os-image-id", env = "OS_IMAGE_ID", default_value = "")]
    pub(crate) image_id: String,
    /// Image name; "Ubuntu 16.04 LTS 64-bit" when no image id is given.
    #[arg(long = "os-image-name", env = "OS_IMAGE_NAME", default_value = "")]
    pub(crate) image_name: String,
    /// Network id.
    #[arg(long = "os-net-id", env = "OS_NETWORK_ID", default_value = "")]
    pub(crate) network_id: String,
    /// SSH user.
    #[arg(long = "sel-ssh-user", env = "SEL_SSH_USER", default_value = "root")]
    pub(crate) ssh_user: String,
    /// SSH port.
    #[arg(long = "sel-ssh-port", env = "SEL_SSH_PORT", default_value_t = 22)]
    pub(crate) ssh_port: u16,
    /// Name of the remote key-pair.
    #[arg(
        long = "sel-ssh-pair-name",
        env = "SEL_SSH_PAIR_NAME",
        default_value = "docker-machine-key"
    )]
    pub(crate) ssh_key_name: String,
    /// Private key used for SSH; the public key is expected next to it.
    #[arg(
        long = "sel-ssh-private-key-path",
        env = "SEL_SSH_PRIVATE_KEY_PATH",
        default_value = ""
    )]
    pub(crate) ssh_private_key_path: Utf8PathBuf,
    /// Boot volume name.
    #[arg(long = "sel-volume-name", env = "SEL_VOLUME_NAME", default_value = "")]
    pub(crate) volume_name: String,
    /// Boot volume type.
    #[arg(long = "sel-volume-type", env = "SEL_VOLUME_TYPE", default_value = "")]
    pub(crate) volume_type: String,
    /// Boot volume size in GB.
    #[arg(long = "sel-volume-size", env = "SEL_VOLUME_SIZE", default_value_t = 5)]
    pub(crate) volume_size: u32,
    /// Server name.
    #[arg(long = "sel-server-name", env = "SEL_SERVER_NAME", default_value = "")]
    pub(crate) server_name: String,
    /// HTTP proxy for API calls.
    #[arg(long = "sel-proxy", env = "SEL_PROXY")]
    pub(crate) proxy: Option<String>,
    /// vCPU count of a generated flavor.
    #[arg(long = "sel-cpu", env = "SEL_CPU_VALUE", default_value_t = 1)]
    pub(crate) cpu: u32,
    /// RAM in MB of a generated flavor.
    #[arg(long = "sel-ram", env = "SEL_RAM_VALUE", default_value_t = 512)]
    pub(crate) ram: u32,
}
