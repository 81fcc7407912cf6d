//! Error types for driver lifecycle operations.

use thiserror::Error;

use crate::config::ConfigError;
use crate::openstack::CloudError;

/// Errors raised by lifecycle operations.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum DriverError {
    /// Raised when configuration is incomplete or inconsistent.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Raised when a cloud API call fails.
    #[error(transparent)]
    Cloud(#[from] CloudError),
    /// Raised when a resource never reaches the awaited status.
    #[error("timed out after {attempts} attempts waiting for {resource} {id} to become {target}")]
    Timeout {
        /// Resource kind (`volume` or `server`).
        resource: &'static str,
        /// Resource identifier.
        id: String,
        /// Awaited status.
        target: String,
        /// Number of status checks performed.
        attempts: u32,
    },
    /// Raised when a volume enters the `error` status.
    #[error("volume {volume_id} entered error status")]
    VolumeFailed {
        /// Volume identifier.
        volume_id: String,
    },
    /// Raised when a server enters the `ERROR` status.
    #[error("server {server_id} entered ERROR status")]
    ServerFailed {
        /// Server identifier.
        server_id: String,
    },
    /// Raised when the project has no unassigned floating IP.
    #[error("no free floating ip in project {project_id}")]
    NoFreeFloatingIp {
        /// Project that was searched.
        project_id: String,
    },
    /// Raised when an operation needs a server that was never created.
    #[error("machine {machine_name} has no server id recorded")]
    MissingServer {
        /// Machine name from the record.
        machine_name: String,
    },
}
