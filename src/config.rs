//! Driver configuration, derived defaults, and validation.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::openstack::AuthOptions;

/// Image used when neither an image name nor an image id is configured.
pub const DEFAULT_IMAGE_NAME: &str = "Ubuntu 16.04 LTS 64-bit";

/// User-facing configuration of a single machine.
///
/// Values come from CLI flags or their environment variables. Identifiers
/// discovered during provisioning (for example the resolved flavor id) are
/// written back into the same record.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct DriverConfig {
    /// Identity service endpoint (`OS_AUTH_URL`).
    pub auth_url: String,
    /// Domain of the authenticating user (`OS_PROJECT_DOMAIN_NAME`).
    pub domain_name: String,
    /// Account name (`OS_USERNAME`).
    pub username: String,
    /// Account password (`OS_PASSWORD`).
    pub password: String,
    /// Project the resources are created in (`OS_PROJECT_ID`).
    pub project_id: String,
    /// Service catalog region; empty accepts any region.
    pub region: String,
    /// Availability zone for the volume and the server.
    pub availability_zone: String,
    /// Flavor identifier; mutually exclusive with `flavor_name`.
    pub flavor_id: String,
    /// Flavor name; mutually exclusive with `flavor_id`.
    pub flavor_name: String,
    /// Image identifier; mutually exclusive with `image_name`.
    pub image_id: String,
    /// Image name; mutually exclusive with `image_id`.
    pub image_name: String,
    /// Network the server is attached to.
    pub network_id: String,
    /// SSH login user.
    pub ssh_user: String,
    /// SSH port.
    pub ssh_port: u16,
    /// Name of the remote key-pair injected into the server.
    pub ssh_key_name: String,
    /// Local private key used by the host for SSH.
    pub ssh_private_key_path: Utf8PathBuf,
    /// Local public key registered when the key-pair is missing.
    pub ssh_public_key_path: Utf8PathBuf,
    /// Name of the boot volume.
    pub volume_name: String,
    /// Block storage volume type.
    pub volume_type: String,
    /// Boot volume size in gigabytes.
    pub volume_size: u32,
    /// Server name.
    pub server_name: String,
    /// Optional HTTP proxy for every API call.
    pub proxy: Option<String>,
    /// vCPU count for a generated flavor.
    pub cpu: u32,
    /// RAM in megabytes for a generated flavor.
    pub ram: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            auth_url: String::new(),
            domain_name: String::new(),
            username: String::new(),
            password: String::new(),
            project_id: String::new(),
            region: String::new(),
            availability_zone: String::new(),
            flavor_id: String::new(),
            flavor_name: String::new(),
            image_id: String::new(),
            image_name: String::new(),
            network_id: String::new(),
            ssh_user: String::from("root"),
            ssh_port: 22,
            ssh_key_name: String::from("docker-machine-key"),
            ssh_private_key_path: Utf8PathBuf::new(),
            ssh_public_key_path: Utf8PathBuf::new(),
            volume_name: String::new(),
            volume_type: String::new(),
            volume_size: 5,
            server_name: String::new(),
            proxy: None,
            cpu: 1,
            ram: 512,
        }
    }
}

/// Describes where a configuration value comes from, for error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: Option<&'static str>,
    flag: &'static str,
}

impl FieldMetadata {
    const fn env_or_flag(
        description: &'static str,
        env_var: &'static str,
        flag: &'static str,
    ) -> Self {
        Self {
            description,
            env_var: Some(env_var),
            flag,
        }
    }

    const fn flag_only(description: &'static str, flag: &'static str) -> Self {
        Self {
            description,
            env_var: None,
            flag,
        }
    }

    fn missing(&self) -> ConfigError {
        let message = match self.env_var {
            Some(env_var) => format!(
                "{} must be specified either using the environment variable {} or the CLI option {}",
                self.description, env_var, self.flag
            ),
            None => format!(
                "{} must be specified using the CLI option {}",
                self.description, self.flag
            ),
        };
        ConfigError::MissingField(message)
    }
}

impl DriverConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(metadata.missing());
        }
        Ok(())
    }

    fn require_exclusive(
        first: &str,
        second: &str,
        names: (&'static str, &'static str),
    ) -> Result<(), ConfigError> {
        if !first.trim().is_empty() && !second.trim().is_empty() {
            return Err(ConfigError::Exclusive {
                first: names.0,
                second: names.1,
            });
        }
        Ok(())
    }

    /// Fills derived defaults that depend on other fields.
    ///
    /// The server name falls back to the machine name, the volume name and
    /// type derive from the server name and availability zone, the public key
    /// sits next to the private key, and the default image applies only when
    /// no image id was given. Flavor and image selectors are trimmed first so
    /// blank values count as unset.
    pub fn apply_defaults(&mut self, machine_name: &str) {
        for selector in [
            &mut self.flavor_name,
            &mut self.flavor_id,
            &mut self.image_name,
            &mut self.image_id,
        ] {
            let trimmed = selector.trim();
            if trimmed.len() != selector.len() {
                *selector = trimmed.to_owned();
            }
        }
        if self.server_name.is_empty() {
            self.server_name = machine_name.to_owned();
        }
        if self.volume_name.is_empty() {
            self.volume_name = format!("volume for {}", self.server_name);
        }
        if self.volume_type.is_empty() {
            self.volume_type = format!("fast.{}", self.availability_zone);
        }
        if self.image_name.is_empty() && self.image_id.is_empty() {
            DEFAULT_IMAGE_NAME.clone_into(&mut self.image_name);
        }
        if self.ssh_public_key_path.as_str().is_empty()
            && !self.ssh_private_key_path.as_str().is_empty()
        {
            self.ssh_public_key_path =
                Utf8PathBuf::from(format!("{}.pub", self.ssh_private_key_path));
        }
        if self
            .proxy
            .as_deref()
            .is_some_and(|proxy| proxy.trim().is_empty())
        {
            self.proxy = None;
        }
    }

    /// Checks required fields, exclusive pairs, and the private key file.
    ///
    /// Runs before any remote call.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] naming the environment variable
    /// and CLI flag of the first missing value, [`ConfigError::Exclusive`]
    /// when both halves of a name/id pair are set, and
    /// [`ConfigError::KeyFile`] when the private key does not exist.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.auth_url,
            &FieldMetadata::env_or_flag("Authentication URL", "OS_AUTH_URL", "--os-auth-url"),
        )?;
        Self::require_field(
            &self.domain_name,
            &FieldMetadata::env_or_flag(
                "Domain name",
                "OS_PROJECT_DOMAIN_NAME",
                "--os-domain-name",
            ),
        )?;
        Self::require_field(
            &self.username,
            &FieldMetadata::env_or_flag("Username", "OS_USERNAME", "--os-username"),
        )?;
        Self::require_field(
            &self.password,
            &FieldMetadata::env_or_flag("Password", "OS_PASSWORD", "--os-password"),
        )?;
        Self::require_field(
            &self.project_id,
            &FieldMetadata::env_or_flag("Project id", "OS_PROJECT_ID", "--os-project-id"),
        )?;
        Self::require_field(
            &self.availability_zone,
            &FieldMetadata::env_or_flag(
                "Availability Zone",
                "OS_AVAILABILITY_ZONE",
                "--os-availability-zone",
            ),
        )?;

        Self::require_exclusive(&self.flavor_name, &self.flavor_id, ("Flavor name", "Flavor id"))?;

        if self.image_name.trim().is_empty() && self.image_id.trim().is_empty() {
            return Err(FieldMetadata::flag_only(
                "Image name or Image id",
                "--os-image-name or --os-image-id",
            )
            .missing());
        }
        Self::require_exclusive(&self.image_name, &self.image_id, ("Image name", "Image id"))?;

        Self::require_field(
            &self.network_id,
            &FieldMetadata::flag_only("Network id", "--os-net-id"),
        )?;

        if !key_file_exists(&self.ssh_private_key_path) {
            return Err(ConfigError::KeyFile(
                FieldMetadata::env_or_flag(
                    "KeyPairPath",
                    "SEL_SSH_PRIVATE_KEY_PATH",
                    "--sel-ssh-private-key-path",
                )
                .missing()
                .to_string(),
            ));
        }
        Ok(())
    }

    /// Credentials and endpoint selection for the cloud client.
    #[must_use]
    pub fn auth_options(&self) -> AuthOptions {
        AuthOptions {
            auth_url: self.auth_url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            domain_name: self.domain_name.clone(),
            project_id: self.project_id.clone(),
            region: self.region.clone(),
            proxy: self.proxy.clone(),
        }
    }
}

/// Splits a path into the directory to open and the file name inside it.
fn split_path(path: &Utf8Path) -> Option<(&Utf8Path, &str)> {
    let parent = path.parent()?;
    let file_name = path.file_name()?;
    if parent.as_str().is_empty() {
        Some((Utf8Path::new("."), file_name))
    } else {
        Some((parent, file_name))
    }
}

fn key_file_exists(path: &Utf8Path) -> bool {
    split_path(path).is_some_and(|(parent, file_name)| {
        Dir::open_ambient_dir(parent, ambient_authority())
            .and_then(|dir| dir.metadata(file_name))
            .is_ok_and(|metadata| metadata.is_file())
    })
}

/// Reads a UTF-8 file through a capability handle on its parent directory.
fn read_ambient(path: &Utf8Path) -> std::io::Result<String> {
    let (parent, file_name) = split_path(path).ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")
    })?;
    Dir::open_ambient_dir(parent, ambient_authority())?.read_to_string(file_name)
}

/// Reads a local key file into a string.
///
/// # Errors
///
/// Returns [`ConfigError::KeyFile`] when the file cannot be opened or read.
pub fn read_key_file(path: &Utf8Path) -> Result<String, ConfigError> {
    read_ambient(path).map_err(|err| ConfigError::KeyFile(format!("failed to read {path}: {err}")))
}

/// Reads a persisted machine record as text.
///
/// # Errors
///
/// Returns [`ConfigError::Record`] when the file cannot be opened or read.
pub fn read_record_file(path: &Utf8Path) -> Result<String, ConfigError> {
    read_ambient(path).map_err(|err| ConfigError::Record(format!("failed to read {path}: {err}")))
}

/// Replaces a persisted machine record.
///
/// # Errors
///
/// Returns [`ConfigError::Record`] when the parent directory cannot be opened
/// or the file cannot be written.
pub fn write_record_file(path: &Utf8Path, contents: &str) -> Result<(), ConfigError> {
    let (parent, file_name) = split_path(path)
        .ok_or_else(|| ConfigError::Record(format!("{path} does not name a file")))?;
    Dir::open_ambient_dir(parent, ambient_authority())
        .and_then(|dir| dir.write(file_name, contents))
        .map_err(|err| ConfigError::Record(format!("failed to write {path}: {err}")))
}

/// Errors raised during configuration validation.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// A required value is empty.
    #[error("{0}")]
    MissingField(String),
    /// Both halves of a name/id pair were supplied.
    #[error("Either {first} or {second} must be specified, not both")]
    Exclusive {
        /// First option of the pair.
        first: &'static str,
        /// Second option of the pair.
        second: &'static str,
    },
    /// A key file is missing or unreadable.
    #[error("{0}")]
    KeyFile(String),
    /// A machine record is unreadable or malformed.
    #[error("machine record: {0}")]
    Record(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_defaults_derives_names_from_machine() {
        let mut config = DriverConfig {
            availability_zone: String::from("ru-1a"),
            ssh_private_key_path: Utf8PathBuf::from("/keys/id_rsa"),
            ..DriverConfig::default()
        };
        config.apply_defaults("builder");

        assert_eq!(config.server_name, "builder");
        assert_eq!(config.volume_name, "volume for builder");
        assert_eq!(config.volume_type, "fast.ru-1a");
        assert_eq!(config.image_name, DEFAULT_IMAGE_NAME);
        assert_eq!(config.ssh_public_key_path, Utf8PathBuf::from("/keys/id_rsa.pub"));
    }

    #[test]
    fn apply_defaults_keeps_image_id_alone() {
        let mut config = DriverConfig {
            image_id: String::from("img-1"),
            ..DriverConfig::default()
        };
        config.apply_defaults("builder");
        assert!(config.image_name.is_empty());
    }

    #[test]
    fn apply_defaults_keeps_explicit_values() {
        let mut config = DriverConfig {
            server_name: String::from("web"),
            volume_name: String::from("root disk"),
            volume_type: String::from("universal.ru-1a"),
            ..DriverConfig::default()
        };
        config.apply_defaults("builder");
        assert_eq!(config.server_name, "web");
        assert_eq!(config.volume_name, "root disk");
        assert_eq!(config.volume_type, "universal.ru-1a");
    }

    #[test]
    fn exclusive_error_renders_both_names() {
        let error = ConfigError::Exclusive {
            first: "Image name",
            second: "Image id",
        };
        assert_eq!(
            error.to_string(),
            "Either Image name or Image id must be specified, not both"
        );
    }
}
