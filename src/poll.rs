//! Fixed-budget polling used while waiting for volumes and servers to settle.
//!
//! [`wait_for`] is the only waiting primitive in the crate. It repeatedly
//! invokes a status check, sleeping between attempts, and reports one of three
//! outcomes: the predicate held, the budget ran out, or the check itself
//! failed.

use std::ffi::OsString;
use std::future::Future;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use tokio::time::sleep;
use tracing::debug;

/// Default number of status checks before giving up.
pub const DEFAULT_ATTEMPTS: u32 = 10;

/// Default pause between volume status checks.
pub const DEFAULT_VOLUME_INTERVAL: Duration = Duration::from_secs(1);

/// Default pause between server status checks.
pub const DEFAULT_SERVER_INTERVAL: Duration = Duration::from_secs(4);

/// Attempt budget and interval for a single wait.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollPolicy {
    /// Maximum number of times the check is invoked.
    pub attempts: u32,
    /// Pause between two consecutive checks.
    pub interval: Duration,
}

impl PollPolicy {
    /// Creates a policy from an attempt count and interval.
    #[must_use]
    pub const fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    /// Policy used while a volume settles.
    #[must_use]
    pub const fn volume() -> Self {
        Self::new(DEFAULT_ATTEMPTS, DEFAULT_VOLUME_INTERVAL)
    }

    /// Policy used while a server boots.
    #[must_use]
    pub const fn server() -> Self {
        Self::new(DEFAULT_ATTEMPTS, DEFAULT_SERVER_INTERVAL)
    }
}

/// Reasons a wait did not succeed.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum WaitError<E> {
    /// The predicate never held within the attempt budget.
    #[error("condition not met after {attempts} attempts")]
    Exhausted {
        /// Number of checks performed.
        attempts: u32,
    },
    /// The check function itself failed; polling stopped immediately.
    #[error(transparent)]
    Check(E),
}

/// Invokes `check` until it reports `true`, fails, or the budget runs out.
///
/// The check is called at most `policy.attempts` times. No sleep follows the
/// final attempt.
///
/// # Errors
///
/// Returns [`WaitError::Check`] with the first error produced by `check`, or
/// [`WaitError::Exhausted`] once every attempt reported `false`.
pub async fn wait_for<E, F, Fut>(policy: PollPolicy, mut check: F) -> Result<(), WaitError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool, E>>,
{
    for attempt in 1..=policy.attempts {
        if check().await.map_err(WaitError::Check)? {
            debug!(attempt, "wait condition met");
            return Ok(());
        }
        if attempt < policy.attempts {
            sleep(policy.interval).await;
        }
    }

    Err(WaitError::Exhausted {
        attempts: policy.attempts,
    })
}

/// Polling tunables layered from defaults, configuration files, and
/// `SEL_POLL_*` environment variables.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "SEL_POLL",
    discovery(
        app_name = "selectel-machine",
        env_var = "SEL_CONFIG_PATH",
        config_file_name = "selectel-machine.toml",
        dotfile_name = ".selectel-machine.toml",
        project_file_name = "selectel-machine.toml"
    )
)]
pub struct PollConfig {
    /// Number of status checks per wait.
    #[ortho_config(default = 10)]
    pub attempts: u32,
    /// Milliseconds between volume status checks.
    #[ortho_config(default = 1000)]
    pub volume_interval_ms: u64,
    /// Milliseconds between server status checks.
    #[ortho_config(default = 4000)]
    pub server_interval_ms: u64,
}

/// Errors raised while loading polling configuration.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum PollConfigError {
    /// Raised when merging configuration sources fails.
    #[error("poll configuration parsing failed: {0}")]
    Parse(String),
    /// Raised when the attempt budget is zero.
    #[error("poll attempts must be greater than zero")]
    ZeroAttempts,
}

impl PollConfig {
    /// Built-in budget used when no configuration source is consulted.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            volume_interval_ms: 1000,
            server_interval_ms: 4000,
        }
    }

    /// Loads polling configuration without parsing CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns [`PollConfigError::Parse`] when merging sources fails and
    /// [`PollConfigError::ZeroAttempts`] when the budget is zero.
    pub fn load_without_cli_args() -> Result<Self, PollConfigError> {
        let config = Self::load_from_iter([OsString::from("selectel-machine")])
            .map_err(|err| PollConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the attempt budget.
    ///
    /// # Errors
    ///
    /// Returns [`PollConfigError::ZeroAttempts`] when `attempts` is zero.
    pub const fn validate(&self) -> Result<(), PollConfigError> {
        if self.attempts == 0 {
            return Err(PollConfigError::ZeroAttempts);
        }
        Ok(())
    }

    /// Policy for volume waits.
    #[must_use]
    pub const fn volume_policy(&self) -> PollPolicy {
        PollPolicy::new(
            self.attempts,
            Duration::from_millis(self.volume_interval_ms),
        )
    }

    /// Policy for server waits.
    #[must_use]
    pub const fn server_policy(&self) -> PollPolicy {
        PollPolicy::new(
            self.attempts,
            Duration::from_millis(self.server_interval_ms),
        )
    }
}
