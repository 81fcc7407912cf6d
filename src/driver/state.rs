//! Machine states reported to the host.

use std::fmt;

/// Lifecycle state of a machine as the host understands it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MachineState {
    /// State is unknown or unmapped.
    None,
    /// Server is running.
    Running,
    /// Server is paused.
    Paused,
    /// Server is suspended to disk.
    Saved,
    /// Server is shut off.
    Stopped,
    /// Server is still building.
    Starting,
    /// Server is in an error state.
    Error,
}

impl MachineState {
    /// Maps a compute server status to a machine state.
    ///
    /// Returns `None` for statuses without a host counterpart.
    #[must_use]
    pub fn from_server_status(status: &str) -> Option<Self> {
        match status {
            "ACTIVE" => Some(Self::Running),
            "PAUSED" => Some(Self::Paused),
            "SUSPENDED" => Some(Self::Saved),
            "SHUTOFF" => Some(Self::Stopped),
            "BUILD" => Some(Self::Starting),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Running => "Running",
            Self::Paused => "Paused",
            Self::Saved => "Saved",
            Self::Stopped => "Stopped",
            Self::Starting => "Starting",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
