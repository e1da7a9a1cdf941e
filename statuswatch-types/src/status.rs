//! Status payload types reported by the device hub.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::version::{DeviceVersion, VersionInfo};

/// Connection state for the monitored device endpoint.
///
/// Equality is structural: two records with the same `connected` flag
/// but different addresses count as a change, so a device swap behind a
/// stable connection still produces a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Whether a device is currently attached.
    #[serde(rename = "connection")]
    pub connected: bool,

    /// Address of the attached device, when the hub reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ConnectionInfo {
    /// A disconnected state with no address.
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            address: None,
        }
    }
}

/// OS identity as reported by the hub's os-info query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsRelease {
    /// OS name, unquoted (e.g. "PinormOS").
    pub name: String,
    /// Installed version, parsed.
    pub version: DeviceVersion,
}

/// Everything the update watcher needs per poll: the OS identity plus
/// the installed/repository version pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsStatus {
    /// OS name, unquoted.
    pub name: String,
    /// Installed and repository versions with download state.
    pub info: VersionInfo,
}

impl OsStatus {
    /// Toolbar text for the OS slot, e.g. "PinormOS 7.2.10".
    pub fn display_text(&self) -> String {
        format!("{} {}", self.name, self.info.current)
    }
}

/// Free-form module-name to value map for the system-info panel.
pub type SystemInfo = BTreeMap<String, String>;
