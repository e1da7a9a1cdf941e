//! Version parsing and update-state evaluation.
//!
//! The hub reports versions as strings, sometimes wrapped in an extra
//! layer of double quotes (`"\"7.2.10\""`). Comparing those raw strings
//! breaks as soon as a component reaches two digits ("9" > "10"
//! lexicographically), so versions are parsed into components with a
//! numeric total order before any comparison.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

/// Strip one layer of wrapping double quotes, if present.
///
/// Hub payloads deliver some fields (OS name, version id) with the
/// quotes of the underlying os-release file still attached.
///
/// ```rust
/// use statuswatch_types::unquote;
///
/// assert_eq!(unquote("\"PinormOS\""), "PinormOS");
/// assert_eq!(unquote("7.2.10"), "7.2.10");
/// ```
pub fn unquote(s: &str) -> &str {
    let trimmed = s.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed)
}

/// A parsed version with a defined total order.
///
/// Dot-separated components compare numerically when both sides are
/// numeric, lexicographically otherwise; numeric components order below
/// textual ones. A version that is a strict prefix of another orders
/// below it ("1.2" < "1.2.1").
#[derive(Debug, Clone)]
pub struct DeviceVersion {
    raw: String,
    components: Vec<Component>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Component {
    Number(u64),
    Text(String),
}

impl DeviceVersion {
    /// Parse a version string, stripping one layer of wrapping quotes.
    ///
    /// Parsing never fails: components that are not unsigned integers
    /// are kept as text and compared lexicographically.
    pub fn parse(s: &str) -> Self {
        let raw = unquote(s).to_string();
        let components = raw
            .split('.')
            .map(|part| match part.parse::<u64>() {
                Ok(n) => Component::Number(n),
                Err(_) => Component::Text(part.to_string()),
            })
            .collect();
        Self { raw, components }
    }

    /// The version as it was reported, minus wrapping quotes.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for DeviceVersion {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl Eq for DeviceVersion {}

impl Hash for DeviceVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.components.hash(state);
    }
}

impl PartialOrd for DeviceVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DeviceVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components.cmp(&other.components)
    }
}

impl fmt::Display for DeviceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for DeviceVersion {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl Serialize for DeviceVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for DeviceVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}

/// The version pair the update watcher evaluates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    /// Version currently installed on the device.
    pub current: DeviceVersion,
    /// Latest version available in the package repository.
    pub repo: DeviceVersion,
    /// Whether the repository version has already been downloaded.
    pub downloaded: bool,
}

/// Outcome of comparing the installed version against the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateState {
    /// Repository offers nothing newer than what is installed.
    UpToDate,
    /// A newer version exists but has not been downloaded yet.
    UpdateAvailable,
    /// A newer version exists and is downloaded, ready to install.
    UpdateReady,
}

impl UpdateState {
    /// Evaluate the ternary update decision for a version pair.
    pub fn evaluate(info: &VersionInfo) -> Self {
        if info.repo <= info.current {
            UpdateState::UpToDate
        } else if info.downloaded {
            UpdateState::UpdateReady
        } else {
            UpdateState::UpdateAvailable
        }
    }

    /// Terminal states end their owning watcher's polling.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UpdateState::UpdateReady)
    }
}

/// Whether stash data is ready to be fetched from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Readiness {
    NotReady,
    Ready,
}

impl Readiness {
    /// Evaluate the readiness flag reported by the hub.
    pub fn evaluate(available: bool) -> Self {
        if available {
            Readiness::Ready
        } else {
            Readiness::NotReady
        }
    }

    /// Ready is terminal: once reached, polling stops.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Readiness::Ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"PinormOS\""), "PinormOS");
        assert_eq!(unquote("\"7.2.10\""), "7.2.10");
        assert_eq!(unquote("plain"), "plain");
        assert_eq!(unquote("  \"padded\"  "), "padded");
        // Unbalanced quotes are left alone
        assert_eq!(unquote("\"half"), "\"half");
    }

    #[test]
    fn test_numeric_component_ordering() {
        // The case raw string comparison gets wrong
        assert!(DeviceVersion::parse("10") > DeviceVersion::parse("9"));
        assert!(DeviceVersion::parse("7.2.10") > DeviceVersion::parse("7.2.9"));
        assert!(DeviceVersion::parse("7.10.0") > DeviceVersion::parse("7.9.9"));
        assert!(DeviceVersion::parse("1.2") < DeviceVersion::parse("1.2.1"));
    }

    #[test]
    fn test_quoted_versions_compare_equal() {
        assert_eq!(
            DeviceVersion::parse("\"7.2.10\""),
            DeviceVersion::parse("7.2.10")
        );
    }

    #[test]
    fn test_textual_components_fall_back_to_lexicographic() {
        assert!(DeviceVersion::parse("1.beta") < DeviceVersion::parse("1.rc"));
        // Numeric components order below textual ones
        assert!(DeviceVersion::parse("1.2") < DeviceVersion::parse("1.rc"));
    }

    #[test]
    fn test_display_preserves_unquoted_raw() {
        assert_eq!(DeviceVersion::parse("\"7.2.10\"").to_string(), "7.2.10");
    }

    #[test]
    fn test_version_serde_round_trip() {
        let version: DeviceVersion = serde_json::from_str("\"7.2.10\"").unwrap();
        assert_eq!(version, DeviceVersion::parse("7.2.10"));
        assert_eq!(serde_json::to_string(&version).unwrap(), "\"7.2.10\"");
    }

    fn info(current: &str, repo: &str, downloaded: bool) -> VersionInfo {
        VersionInfo {
            current: DeviceVersion::parse(current),
            repo: DeviceVersion::parse(repo),
            downloaded,
        }
    }

    #[test]
    fn test_update_state_truth_table() {
        assert_eq!(
            UpdateState::evaluate(&info("1", "1", false)),
            UpdateState::UpToDate
        );
        assert_eq!(
            UpdateState::evaluate(&info("1", "2", false)),
            UpdateState::UpdateAvailable
        );
        assert_eq!(
            UpdateState::evaluate(&info("1", "2", true)),
            UpdateState::UpdateReady
        );
        assert_eq!(
            UpdateState::evaluate(&info("2", "1", true)),
            UpdateState::UpToDate
        );
    }

    #[test]
    fn test_update_state_terminality() {
        assert!(UpdateState::UpdateReady.is_terminal());
        assert!(!UpdateState::UpdateAvailable.is_terminal());
        assert!(!UpdateState::UpToDate.is_terminal());
    }

    #[test]
    fn test_readiness() {
        assert_eq!(Readiness::evaluate(true), Readiness::Ready);
        assert_eq!(Readiness::evaluate(false), Readiness::NotReady);
        assert!(Readiness::Ready.is_terminal());
        assert!(!Readiness::NotReady.is_terminal());
    }
}
