//! # statuswatch-types
//!
//! Core domain types for statuswatch. This crate defines the parsed
//! representations of everything the device hub reports: installed and
//! repository OS versions, connection state, stash readiness, and the
//! free-form system-info map.
//!
//! ## Design Goals
//!
//! - **Parsed, not raw**: version strings from the hub may be
//!   quote-wrapped and are never compared as raw strings. [`DeviceVersion`]
//!   gives them a defined total order.
//! - **Pure evaluation**: [`UpdateState::evaluate`] and
//!   [`Readiness::evaluate`] are side-effect-free functions from observed
//!   state to a decision; the engine decides when a decision is worth
//!   announcing.
//! - **Structural equality**: payload types derive `PartialEq` so that a
//!   change anywhere in a record (for example the address behind a
//!   connection) counts as a change.
//!
//! ## Example
//!
//! ```rust
//! use statuswatch_types::{DeviceVersion, UpdateState, VersionInfo};
//!
//! let info = VersionInfo {
//!     current: DeviceVersion::parse("\"7.2.9\""),
//!     repo: DeviceVersion::parse("7.2.10"),
//!     downloaded: false,
//! };
//!
//! // "10" orders above "9" numerically, not lexicographically.
//! assert_eq!(UpdateState::evaluate(&info), UpdateState::UpdateAvailable);
//! ```

mod status;
mod version;

pub use status::*;
pub use version::*;
