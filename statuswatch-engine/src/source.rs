//! State source abstraction.
//!
//! A state source answers one question about one concern when asked:
//! is the device connected, what versions are installed and available,
//! is stash data ready. The engine owns the cadence; sources only fetch.

use async_trait::async_trait;

/// A fetchable source of state for one monitored concern.
///
/// Implementations live with their backend (HTTP adapters in
/// `statuswatch-http`, scripted fakes in tests). A fetch either yields
/// the current value or fails; a failure never carries meaning beyond
/// "state unknown this tick".
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use statuswatch_engine::StateSource;
///
/// struct AlwaysConnected;
///
/// #[async_trait]
/// impl StateSource for AlwaysConnected {
///     type Value = bool;
///
///     async fn fetch(&self) -> anyhow::Result<bool> {
///         Ok(true)
///     }
///
///     fn description(&self) -> &str {
///         "always-connected"
///     }
/// }
///
/// let connected = tokio_test::block_on(AlwaysConnected.fetch()).unwrap();
/// assert!(connected);
/// ```
#[async_trait]
pub trait StateSource: Send + Sync + 'static {
    /// The value this source produces per poll.
    type Value: Send + 'static;

    /// Fetch the current value of the concern.
    async fn fetch(&self) -> anyhow::Result<Self::Value>;

    /// A human-readable description of the source, used in log output.
    fn description(&self) -> &str;
}
