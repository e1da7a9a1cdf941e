//! The per-source polling scheduler.
//!
//! Each poll loop owns one [`StateSource`] and drives it on a fixed
//! cadence with three guarantees:
//!
//! - **Single-flight**: at most one fetch is outstanding per loop. The
//!   next tick is scheduled one interval after the previous invocation
//!   *ends*, so a slow source can never overlap itself.
//! - **Failure isolation**: a failed or timed-out fetch is logged and
//!   the loop reschedules; one bad tick never stops future polling.
//! - **Cancellation**: stopping the loop (or dropping its handle)
//!   abandons any in-flight fetch at the next suspension point and
//!   discards its result.
//!
//! Every fetch is bounded by a timeout equal to the polling interval,
//! so a stalled source cannot hold the loop's single-flight slot
//! indefinitely.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::source::StateSource;

/// Starts polling tasks. See [`PollLoop::start`].
pub struct PollLoop;

impl PollLoop {
    /// Spawn a polling loop over `source`, invoking `on_value` for each
    /// successful fetch.
    ///
    /// `on_value` returns [`ControlFlow::Break`] to end the loop from
    /// within - the terminal-watcher policy. Errors are not surfaced to
    /// the callback; they are logged and the loop carries on.
    ///
    /// The returned [`PollHandle`] cancels the loop when stopped or
    /// dropped.
    pub fn start<S, F>(source: S, interval: Duration, mut on_value: F) -> PollHandle
    where
        S: StateSource,
        F: FnMut(S::Value) -> ControlFlow<()> + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            loop {
                let fetched = tokio::select! {
                    biased;
                    // A stop during the fetch abandons it; the result
                    // of a cancelled fetch is never delivered.
                    _ = stop_rx.changed() => break,
                    fetched = tokio::time::timeout(interval, source.fetch()) => fetched,
                };

                match fetched {
                    Ok(Ok(value)) => {
                        if on_value(value).is_break() {
                            debug!(
                                source = source.description(),
                                "watcher reached terminal state, stopping"
                            );
                            break;
                        }
                    }
                    Ok(Err(error)) => {
                        warn!(source = source.description(), %error, "poll failed");
                    }
                    Err(_) => {
                        warn!(source = source.description(), "poll timed out");
                    }
                }

                // Interval measured from the end of the invocation, not
                // from wall-clock ticks.
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        });

        PollHandle { stop_tx, task }
    }
}

/// Handle for a running poll loop.
///
/// Stop it explicitly with [`stop`](PollHandle::stop), or drop it to
/// the same effect.
#[derive(Debug)]
pub struct PollHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stop the loop. Any in-flight fetch is abandoned and its result
    /// discarded.
    pub fn stop(self) {
        let _ = self.stop_tx.send(true);
    }

    /// Whether the loop has ended, either by [`stop`](PollHandle::stop)
    /// or by reaching a terminal state.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
