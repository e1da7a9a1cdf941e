//! # statuswatch-engine
//!
//! The reconciliation engine behind the statuswatch toolbar: polls
//! independent state sources on fixed cadences, detects meaningful
//! transitions, keeps an ordered set of status slots consistent with
//! priority order, and fires one-shot notifications on each edge.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                            Engine                              │
//! │                                                                │
//! │  PollLoop ──▶ TransitionDetector ──▶ commands ─┐               │
//! │  PollLoop ──▶ TransitionDetector ──▶ commands ─┤   (mpsc)      │
//! │  PollLoop ──▶ TransitionDetector ──▶ commands ─┤               │
//! │                                                ▼               │
//! │                                      ┌──────────────────┐      │
//! │                                      │ dispatcher task  │      │
//! │                                      │  SlotRegistry ───┼──▶ Toolbar
//! │                                      │  Notifier ───────┼──▶ toasts
//! │                                      └──────────────────┘      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`poll`]**: the per-source scheduler. One outstanding fetch per
//!   loop, rescheduled one interval after the previous invocation ends,
//!   failures isolated per tick.
//! - **[`detect`]**: edge detection. One event per actual change, no
//!   repeats while a value is stable.
//! - **[`slots`]**: the ordered slot registry over an append-only host
//!   toolbar.
//! - **[`notify`]**: the one-shot notification seam.
//! - **[`engine`]**: watchers wiring the above together, plus the
//!   dispatcher task that serializes all registry mutations.
//!
//! Every registry mutation flows through a single dispatcher task, so
//! no second mutation can ever observe a partially re-rendered toolbar.
//!
//! ## Example
//!
//! ```no_run
//! use statuswatch_engine::{Engine, EngineSources};
//! # use statuswatch_engine::StateSource;
//! # use statuswatch_engine::{Notifier, ToastId, ToastUpdate, SlotContent, Toolbar};
//! # struct NullToolbar;
//! # impl Toolbar for NullToolbar {
//! #     fn append(&mut self, _: &str, _: &SlotContent) {}
//! #     fn clear(&mut self) {}
//! # }
//! # struct NullNotifier;
//! # impl Notifier for NullNotifier {
//! #     fn info(&mut self, _: &str) -> ToastId { ToastId(0) }
//! #     fn update(&mut self, _: ToastUpdate) {}
//! # }
//! # struct Pending<T>(std::marker::PhantomData<fn() -> T>);
//! # impl<T> Pending<T> {
//! #     fn new() -> Self { Self(std::marker::PhantomData) }
//! # }
//! # #[async_trait::async_trait]
//! # impl<T: Send + 'static> StateSource for Pending<T> {
//! #     type Value = T;
//! #     async fn fetch(&self) -> anyhow::Result<T> { std::future::pending().await }
//! #     fn description(&self) -> &str { "pending" }
//! # }
//! # async fn run() {
//! let engine = Engine::builder(NullToolbar, NullNotifier)
//!     .stash_enabled(true)
//!     .start(EngineSources {
//!         connection: Pending::<statuswatch_types::ConnectionInfo>::new(),
//!         os: Pending::new(),
//!         stash: Pending::new(),
//!         system_info: Pending::new(),
//!     });
//!
//! // ... later ...
//! engine.shutdown().await;
//! # }
//! ```

pub mod detect;
pub mod engine;
pub mod notify;
pub mod poll;
pub mod slots;
pub mod source;

// Re-export main types for convenience
pub use detect::{Transition, TransitionDetector};
pub use engine::{Engine, EngineBuilder, EngineSources};
pub use notify::{Notifier, ToastId, ToastUpdate};
pub use poll::{PollHandle, PollLoop};
pub use slots::{Slot, SlotContent, SlotRegistry, Toolbar};
pub use source::StateSource;
