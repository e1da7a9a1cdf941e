//! The reconciliation engine: watchers, dispatcher, and lifecycle.
//!
//! An [`Engine`] is an explicit instance owning everything it spawns:
//! one poll loop per concern, each with its own transition detector,
//! and a single dispatcher task owning the slot registry and the
//! notifier. Watchers translate transitions into commands; the
//! dispatcher applies them one at a time, so registry mutations from
//! concurrently completing polls are serialized by construction.
//!
//! Instances never share state: two engines (for example under test)
//! cannot interfere.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use statuswatch_types::{ConnectionInfo, OsStatus, Readiness, SystemInfo, UpdateState};

use crate::detect::TransitionDetector;
use crate::notify::{Notifier, ToastUpdate};
use crate::poll::{PollHandle, PollLoop};
use crate::slots::{Slot, SlotContent, SlotRegistry, Toolbar};
use crate::source::StateSource;

/// Fallback slot shown while no device is connected.
pub const CONNECTION_INFO_SLOT: &str = "connection-info";
/// Slot shown while a device is connected.
pub const ANDROID_SLOT: &str = "android-connection";
/// Slot carrying the OS name and installed version.
pub const OS_INFO_SLOT: &str = "os-info";

const OS_INFO_PRIORITY: i32 = 20;
const CONNECTION_PRIORITY: i32 = 10;

const CONNECTED_MESSAGE: &str = "Android device connected";
const DISCONNECTED_MESSAGE: &str = "Android device disconnected";
const NO_CONNECTION_TEXT: &str = "no device connected";
const STASH_READY_MESSAGE: &str = "Stash data ready to fetch";

/// Commands applied by the dispatcher task, in arrival order.
enum EngineCommand {
    Upsert(Slot),
    Remove(&'static str),
    Notify(String),
}

/// The state sources the engine polls, one per concern.
///
/// The stash source is always supplied but only polled when the
/// capability probe reported the feature online (see
/// [`EngineBuilder::stash_enabled`]).
pub struct EngineSources<C, O, S, Y> {
    pub connection: C,
    pub os: O,
    pub stash: S,
    pub system_info: Y,
}

/// Builder for an [`Engine`].
///
/// # Example
///
/// ```no_run
/// # use statuswatch_engine::{Engine, SlotContent, Toolbar, Notifier, ToastId, ToastUpdate};
/// # struct T; impl Toolbar for T {
/// #     fn append(&mut self, _: &str, _: &SlotContent) {}
/// #     fn clear(&mut self) {}
/// # }
/// # struct N; impl Notifier for N {
/// #     fn info(&mut self, _: &str) -> ToastId { ToastId(0) }
/// #     fn update(&mut self, _: ToastUpdate) {}
/// # }
/// use std::time::Duration;
///
/// let builder = Engine::builder(T, N)
///     .connection_interval(Duration::from_millis(500))
///     .auto_close(Duration::from_secs(3))
///     .stash_enabled(false);
/// ```
pub struct EngineBuilder<B, N> {
    toolbar: B,
    notifier: N,
    connection_interval: Duration,
    update_interval: Duration,
    stash_interval: Duration,
    system_info_interval: Duration,
    auto_close: Duration,
    stash_enabled: bool,
}

impl<B, N> EngineBuilder<B, N>
where
    B: Toolbar + 'static,
    N: Notifier + 'static,
{
    fn new(toolbar: B, notifier: N) -> Self {
        Self {
            toolbar,
            notifier,
            connection_interval: Duration::from_millis(500),
            update_interval: Duration::from_secs(2),
            stash_interval: Duration::from_secs(2),
            system_info_interval: Duration::from_secs(5),
            auto_close: Duration::from_secs(5),
            stash_enabled: true,
        }
    }

    /// Polling interval for the device connection (default 500 ms).
    pub fn connection_interval(mut self, interval: Duration) -> Self {
        self.connection_interval = interval;
        self
    }

    /// Polling interval for OS/update state (default 2 s).
    pub fn update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    /// Polling interval for stash readiness (default 2 s).
    pub fn stash_interval(mut self, interval: Duration) -> Self {
        self.stash_interval = interval;
        self
    }

    /// Polling interval for the system-info panel (default 5 s).
    pub fn system_info_interval(mut self, interval: Duration) -> Self {
        self.system_info_interval = interval;
        self
    }

    /// Toast auto-close duration (default 5 s).
    pub fn auto_close(mut self, auto_close: Duration) -> Self {
        self.auto_close = auto_close;
        self
    }

    /// Whether the stash watcher runs at all.
    ///
    /// The caller probes the hub's capabilities once; when the stash
    /// feature is offline, the watcher never starts.
    pub fn stash_enabled(mut self, enabled: bool) -> Self {
        self.stash_enabled = enabled;
        self
    }

    /// Spawn the dispatcher and watchers, returning the running engine.
    pub fn start<C, O, S, Y>(self, sources: EngineSources<C, O, S, Y>) -> Engine
    where
        C: StateSource<Value = ConnectionInfo>,
        O: StateSource<Value = OsStatus>,
        S: StateSource<Value = bool>,
        Y: StateSource<Value = SystemInfo>,
    {
        let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<EngineCommand>();
        let (system_info_tx, system_info_rx) = watch::channel(SystemInfo::new());

        // Dispatcher: exclusive owner of the registry and notifier.
        // Runs until every watcher (and with it every sender) is gone,
        // then tears the toolbar down - no slot outlives the engine.
        let mut registry = SlotRegistry::new(self.toolbar);
        let mut notifier = self.notifier;
        let auto_close = self.auto_close;
        let dispatcher = tokio::spawn(async move {
            registry.upsert(fallback_slot());
            while let Some(command) = cmd_rx.recv().await {
                match command {
                    EngineCommand::Upsert(slot) => registry.upsert(slot),
                    EngineCommand::Remove(name) => registry.remove(name),
                    EngineCommand::Notify(message) => {
                        info!(%message, "status notification");
                        let id = notifier.info(&message);
                        notifier.update(ToastUpdate {
                            toast_id: id,
                            message,
                            auto_close,
                        });
                    }
                }
            }
            registry.clear_all();
            debug!("dispatcher stopped");
        });

        let mut watchers = Vec::new();

        // Connection watcher: edge-triggered on the structural
        // connection record. The initial disconnected observation is
        // silent - the fallback slot is already the steady state.
        let tx = cmd_tx.clone();
        let mut connection_detector = TransitionDetector::new();
        watchers.push(PollLoop::start(
            sources.connection,
            self.connection_interval,
            move |connection: ConnectionInfo| {
                if let Some(transition) = connection_detector.observe(connection) {
                    debug!(
                        connected = transition.current.connected,
                        "device connection changed"
                    );
                    if transition.current.connected {
                        let _ = tx.send(EngineCommand::Notify(CONNECTED_MESSAGE.to_string()));
                        let _ = tx.send(EngineCommand::Remove(CONNECTION_INFO_SLOT));
                        let _ = tx.send(EngineCommand::Upsert(Slot::new(
                            ANDROID_SLOT,
                            CONNECTION_PRIORITY,
                            SlotContent::new(CONNECTED_MESSAGE),
                        )));
                    } else if !transition.is_initial() {
                        let _ = tx.send(EngineCommand::Notify(DISCONNECTED_MESSAGE.to_string()));
                        let _ = tx.send(EngineCommand::Remove(ANDROID_SLOT));
                        let _ = tx.send(EngineCommand::Upsert(fallback_slot()));
                    }
                }
                ControlFlow::Continue(())
            },
        ));

        // Update watcher: detector runs over the evaluated UpdateState,
        // not the raw version pair, so a stable state never re-notifies.
        // Terminal once the update is downloaded and ready.
        let tx = cmd_tx.clone();
        let mut version_detector = TransitionDetector::new();
        let mut update_detector = TransitionDetector::new();
        watchers.push(PollLoop::start(
            sources.os,
            self.update_interval,
            move |status: OsStatus| {
                if version_detector.observe(status.info.current.clone()).is_some() {
                    let _ = tx.send(EngineCommand::Upsert(Slot::new(
                        OS_INFO_SLOT,
                        OS_INFO_PRIORITY,
                        SlotContent::new(status.display_text()),
                    )));
                }
                let state = UpdateState::evaluate(&status.info);
                if let Some(transition) = update_detector.observe(state) {
                    match transition.current {
                        UpdateState::UpdateAvailable => {
                            let _ = tx.send(EngineCommand::Notify(format!(
                                "{} version {} available",
                                status.name, status.info.repo
                            )));
                        }
                        UpdateState::UpdateReady => {
                            let _ = tx.send(EngineCommand::Notify(format!(
                                "{} update {} downloaded and ready to install",
                                status.name, status.info.repo
                            )));
                        }
                        UpdateState::UpToDate => {}
                    }
                }
                if state.is_terminal() {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            },
        ));

        // Stash watcher: only when the capability probe said the
        // feature is online. Terminal once the data is ready.
        if self.stash_enabled {
            let tx = cmd_tx.clone();
            let mut stash_detector = TransitionDetector::new();
            watchers.push(PollLoop::start(
                sources.stash,
                self.stash_interval,
                move |available: bool| {
                    let readiness = Readiness::evaluate(available);
                    if let Some(transition) = stash_detector.observe(readiness) {
                        if transition.current == Readiness::Ready {
                            let _ = tx
                                .send(EngineCommand::Notify(STASH_READY_MESSAGE.to_string()));
                        }
                    }
                    if readiness.is_terminal() {
                        ControlFlow::Break(())
                    } else {
                        ControlFlow::Continue(())
                    }
                },
            ));
        }

        // System-info watcher: publishes the latest free-form map for
        // the host's inspect command. No registry involvement.
        let mut system_info_detector = TransitionDetector::new();
        watchers.push(PollLoop::start(
            sources.system_info,
            self.system_info_interval,
            move |system_info: SystemInfo| {
                if system_info_detector.observe(system_info.clone()).is_some() {
                    let _ = system_info_tx.send(system_info);
                }
                ControlFlow::Continue(())
            },
        ));

        Engine {
            dispatcher,
            watchers,
            system_info_rx,
        }
    }
}

fn fallback_slot() -> Slot {
    Slot::new(
        CONNECTION_INFO_SLOT,
        CONNECTION_PRIORITY,
        SlotContent::muted(NO_CONNECTION_TEXT),
    )
}

/// A running reconciliation engine.
///
/// Constructed per activation via [`Engine::builder`], torn down
/// explicitly with [`shutdown`](Engine::shutdown).
pub struct Engine {
    dispatcher: JoinHandle<()>,
    watchers: Vec<PollHandle>,
    system_info_rx: watch::Receiver<SystemInfo>,
}

impl Engine {
    /// Start configuring an engine over the given host collaborators.
    pub fn builder<B, N>(toolbar: B, notifier: N) -> EngineBuilder<B, N>
    where
        B: Toolbar + 'static,
        N: Notifier + 'static,
    {
        EngineBuilder::new(toolbar, notifier)
    }

    /// The latest system-info map, updated whenever the polled map
    /// changes.
    pub fn system_info(&self) -> watch::Receiver<SystemInfo> {
        self.system_info_rx.clone()
    }

    /// Stop every watcher, drain pending commands, and detach all
    /// slots. In-flight fetches are abandoned and their results
    /// discarded.
    pub async fn shutdown(self) {
        for watcher in self.watchers {
            watcher.stop();
        }
        // The dispatcher exits once every watcher's sender is dropped,
        // clearing the toolbar on the way out.
        let _ = self.dispatcher.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use statuswatch_types::{DeviceVersion, VersionInfo};

    use crate::ToastId;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    // -- doubles ---------------------------------------------------------

    #[derive(Default)]
    struct ToolbarState {
        attached: Vec<(String, SlotContent)>,
        history: Vec<Vec<String>>,
    }

    /// Toolbar double; clones share state so tests can inspect it
    /// after the engine takes ownership.
    #[derive(Clone, Default)]
    struct SharedToolbar(Arc<Mutex<ToolbarState>>);

    impl SharedToolbar {
        fn names(&self) -> Vec<String> {
            self.0.lock().unwrap().attached.iter().map(|(n, _)| n.clone()).collect()
        }

        fn content_of(&self, name: &str) -> Option<SlotContent> {
            self.0
                .lock()
                .unwrap()
                .attached
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, c)| c.clone())
        }

        fn history(&self) -> Vec<Vec<String>> {
            self.0.lock().unwrap().history.clone()
        }
    }

    impl Toolbar for SharedToolbar {
        fn append(&mut self, name: &str, content: &SlotContent) {
            self.0.lock().unwrap().attached.push((name.to_string(), content.clone()));
        }

        fn clear(&mut self) {
            self.0.lock().unwrap().attached.clear();
        }

        fn rendered(&mut self) {
            let mut state = self.0.lock().unwrap();
            let names = state.attached.iter().map(|(n, _)| n.clone()).collect();
            state.history.push(names);
        }
    }

    #[derive(Default)]
    struct NotifierState {
        messages: Vec<String>,
        updates: Vec<ToastUpdate>,
    }

    #[derive(Clone, Default)]
    struct SharedNotifier(Arc<Mutex<NotifierState>>);

    impl SharedNotifier {
        fn messages(&self) -> Vec<String> {
            self.0.lock().unwrap().messages.clone()
        }

        fn updates(&self) -> Vec<ToastUpdate> {
            self.0.lock().unwrap().updates.clone()
        }
    }

    impl Notifier for SharedNotifier {
        fn info(&mut self, message: &str) -> ToastId {
            let mut state = self.0.lock().unwrap();
            state.messages.push(message.to_string());
            ToastId(state.messages.len() as u64)
        }

        fn update(&mut self, update: ToastUpdate) {
            self.0.lock().unwrap().updates.push(update);
        }
    }

    /// Source replaying a script; `None` entries fail, an exhausted
    /// script repeats its last successful value.
    struct Script<T> {
        values: Mutex<VecDeque<Option<T>>>,
        last: Mutex<Option<T>>,
        fetches: Arc<AtomicUsize>,
    }

    impl<T> Script<T> {
        fn new(values: impl IntoIterator<Item = Option<T>>) -> (Self, Arc<AtomicUsize>) {
            let fetches = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    values: Mutex::new(values.into_iter().collect()),
                    last: Mutex::new(None),
                    fetches: fetches.clone(),
                },
                fetches,
            )
        }
    }

    #[async_trait]
    impl<T: Clone + Send + Sync + 'static> StateSource for Script<T> {
        type Value = T;

        async fn fetch(&self) -> anyhow::Result<T> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let next = self.values.lock().unwrap().pop_front();
            match next {
                Some(Some(value)) => {
                    *self.last.lock().unwrap() = Some(value.clone());
                    Ok(value)
                }
                Some(None) => Err(anyhow::anyhow!("scripted failure")),
                None => self
                    .last
                    .lock()
                    .unwrap()
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("script exhausted")),
            }
        }

        fn description(&self) -> &str {
            "script"
        }
    }

    // -- fixtures --------------------------------------------------------

    fn connected(flag: bool) -> Option<ConnectionInfo> {
        Some(ConnectionInfo {
            connected: flag,
            address: flag.then(|| "10.0.0.5:5555".to_string()),
        })
    }

    fn os(current: &str, repo: &str, downloaded: bool) -> Option<OsStatus> {
        Some(OsStatus {
            name: "PinormOS".to_string(),
            info: VersionInfo {
                current: DeviceVersion::parse(current),
                repo: DeviceVersion::parse(repo),
                downloaded,
            },
        })
    }

    fn quiet_os() -> Script<OsStatus> {
        Script::new([os("7.2.9", "7.2.9", false)]).0
    }

    fn quiet_stash() -> Script<bool> {
        Script::new([Some(false)]).0
    }

    fn quiet_system_info() -> Script<SystemInfo> {
        Script::new([Some(SystemInfo::new())]).0
    }

    fn builder(
        toolbar: &SharedToolbar,
        notifier: &SharedNotifier,
    ) -> EngineBuilder<SharedToolbar, SharedNotifier> {
        Engine::builder(toolbar.clone(), notifier.clone())
            .connection_interval(ms(500))
            .update_interval(ms(500))
            .stash_interval(ms(500))
            .system_info_interval(ms(500))
    }

    // -- tests -----------------------------------------------------------

    #[tokio::test(start_paused = true)]
    async fn test_connection_sequence_end_to_end() {
        let toolbar = SharedToolbar::default();
        let notifier = SharedNotifier::default();

        let (connection, _) = Script::new([
            connected(false),
            connected(false),
            connected(true),
            connected(true),
            connected(false),
        ]);
        let engine = builder(&toolbar, &notifier).start(EngineSources {
            connection,
            os: quiet_os(),
            stash: quiet_stash(),
            system_info: quiet_system_info(),
        });

        // Five connection polls land at 0, 500, ..., 2000
        tokio::time::sleep(ms(2300)).await;

        // Exactly two one-shot notifications, one per edge
        assert_eq!(
            notifier.messages(),
            vec![CONNECTED_MESSAGE, DISCONNECTED_MESSAGE]
        );

        // The android slot appeared in exactly one render and is gone
        // again; the muted fallback is back in its place.
        let history = toolbar.history();
        let with_android = history
            .iter()
            .filter(|names| names.iter().any(|n| n == ANDROID_SLOT))
            .count();
        assert_eq!(with_android, 1);
        assert_eq!(
            toolbar.names(),
            vec![OS_INFO_SLOT.to_string(), CONNECTION_INFO_SLOT.to_string()]
        );
        assert!(toolbar.content_of(CONNECTION_INFO_SLOT).unwrap().muted);

        // Shutdown detaches everything
        engine.shutdown().await;
        assert!(toolbar.names().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_poll_is_isolated() {
        let toolbar = SharedToolbar::default();
        let notifier = SharedNotifier::default();

        // Poll 3 fails; the remaining polls still drive the detector
        let (connection, _) = Script::new([
            connected(false),
            connected(false),
            None,
            connected(true),
            connected(false),
        ]);
        let engine = builder(&toolbar, &notifier).start(EngineSources {
            connection,
            os: quiet_os(),
            stash: quiet_stash(),
            system_info: quiet_system_info(),
        });

        tokio::time::sleep(ms(2300)).await;
        engine.shutdown().await;

        // No notification for the failed tick, both edges still seen
        assert_eq!(
            notifier.messages(),
            vec![CONNECTED_MESSAGE, DISCONNECTED_MESSAGE]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_notifies_once_per_state_and_terminates() {
        let toolbar = SharedToolbar::default();
        let notifier = SharedNotifier::default();

        let (os_source, fetches) = Script::new([
            os("7.2.9", "7.2.9", false),
            os("7.2.9", "7.2.10", false),
            os("7.2.9", "7.2.10", false),
            os("7.2.9", "7.2.10", true),
        ]);
        let engine = builder(&toolbar, &notifier).start(EngineSources {
            connection: Script::new([connected(false)]).0,
            os: os_source,
            stash: quiet_stash(),
            system_info: quiet_system_info(),
        });

        tokio::time::sleep(ms(5000)).await;

        // One toast per state transition, none for the repeated poll
        assert_eq!(
            notifier.messages(),
            vec![
                "PinormOS version 7.2.10 available",
                "PinormOS update 7.2.10 downloaded and ready to install",
            ]
        );

        // UpdateReady is terminal: polling stopped at the fourth fetch
        assert_eq!(fetches.load(Ordering::SeqCst), 4);

        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_os_slot_tracks_installed_version() {
        let toolbar = SharedToolbar::default();
        let notifier = SharedNotifier::default();

        let (os_source, _) = Script::new([
            os("7.2.9", "7.2.9", false),
            os("7.2.10", "7.2.10", false),
        ]);
        let engine = builder(&toolbar, &notifier).start(EngineSources {
            connection: Script::new([connected(false)]).0,
            os: os_source,
            stash: quiet_stash(),
            system_info: quiet_system_info(),
        });

        tokio::time::sleep(ms(1300)).await;

        assert_eq!(
            toolbar.content_of(OS_INFO_SLOT).unwrap().text,
            "PinormOS 7.2.10"
        );
        // A version bump with no pending repo update toasts nothing
        assert!(notifier.messages().is_empty());

        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stash_ready_notifies_once_then_stops() {
        let toolbar = SharedToolbar::default();
        let notifier = SharedNotifier::default();

        let (stash, fetches) = Script::new([Some(false), Some(false), Some(true)]);
        let engine = builder(&toolbar, &notifier).start(EngineSources {
            connection: Script::new([connected(false)]).0,
            os: quiet_os(),
            stash,
            system_info: quiet_system_info(),
        });

        tokio::time::sleep(ms(4000)).await;

        assert_eq!(notifier.messages(), vec![STASH_READY_MESSAGE]);
        assert_eq!(fetches.load(Ordering::SeqCst), 3);

        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stash_watcher_never_starts_when_disabled() {
        let toolbar = SharedToolbar::default();
        let notifier = SharedNotifier::default();

        let (stash, fetches) = Script::new([Some(true)]);
        let engine = builder(&toolbar, &notifier)
            .stash_enabled(false)
            .start(EngineSources {
                connection: Script::new([connected(false)]).0,
                os: quiet_os(),
                stash,
                system_info: quiet_system_info(),
            });

        tokio::time::sleep(ms(3000)).await;
        engine.shutdown().await;

        assert_eq!(fetches.load(Ordering::SeqCst), 0);
        assert!(notifier.messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_system_info_published_on_change() {
        let toolbar = SharedToolbar::default();
        let notifier = SharedNotifier::default();

        let mut first = SystemInfo::new();
        first.insert("kernel".to_string(), "5.15".to_string());
        let mut second = first.clone();
        second.insert("uptime".to_string(), "3d".to_string());

        let (system_info, _) = Script::new([Some(first), Some(second.clone())]);
        let engine = builder(&toolbar, &notifier).start(EngineSources {
            connection: Script::new([connected(false)]).0,
            os: quiet_os(),
            stash: quiet_stash(),
            system_info,
        });

        let receiver = engine.system_info();
        tokio::time::sleep(ms(1300)).await;

        assert_eq!(*receiver.borrow(), second);

        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_close_is_configuration() {
        let toolbar = SharedToolbar::default();
        let notifier = SharedNotifier::default();

        let (connection, _) = Script::new([connected(true)]);
        let engine = builder(&toolbar, &notifier)
            .auto_close(ms(3000))
            .start(EngineSources {
                connection,
                os: quiet_os(),
                stash: quiet_stash(),
                system_info: quiet_system_info(),
            });

        tokio::time::sleep(ms(300)).await;
        engine.shutdown().await;

        let updates = notifier.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].auto_close, ms(3000));
        assert_eq!(updates[0].message, CONNECTED_MESSAGE);
    }
}
