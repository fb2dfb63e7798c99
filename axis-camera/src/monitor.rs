use crate::command::CommandBuilder;
use crate::dispatcher::Dispatcher;
use crate::transport::{ResponseEvent, ResponseFeed};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use strum::Display;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_TIME_TO_WARNING: Duration = Duration::from_secs(180);
pub const DEFAULT_TIME_TO_ERROR: Duration = Duration::from_secs(300);
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    pub time_to_warning: Duration,
    pub time_to_error: Duration,
    /// Kept for completeness; the poll request itself is fixed.
    pub poll_string: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            time_to_warning: DEFAULT_TIME_TO_WARNING,
            time_to_error: DEFAULT_TIME_TO_ERROR,
            poll_string: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum HealthState {
    Stopped,
    /// Started, no successful response yet.
    Initializing,
    Ok,
    Warning,
    Error,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MonitorError {
    #[error("health monitor needs a tokio runtime to start")]
    NoRuntime,
}

/// Connection health for one camera.
///
/// While running, one task owns the poll timer and both deadlines. It
/// dispatches a poll on every tick and moves to `Ok` on each successful
/// response from the feed, whatever command it answers. Silence longer than
/// `time_to_warning` gives `Warning`, longer than `time_to_error` gives
/// `Error`. Failed sends and failed responses never change the state
/// directly.
pub struct HealthMonitor {
    camera: String,
    config: MonitorConfig,
    dispatcher: Dispatcher,
    feed: ResponseFeed,
    shared: Arc<Shared>,
}

struct Shared {
    slot: Mutex<PollerSlot>,
    state: watch::Sender<HealthState>,
}

/// The running poll task, if any. `generation` changes on every start and
/// stop so a superseded task can no longer touch the state.
#[derive(Default)]
struct PollerSlot {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl PollerSlot {
    fn halt(&mut self) -> bool {
        self.generation += 1;
        match self.task.take() {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, PollerSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.lock().generation == generation
    }

    fn replace_state(&self, camera: &str, next: HealthState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            tracing::info!("[{camera}] health {previous} -> {next}");
        }
    }

    /// Applies a state change from the poller of `generation`. Ignored once
    /// that poller has been stopped or replaced.
    fn transition(&self, camera: &str, generation: u64, next: HealthState) {
        let slot = self.lock();
        if slot.generation != generation {
            return;
        }
        self.replace_state(camera, next);
    }
}

impl HealthMonitor {
    pub fn new(
        camera: impl Into<String>,
        config: MonitorConfig,
        dispatcher: Dispatcher,
        feed: ResponseFeed,
    ) -> Self {
        let (state, _) = watch::channel(HealthState::Stopped);
        Self {
            camera: camera.into(),
            config,
            dispatcher,
            feed,
            shared: Arc::new(Shared {
                slot: Mutex::new(PollerSlot::default()),
                state,
            }),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn state(&self) -> HealthState {
        *self.shared.state.borrow()
    }

    pub fn is_online(&self) -> bool {
        self.state() == HealthState::Ok
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().task.is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<HealthState> {
        self.shared.state.subscribe()
    }

    /// Starts polling, first poll immediately. Restarts the timer and both
    /// deadlines if already running.
    pub fn start(&self) -> Result<(), MonitorError> {
        let handle = Handle::try_current().map_err(|_| {
            tracing::error!("[{}] cannot start health monitor outside a runtime", self.camera);
            MonitorError::NoRuntime
        })?;

        let mut slot = self.shared.lock();
        if slot.halt() {
            tracing::debug!("[{}] restarting health monitor", self.camera);
        }
        self.shared.replace_state(&self.camera, HealthState::Initializing);

        // Subscribed before the first poll goes out.
        let responses = self.feed.subscribe();
        let task = handle.spawn(run_poller(
            self.camera.clone(),
            self.config.clone(),
            self.dispatcher.clone(),
            responses,
            self.shared.clone(),
            slot.generation,
        ));
        slot.task = Some(task);
        tracing::info!(
            "[{}] health monitor started: poll every {:?}, warning after {:?}, error after {:?}",
            self.camera,
            self.config.poll_interval,
            self.config.time_to_warning,
            self.config.time_to_error
        );
        Ok(())
    }

    /// Cancels the poll timer and both deadlines. Safe to call any number
    /// of times, started or not.
    pub fn stop(&self) {
        let mut slot = self.shared.lock();
        if slot.halt() {
            tracing::info!("[{}] health monitor stopped", self.camera);
        } else {
            tracing::debug!("[{}] health monitor already stopped", self.camera);
        }
        self.shared.replace_state(&self.camera, HealthState::Stopped);
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_poller(
    camera: String,
    config: MonitorConfig,
    dispatcher: Dispatcher,
    mut responses: broadcast::Receiver<ResponseEvent>,
    shared: Arc<Shared>,
    generation: u64,
) {
    let mut poll = time::interval(config.poll_interval.max(MIN_POLL_INTERVAL));
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let poll_command = CommandBuilder::poll_for(&camera);
    let mut last_ok = Instant::now();
    let mut current = HealthState::Initializing;
    let mut feed_open = true;

    loop {
        let deadline = next_deadline(current, last_ok, &config);
        tokio::select! {
            biased;
            received = responses.recv(), if feed_open => match received {
                Ok(event) if event.is_success() => {
                    last_ok = Instant::now();
                    current = HealthState::Ok;
                    shared.transition(&camera, generation, current);
                }
                Ok(event) => {
                    tracing::debug!(
                        "[{camera}] unsuccessful response to {}: {:?}",
                        event.command,
                        event.outcome
                    );
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("[{camera}] skipped {skipped} response notification(s)");
                }
                Err(RecvError::Closed) => {
                    tracing::warn!("[{camera}] response feed closed");
                    feed_open = false;
                }
            },
            _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if let Some(next) = classify(last_ok.elapsed(), &config) {
                    current = next;
                    shared.transition(&camera, generation, current);
                }
            }
            _ = poll.tick() => {
                if !shared.is_current(generation) {
                    break;
                }
                dispatcher.dispatch(&poll_command);
            }
        }
    }
    tracing::debug!("[{camera}] poller exited");
}

fn next_deadline(
    current: HealthState,
    last_ok: Instant,
    config: &MonitorConfig,
) -> Option<Instant> {
    match current {
        HealthState::Error | HealthState::Stopped => None,
        HealthState::Warning => Some(last_ok + config.time_to_error),
        HealthState::Initializing | HealthState::Ok => {
            Some(last_ok + config.time_to_warning.min(config.time_to_error))
        }
    }
}

fn classify(silence: Duration, config: &MonitorConfig) -> Option<HealthState> {
    if silence >= config.time_to_error {
        Some(HealthState::Error)
    } else if silence >= config.time_to_warning {
        Some(HealthState::Warning)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MemoryTransport, Transport};

    const POLL: &str = "axis-cgi/com/ptz.cgi?info=1";

    fn monitor(transport: &Arc<MemoryTransport>, config: MonitorConfig) -> HealthMonitor {
        HealthMonitor::new(
            "cam-1",
            config,
            Dispatcher::new(transport.clone()),
            transport.responses(),
        )
    }

    async fn advance(duration: Duration) {
        time::sleep(duration).await;
    }

    async fn settle() {
        advance(Duration::from_millis(1)).await;
    }

    fn reply_ok(transport: &MemoryTransport) {
        transport.respond(ResponseEvent::completed(POLL, 200));
    }

    #[test]
    fn starts_stopped_and_stop_is_idempotent_without_start() {
        let transport = Arc::new(MemoryTransport::new());
        let monitor = monitor(&transport, MonitorConfig::default());
        assert_eq!(monitor.state(), HealthState::Stopped);
        monitor.stop();
        monitor.stop();
        assert_eq!(monitor.state(), HealthState::Stopped);
        assert!(!monitor.is_running());
    }

    #[test]
    fn start_outside_runtime_fails() {
        let transport = Arc::new(MemoryTransport::new());
        let monitor = monitor(&transport, MonitorConfig::default());
        assert_eq!(monitor.start(), Err(MonitorError::NoRuntime));
        assert_eq!(monitor.state(), HealthState::Stopped);
    }

    #[test]
    fn classify_thresholds() {
        let config = MonitorConfig::default();
        assert_eq!(classify(Duration::from_secs(179), &config), None);
        assert_eq!(classify(Duration::from_secs(180), &config), Some(HealthState::Warning));
        assert_eq!(classify(Duration::from_secs(300), &config), Some(HealthState::Error));
    }

    #[tokio::test(start_paused = true)]
    async fn first_poll_is_immediate_then_every_interval() {
        let transport = Arc::new(MemoryTransport::new());
        let monitor = monitor(&transport, MonitorConfig::default());
        monitor.start().unwrap();
        settle().await;
        assert_eq!(transport.sent(), vec![POLL]);
        assert_eq!(monitor.state(), HealthState::Initializing);

        advance(Duration::from_secs(60)).await;
        assert_eq!(transport.sent().len(), 2);
        advance(Duration::from_secs(60)).await;
        assert_eq!(transport.sent().len(), 3);
        monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn success_before_warning_is_ok() {
        let transport = Arc::new(MemoryTransport::new());
        let monitor = monitor(&transport, MonitorConfig::default());
        monitor.start().unwrap();
        settle().await;
        reply_ok(&transport);
        settle().await;
        assert_eq!(monitor.state(), HealthState::Ok);
        assert!(monitor.is_online());
        monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn silence_degrades_to_warning_then_error() {
        let transport = Arc::new(MemoryTransport::new());
        let monitor = monitor(&transport, MonitorConfig::default());
        monitor.start().unwrap();

        advance(Duration::from_secs(179)).await;
        assert_eq!(monitor.state(), HealthState::Initializing);
        advance(Duration::from_secs(2)).await;
        assert_eq!(monitor.state(), HealthState::Warning);
        assert!(!monitor.is_online());
        advance(Duration::from_secs(118)).await;
        assert_eq!(monitor.state(), HealthState::Warning);
        advance(Duration::from_secs(2)).await;
        assert_eq!(monitor.state(), HealthState::Error);
        monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn success_from_error_resets_both_deadlines() {
        let transport = Arc::new(MemoryTransport::new());
        let monitor = monitor(&transport, MonitorConfig::default());
        monitor.start().unwrap();
        advance(Duration::from_secs(301)).await;
        assert_eq!(monitor.state(), HealthState::Error);

        transport.respond(ResponseEvent::completed(
            "axis-cgi/com/ptz.cgi?continuouszoommove=0",
            200,
        ));
        settle().await;
        assert_eq!(monitor.state(), HealthState::Ok);

        advance(Duration::from_secs(178)).await;
        assert_eq!(monitor.state(), HealthState::Ok);
        advance(Duration::from_secs(2)).await;
        assert_eq!(monitor.state(), HealthState::Warning);
        advance(Duration::from_secs(120)).await;
        assert_eq!(monitor.state(), HealthState::Error);
        monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn failed_responses_do_not_reset_or_degrade() {
        let transport = Arc::new(MemoryTransport::new());
        let monitor = monitor(&transport, MonitorConfig::default());
        monitor.start().unwrap();
        settle().await;
        reply_ok(&transport);
        settle().await;

        advance(Duration::from_secs(100)).await;
        transport.respond(ResponseEvent::timed_out(POLL));
        transport.respond(ResponseEvent::failed(POLL, "connection refused"));
        settle().await;
        assert_eq!(monitor.state(), HealthState::Ok);

        advance(Duration::from_secs(81)).await;
        assert_eq!(monitor.state(), HealthState::Warning);
        monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn send_failures_degrade_only_through_time() {
        let transport = Arc::new(MemoryTransport::new());
        transport.set_refuse(true);
        let monitor = monitor(&transport, MonitorConfig::default());
        monitor.start().unwrap();

        advance(Duration::from_secs(150)).await;
        assert_eq!(monitor.state(), HealthState::Initializing);
        advance(Duration::from_secs(31)).await;
        assert_eq!(monitor.state(), HealthState::Warning);
        monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn answered_polls_keep_the_camera_online() {
        let transport = Arc::new(MemoryTransport::with_auto_reply());
        let monitor = monitor(&transport, MonitorConfig::default());
        monitor.start().unwrap();
        for _ in 0..10 {
            advance(Duration::from_secs(60)).await;
            assert_eq!(monitor.state(), HealthState::Ok);
        }
        monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_start_stop_releases_the_timer() {
        let transport = Arc::new(MemoryTransport::new());
        let monitor = monitor(&transport, MonitorConfig::default());
        monitor.stop();
        monitor.start().unwrap();
        monitor.stop();
        monitor.stop();
        monitor.stop();
        assert_eq!(monitor.state(), HealthState::Stopped);
        assert!(!monitor.is_running());

        transport.take_sent();
        advance(Duration::from_secs(600)).await;
        assert!(transport.sent().is_empty());
        assert_eq!(monitor.state(), HealthState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn responses_after_stop_are_ignored() {
        let transport = Arc::new(MemoryTransport::new());
        let monitor = monitor(&transport, MonitorConfig::default());
        monitor.start().unwrap();
        settle().await;
        monitor.stop();
        reply_ok(&transport);
        settle().await;
        assert_eq!(monitor.state(), HealthState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_resets_deadlines() {
        let transport = Arc::new(MemoryTransport::new());
        let monitor = monitor(&transport, MonitorConfig::default());
        monitor.start().unwrap();
        advance(Duration::from_secs(200)).await;
        assert_eq!(monitor.state(), HealthState::Warning);

        monitor.start().unwrap();
        settle().await;
        assert_eq!(monitor.state(), HealthState::Initializing);
        advance(Duration::from_secs(170)).await;
        assert_eq!(monitor.state(), HealthState::Initializing);
        monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn warning_not_before_error_goes_straight_to_error() {
        let transport = Arc::new(MemoryTransport::new());
        let config = MonitorConfig {
            time_to_warning: Duration::from_secs(400),
            ..MonitorConfig::default()
        };
        let monitor = monitor(&transport, config);
        let mut states = monitor.subscribe();
        monitor.start().unwrap();
        states.borrow_and_update();

        advance(Duration::from_secs(301)).await;
        assert_eq!(monitor.state(), HealthState::Error);
        assert!(states.has_changed().unwrap());
        assert_eq!(*states.borrow_and_update(), HealthState::Error);
        monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_monitor_stops_polling() {
        let transport = Arc::new(MemoryTransport::new());
        let monitor = monitor(&transport, MonitorConfig::default());
        monitor.start().unwrap();
        settle().await;
        drop(monitor);
        transport.take_sent();
        advance(Duration::from_secs(600)).await;
        assert!(transport.sent().is_empty());
    }
}
