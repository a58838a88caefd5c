//! The monitoring engine: lifecycle state machine and change-detection
//! poll tick.
//!
//! The engine owns the configuration snapshot, the per-source rate limiter,
//! the bounded event history and the single current-alert slot. It is not
//! internally synchronized: all operations are expected to run on one
//! logical timeline, which [`crate::engine::EngineService`] provides by
//! serializing them onto a single actor task. Timers (alert auto-dismiss,
//! `pause_for` auto-resume) are represented as deadlines that the service
//! loop awaits; cancelling a timer is clearing its deadline.

use tokio::{
    sync::{broadcast, mpsc},
    time::Instant,
};

use crate::{
    config::{ConfigStore, Configuration},
    engine::{history::EventHistory, rate_limiter::RateLimiter},
    models::{ClipboardEvent, EngineNotification, MonitorState},
    notification::{AlertPresenter, DismissCallback},
    providers::{ClipboardSignal, ForegroundSignal},
};

/// Capacity of the notification broadcast channel.
const NOTIFICATION_CHANNEL_CAPACITY: usize = 64;

/// The clipboard monitoring engine.
///
/// State transitions are idempotent guards, never errors: invoking an
/// inapplicable transition (e.g. [`MonitoringEngine::resume`] while not
/// paused) is a silent no-op. Platform query failures degrade to "nothing
/// to report this tick"; nothing here is fatal to the hosting process.
pub struct MonitoringEngine<C, V, F, P>
where
    C: ConfigStore,
    V: ClipboardSignal,
    F: ForegroundSignal,
    P: AlertPresenter,
{
    config: Configuration,
    config_store: C,
    clipboard: V,
    foreground: F,
    presenter: P,
    state: MonitorState,
    /// Last observed change-counter value; the comparison baseline.
    last_counter: u64,
    limiter: RateLimiter,
    history: EventHistory,
    current_alert: Option<ClipboardEvent>,
    /// Pending auto-dismiss timer for the current alert.
    dismiss_deadline: Option<Instant>,
    /// Pending auto-resume timer armed by `pause_for`.
    resume_deadline: Option<Instant>,
    notifications: broadcast::Sender<EngineNotification>,
    /// Feedback channel invoked by the presenter's own dismissal path.
    dismissals: mpsc::UnboundedSender<()>,
}

impl<C, V, F, P> MonitoringEngine<C, V, F, P>
where
    C: ConfigStore,
    V: ClipboardSignal,
    F: ForegroundSignal,
    P: AlertPresenter,
{
    /// Creates an engine in the `Idle` state, loading configuration from
    /// the store. The baseline counter is captured on `start`, not here.
    ///
    /// `dismissals` is the feedback channel through which the presenter's
    /// own UI dismissal path reaches the engine's owner; the service loop
    /// forwards received messages to
    /// [`MonitoringEngine::handle_external_dismiss`].
    pub fn new(
        config_store: C,
        clipboard: V,
        foreground: F,
        presenter: P,
        dismissals: mpsc::UnboundedSender<()>,
    ) -> Self {
        let config = config_store.load();
        let limiter = RateLimiter::new(config.max_alerts_per_source, config.alert_cooldown);
        let (notifications, _) = broadcast::channel(NOTIFICATION_CHANNEL_CAPACITY);

        Self {
            config,
            config_store,
            clipboard,
            foreground,
            presenter,
            state: MonitorState::Idle,
            last_counter: 0,
            limiter,
            history: EventHistory::new(),
            current_alert: None,
            dismiss_deadline: None,
            resume_deadline: None,
            notifications,
            dismissals,
        }
    }

    // --- Lifecycle -------------------------------------------------------

    /// Starts monitoring when the configuration enables it and the engine
    /// is still idle. Called once when the service loop comes up.
    pub fn auto_start_if_needed(&mut self) {
        if self.config.enabled && self.state == MonitorState::Idle {
            self.start();
        }
    }

    /// Begins monitoring: captures the current counter as the comparison
    /// baseline and enters `Monitoring`. No-op while already monitoring.
    pub fn start(&mut self) {
        if self.state == MonitorState::Monitoring {
            return;
        }
        self.capture_baseline();
        self.resume_deadline = None;
        self.set_state(MonitorState::Monitoring);
    }

    /// Stops monitoring from any state: cancels the poll loop and any
    /// pending auto-dismiss or auto-resume timer, landing in `Idle`.
    /// History and the current alert are retained.
    pub fn stop(&mut self) {
        self.dismiss_deadline = None;
        self.resume_deadline = None;
        self.set_state(MonitorState::Idle);
    }

    /// Suspends polling. No-op unless currently monitoring.
    pub fn pause(&mut self) {
        if self.state != MonitorState::Monitoring {
            return;
        }
        self.set_state(MonitorState::Paused);
    }

    /// Resumes from `Paused`, re-capturing the baseline so that changes
    /// made while paused are not retroactively reported. No-op otherwise.
    pub fn resume(&mut self) {
        if self.state != MonitorState::Paused {
            return;
        }
        self.resume_deadline = None;
        self.capture_baseline();
        self.set_state(MonitorState::Monitoring);
    }

    /// Pauses and arms a one-shot auto-resume after `duration`. The timer
    /// only takes effect if the engine is still paused when it fires.
    pub fn pause_for(&mut self, duration: std::time::Duration) {
        self.pause();
        if self.state == MonitorState::Paused {
            self.resume_deadline = Some(Instant::now() + duration);
            tracing::info!(seconds = duration.as_secs_f64(), "Monitoring paused with auto-resume.");
        }
    }

    /// Fired by the service loop when the auto-resume deadline elapses.
    /// Resumes only if the engine is still paused; a manual `resume` or
    /// `stop` in the interim suppresses it.
    pub fn handle_auto_resume(&mut self) {
        self.resume_deadline = None;
        if self.state == MonitorState::Paused {
            self.resume();
        }
    }

    // --- Poll tick -------------------------------------------------------

    /// One cycle of change detection. Executed by the service loop on each
    /// cadence interval while monitoring; ticks are strictly sequential.
    pub fn poll_tick(&mut self) {
        if self.state != MonitorState::Monitoring {
            return;
        }

        let counter = match self.clipboard.change_counter() {
            Ok(counter) => counter,
            Err(e) => {
                tracing::debug!(error = %e, "Change counter unavailable, skipping tick.");
                return;
            }
        };

        if counter == self.last_counter {
            return;
        }
        self.last_counter = counter;

        // The clipboard changed but attribution is unknown: nothing to
        // report, retried naturally on the next tick.
        let Some(source) = self.foreground.current_source() else {
            tracing::debug!("Clipboard changed but the foreground source is unresolvable.");
            return;
        };

        if self.config.allowlist.contains(&source.id) {
            tracing::debug!(source = %source.id, "Clipboard change from allowlisted source.");
            return;
        }

        let event = ClipboardEvent::new(source.id, source.name, counter);
        tracing::info!(
            source = %event.source_id,
            name = %event.source_name,
            counter = event.change_counter,
            "Clipboard change detected."
        );

        // Recorded unconditionally for any non-allowlisted change,
        // independent of rate limiting and the popup toggle.
        self.history.record(event.clone());
        let _ = self.notifications.send(EngineNotification::EventRecorded(event.clone()));

        if self.config.show_popup && self.limiter.permit(&event.source_id) {
            self.show_alert(event);
        } else {
            tracing::debug!(source = %event.source_id, "Alert suppressed.");
        }
    }

    // --- Alerts ----------------------------------------------------------

    /// Dismisses the current alert: cancels the auto-dismiss timer, clears
    /// the current-alert slot and closes the presenter. Safe to call when
    /// no alert is current.
    pub fn dismiss_alert(&mut self) {
        if self.current_alert.is_none() {
            return;
        }
        self.dismiss_deadline = None;
        self.current_alert = None;
        self.presenter.close();
        let _ = self.notifications.send(EngineNotification::AlertDismissed);
    }

    /// Handles a dismissal that originated in the presenter's own UI. The
    /// presenter already closed its display, so only engine state is
    /// cleared here.
    pub fn handle_external_dismiss(&mut self) {
        if self.current_alert.is_none() {
            return;
        }
        self.dismiss_deadline = None;
        self.current_alert = None;
        let _ = self.notifications.send(EngineNotification::AlertDismissed);
    }

    fn show_alert(&mut self, event: ClipboardEvent) {
        // Replacing a live alert: cancel its auto-dismiss before re-arming,
        // so a stale dismissal can never fire against the new alert.
        self.dismiss_deadline = None;
        self.presenter.show(&event, self.dismiss_callback());
        self.dismiss_deadline = Some(Instant::now() + self.config.popup_duration);
        self.current_alert = Some(event.clone());
        let _ = self.notifications.send(EngineNotification::AlertShown(event));
    }

    fn dismiss_callback(&self) -> DismissCallback {
        let dismissals = self.dismissals.clone();
        Box::new(move || {
            let _ = dismissals.send(());
        })
    }

    // --- History & configuration -----------------------------------------

    /// Empties the event history, zeroes session counters and resets the
    /// rate limiter, independent of the current state.
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.limiter.reset();
        let _ = self.notifications.send(EngineNotification::HistoryCleared);
        tracing::info!("Event history cleared.");
    }

    /// Reloads configuration from the store.
    ///
    /// Monitoring is fully stopped first and only restarted afterwards (if
    /// it was running and the new configuration is enabled), so no tick can
    /// observe a torn mix of old and new limiter state. The rate limiter is
    /// reconstructed with the new limits, discarding prior windows.
    pub fn reload_config(&mut self) {
        let was_monitoring = self.state == MonitorState::Monitoring;
        if was_monitoring {
            self.stop();
        }

        self.config = self.config_store.load();
        self.limiter =
            RateLimiter::new(self.config.max_alerts_per_source, self.config.alert_cooldown);
        let _ = self.notifications.send(EngineNotification::ConfigReloaded);
        tracing::info!(enabled = self.config.enabled, "Configuration reloaded.");

        if was_monitoring && self.config.enabled {
            self.start();
        }
    }

    /// Applies a field-level edit to the held configuration snapshot, the
    /// presentation layer's mutation path. Rate-limiter limits deliberately
    /// stay untouched until a [`MonitoringEngine::reload_config`].
    pub fn update_config(&mut self, edit: impl FnOnce(&mut Configuration)) {
        edit(&mut self.config);
    }

    /// Persists the current configuration, best-effort.
    pub fn save_config(&self) {
        self.config_store.save(&self.config);
    }

    // --- Accessors -------------------------------------------------------

    /// The current lifecycle state.
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// The current configuration snapshot.
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// The event currently displayed as an alert, if any.
    pub fn current_alert(&self) -> Option<&ClipboardEvent> {
        self.current_alert.as_ref()
    }

    /// Read access to the bounded event history.
    pub fn history(&self) -> &EventHistory {
        &self.history
    }

    /// Subscribes to engine notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineNotification> {
        self.notifications.subscribe()
    }

    /// Pending auto-dismiss deadline, awaited by the service loop.
    pub(crate) fn dismiss_deadline(&self) -> Option<Instant> {
        self.dismiss_deadline
    }

    /// Pending auto-resume deadline, awaited by the service loop.
    pub(crate) fn resume_deadline(&self) -> Option<Instant> {
        self.resume_deadline
    }

    fn capture_baseline(&mut self) {
        match self.clipboard.change_counter() {
            Ok(counter) => self.last_counter = counter,
            Err(e) => {
                tracing::warn!(error = %e, "Could not capture baseline; keeping previous value.");
            }
        }
    }

    fn set_state(&mut self, state: MonitorState) {
        if self.state == state {
            return;
        }
        self.state = state;
        tracing::info!(state = ?state, "Monitor state changed.");
        let _ = self.notifications.send(EngineNotification::StateChanged(state));
    }
}
