//! The engine service: a single actor task that owns the
//! [`MonitoringEngine`] and serializes every operation onto one timeline.
//!
//! The engine's data structures are not internally synchronized, so a
//! multi-threaded host must funnel all mutation through one task. The
//! service implements that single-writer discipline: an mpsc command queue
//! fed by clonable [`EngineHandle`]s, a `tokio::select!` loop that also
//! drives the poll cadence and the engine's one-shot timers, and a
//! `CancellationToken` for graceful shutdown.

use std::time::Duration;

use thiserror::Error;
use tokio::{
    sync::{broadcast, mpsc, oneshot},
    time::{Instant, Interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    config::{ConfigStore, Configuration},
    engine::MonitoringEngine,
    models::{ClipboardEvent, EngineNotification, MonitorState},
    notification::AlertPresenter,
    providers::{ClipboardSignal, ForegroundSignal},
};

/// Capacity of the command queue feeding the service task.
const COMMAND_CHANNEL_CAPACITY: usize = 32;

/// Errors returned by [`EngineHandle`] operations.
#[derive(Debug, Error)]
pub enum EngineServiceError {
    /// The service task has shut down and no longer accepts commands.
    #[error("The engine service is no longer running")]
    Closed,
}

/// Operations shipped from handles to the service task.
enum Command {
    Start,
    Stop,
    Pause,
    Resume,
    PauseFor(Duration),
    DismissAlert,
    ClearHistory,
    ReloadConfig,
    SaveConfig,
    UpdateConfig(Box<dyn FnOnce(&mut Configuration) + Send>),
    GetState(oneshot::Sender<MonitorState>),
    GetHistory(oneshot::Sender<Vec<ClipboardEvent>>),
    GetSessionEventCount(oneshot::Sender<u64>),
    GetCurrentAlert(oneshot::Sender<Option<ClipboardEvent>>),
    GetConfig(oneshot::Sender<Configuration>),
    Subscribe(oneshot::Sender<broadcast::Receiver<EngineNotification>>),
}

/// A clonable, thread-safe handle to a running [`EngineService`].
///
/// All operations are forwarded to the service task and executed there in
/// arrival order. Lifecycle operations resolve once the command is queued;
/// query operations resolve with the engine's answer.
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<Command>,
}

impl EngineHandle {
    async fn send(&self, command: Command) -> Result<(), EngineServiceError> {
        self.commands.send(command).await.map_err(|_| EngineServiceError::Closed)
    }

    async fn query<T>(
        &self,
        command: Command,
        reply: oneshot::Receiver<T>,
    ) -> Result<T, EngineServiceError> {
        self.send(command).await?;
        reply.await.map_err(|_| EngineServiceError::Closed)
    }

    /// Begins monitoring. No-op if already monitoring.
    pub async fn start(&self) -> Result<(), EngineServiceError> {
        self.send(Command::Start).await
    }

    /// Stops monitoring from any state, cancelling pending timers.
    pub async fn stop(&self) -> Result<(), EngineServiceError> {
        self.send(Command::Stop).await
    }

    /// Suspends polling. No-op unless monitoring.
    pub async fn pause(&self) -> Result<(), EngineServiceError> {
        self.send(Command::Pause).await
    }

    /// Resumes polling. No-op unless paused.
    pub async fn resume(&self) -> Result<(), EngineServiceError> {
        self.send(Command::Resume).await
    }

    /// Pauses with a one-shot auto-resume after `duration`.
    pub async fn pause_for(&self, duration: Duration) -> Result<(), EngineServiceError> {
        self.send(Command::PauseFor(duration)).await
    }

    /// Dismisses the current alert, if any.
    pub async fn dismiss_alert(&self) -> Result<(), EngineServiceError> {
        self.send(Command::DismissAlert).await
    }

    /// Clears event history, session counters and rate-limiter state.
    pub async fn clear_history(&self) -> Result<(), EngineServiceError> {
        self.send(Command::ClearHistory).await
    }

    /// Reloads configuration from the store, restarting monitoring if it
    /// was running and remains enabled.
    pub async fn reload_config(&self) -> Result<(), EngineServiceError> {
        self.send(Command::ReloadConfig).await
    }

    /// Persists the current configuration, best-effort.
    pub async fn save_config(&self) -> Result<(), EngineServiceError> {
        self.send(Command::SaveConfig).await
    }

    /// Applies a field-level edit to the configuration snapshot on the
    /// engine's timeline.
    pub async fn update_config(
        &self,
        edit: impl FnOnce(&mut Configuration) + Send + 'static,
    ) -> Result<(), EngineServiceError> {
        self.send(Command::UpdateConfig(Box::new(edit))).await
    }

    /// The engine's current lifecycle state.
    pub async fn state(&self) -> Result<MonitorState, EngineServiceError> {
        let (tx, rx) = oneshot::channel();
        self.query(Command::GetState(tx), rx).await
    }

    /// A snapshot of retained events, newest first.
    pub async fn history(&self) -> Result<Vec<ClipboardEvent>, EngineServiceError> {
        let (tx, rx) = oneshot::channel();
        self.query(Command::GetHistory(tx), rx).await
    }

    /// Total events recorded this run, including evicted ones.
    pub async fn session_event_count(&self) -> Result<u64, EngineServiceError> {
        let (tx, rx) = oneshot::channel();
        self.query(Command::GetSessionEventCount(tx), rx).await
    }

    /// The event currently displayed as an alert, if any.
    pub async fn current_alert(&self) -> Result<Option<ClipboardEvent>, EngineServiceError> {
        let (tx, rx) = oneshot::channel();
        self.query(Command::GetCurrentAlert(tx), rx).await
    }

    /// The current configuration snapshot.
    pub async fn config(&self) -> Result<Configuration, EngineServiceError> {
        let (tx, rx) = oneshot::channel();
        self.query(Command::GetConfig(tx), rx).await
    }

    /// Subscribes to engine notifications.
    pub async fn subscribe(
        &self,
    ) -> Result<broadcast::Receiver<EngineNotification>, EngineServiceError> {
        let (tx, rx) = oneshot::channel();
        self.query(Command::Subscribe(tx), rx).await
    }
}

/// The actor task owning a [`MonitoringEngine`].
pub struct EngineService<C, V, F, P>
where
    C: ConfigStore,
    V: ClipboardSignal,
    F: ForegroundSignal,
    P: AlertPresenter,
{
    engine: MonitoringEngine<C, V, F, P>,
    commands: mpsc::Receiver<Command>,
    /// Feedback from the presenter's own UI dismissal path.
    dismissals: mpsc::UnboundedReceiver<()>,
    cancellation_token: CancellationToken,
}

impl<C, V, F, P> EngineService<C, V, F, P>
where
    C: ConfigStore,
    V: ClipboardSignal,
    F: ForegroundSignal,
    P: AlertPresenter,
{
    /// Wires an engine with its collaborators and returns the service plus
    /// a handle to drive it. The service does nothing until
    /// [`EngineService::run`] is awaited (typically on a spawned task).
    pub fn new(
        config_store: C,
        clipboard: V,
        foreground: F,
        presenter: P,
        cancellation_token: CancellationToken,
    ) -> (Self, EngineHandle) {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (dismissals_tx, dismissals_rx) = mpsc::unbounded_channel();
        let engine =
            MonitoringEngine::new(config_store, clipboard, foreground, presenter, dismissals_tx);

        let service = Self {
            engine,
            commands: commands_rx,
            dismissals: dismissals_rx,
            cancellation_token,
        };
        (service, EngineHandle { commands: commands_tx })
    }

    /// Runs the service loop until cancellation or until every handle has
    /// been dropped. Auto-starts monitoring when the configuration enables
    /// it.
    pub async fn run(mut self) {
        self.engine.auto_start_if_needed();
        let mut poll = make_interval(self.engine.config().poll_interval);

        loop {
            // A reload may have changed the cadence.
            if poll.period() != self.engine.config().poll_interval {
                poll = make_interval(self.engine.config().poll_interval);
            }

            tokio::select! {
                biased;

                _ = self.cancellation_token.cancelled() => {
                    tracing::info!("Engine service cancellation signal received, shutting down...");
                    self.engine.stop();
                    break;
                }

                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        tracing::info!("All engine handles dropped, shutting down...");
                        self.engine.stop();
                        break;
                    }
                },

                Some(()) = self.dismissals.recv() => {
                    self.engine.handle_external_dismiss();
                }

                _ = deadline(self.engine.dismiss_deadline()) => {
                    self.engine.dismiss_alert();
                }

                _ = deadline(self.engine.resume_deadline()) => {
                    self.engine.handle_auto_resume();
                }

                _ = poll.tick(), if self.engine.state() == MonitorState::Monitoring => {
                    self.engine.poll_tick();
                }
            }
        }

        tracing::info!("Engine service has shut down.");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start => self.engine.start(),
            Command::Stop => self.engine.stop(),
            Command::Pause => self.engine.pause(),
            Command::Resume => self.engine.resume(),
            Command::PauseFor(duration) => self.engine.pause_for(duration),
            Command::DismissAlert => self.engine.dismiss_alert(),
            Command::ClearHistory => self.engine.clear_history(),
            Command::ReloadConfig => self.engine.reload_config(),
            Command::SaveConfig => self.engine.save_config(),
            Command::UpdateConfig(edit) => self.engine.update_config(edit),
            Command::GetState(reply) => {
                let _ = reply.send(self.engine.state());
            }
            Command::GetHistory(reply) => {
                let _ = reply.send(self.engine.history().snapshot());
            }
            Command::GetSessionEventCount(reply) => {
                let _ = reply.send(self.engine.history().session_event_count());
            }
            Command::GetCurrentAlert(reply) => {
                let _ = reply.send(self.engine.current_alert().cloned());
            }
            Command::GetConfig(reply) => {
                let _ = reply.send(self.engine.config().clone());
            }
            Command::Subscribe(reply) => {
                let _ = reply.send(self.engine.subscribe());
            }
        }
    }
}

/// Resolves at the given deadline, or never when there is none. Deadlines
/// double as cancellable timers: clearing one on the engine re-arms this
/// future on the next loop iteration.
async fn deadline(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn make_interval(period: Duration) -> Interval {
    // First tick one full period out; an interval's default first tick is
    // immediate, which would poll before the host has settled.
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
