//! This module contains the core data types shared across the clipwatch
//! engine and its collaborators.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The operating state of the monitoring engine.
///
/// Exactly one state is active at a time. There is no terminal state: the
/// process lifetime bounds the engine, and a stopped engine is simply back
/// in [`MonitorState::Idle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// The engine is constructed but not polling. Initial state.
    Idle,
    /// The poll loop is active and clipboard changes are being detected.
    Monitoring,
    /// Polling is suspended; history and the current alert are retained.
    Paused,
}

/// A single detected clipboard mutation by a non-allowlisted source.
///
/// Contains metadata only, never clipboard contents. Events are created by
/// the engine on a qualifying poll tick, never mutated afterwards, and
/// retained only in the bounded event history and (at most one at a time)
/// as the current alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardEvent {
    /// Unique identifier for this event.
    pub id: Uuid,
    /// Wall-clock time at which the change was detected.
    pub timestamp: DateTime<Utc>,
    /// Stable identifier of the foreground application that made the change.
    pub source_id: String,
    /// Human-readable name of the source application.
    pub source_name: String,
    /// The raw change-counter value observed for this mutation.
    pub change_counter: u64,
}

impl ClipboardEvent {
    /// Creates a new event stamped with a fresh id and the current time.
    pub fn new(
        source_id: impl Into<String>,
        source_name: impl Into<String>,
        change_counter: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source_id: source_id.into(),
            source_name: source_name.into(),
            change_counter,
        }
    }

    /// Human-readable `HH:MM:SS` time string for display collaborators.
    pub fn time_string(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// Notifications published by the engine for the presentation layer.
///
/// Delivered over a `tokio::sync::broadcast` channel obtained from
/// [`crate::engine::MonitoringEngine::subscribe`]. Subscribers are
/// observers only; dropping or lagging a receiver never affects the engine.
#[derive(Debug, Clone)]
pub enum EngineNotification {
    /// The engine transitioned to a new state.
    StateChanged(MonitorState),
    /// A non-allowlisted clipboard change was recorded into history.
    EventRecorded(ClipboardEvent),
    /// An alert for the given event was handed to the presenter.
    AlertShown(ClipboardEvent),
    /// The current alert was dismissed (engine-driven or via the
    /// presenter's own UI path).
    AlertDismissed,
    /// Event history and session counters were cleared.
    HistoryCleared,
    /// Configuration was reloaded from the store.
    ConfigReloaded,
}
