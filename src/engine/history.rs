//! Bounded, most-recent-first log of detected clipboard events.

use std::collections::VecDeque;

use crate::models::ClipboardEvent;

/// Capacity-bounded event log, newest first.
///
/// Exclusively owned and mutated by the engine; display collaborators get
/// read-only iteration or a cloned snapshot. Insertion beyond capacity
/// evicts the oldest entry. The session counter tracks every event recorded
/// this run, surviving eviction and resetting only on [`EventHistory::clear`].
#[derive(Debug)]
pub struct EventHistory {
    events: VecDeque<ClipboardEvent>,
    capacity: usize,
    session_event_count: u64,
}

impl EventHistory {
    /// Default number of retained events.
    pub const DEFAULT_CAPACITY: usize = 20;

    /// Creates an empty history with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates an empty history retaining at most `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { events: VecDeque::with_capacity(capacity), capacity, session_event_count: 0 }
    }

    /// Inserts an event at the front, evicting the oldest entry when the
    /// history is over capacity.
    pub fn record(&mut self, event: ClipboardEvent) {
        self.events.push_front(event);
        if self.events.len() > self.capacity {
            self.events.pop_back();
        }
        self.session_event_count += 1;
    }

    /// Empties the history and resets the session counter.
    pub fn clear(&mut self) {
        self.events.clear();
        self.session_event_count = 0;
    }

    /// Iterates over retained events, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &ClipboardEvent> {
        self.events.iter()
    }

    /// Clones the retained events, newest first, for display collaborators.
    pub fn snapshot(&self) -> Vec<ClipboardEvent> {
        self.events.iter().cloned().collect()
    }

    /// Number of retained events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are retained.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total events recorded this run, including evicted ones.
    pub fn session_event_count(&self) -> u64 {
        self.session_event_count
    }
}

impl Default for EventHistory {
    fn default() -> Self {
        Self::new()
    }
}
