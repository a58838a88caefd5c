//! Black-box platform queries consumed by the poll loop.
//!
//! Both queries must be fast, synchronous, non-blocking reads: an opaque
//! change counter and foreground-window metadata, never clipboard content.
//! Failures are transient by definition; the engine degrades a failed query
//! to "nothing to report this tick" and retries naturally on the next one.

#[cfg(test)]
use mockall::automock;
use thiserror::Error;

/// Errors surfaced by platform signal queries.
#[derive(Debug, Error)]
pub enum SignalError {
    /// The clipboard change counter could not be read.
    #[error("Clipboard change counter unavailable: {0}")]
    CounterUnavailable(String),
}

/// Identity of the application currently in the foreground.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    /// Stable identifier used for allowlist matching and rate limiting.
    pub id: String,
    /// Human-readable display name.
    pub name: String,
}

impl SourceInfo {
    /// Creates a new source identity.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into() }
    }
}

/// A source for the clipboard change counter.
///
/// The counter is opaque and monotonic-ish: its value changes whenever the
/// clipboard content changes. Only inequality against the last observed
/// value is meaningful.
#[cfg_attr(test, automock)]
pub trait ClipboardSignal: Send + Sync {
    /// Returns the current change-counter value.
    fn change_counter(&self) -> Result<u64, SignalError>;
}

/// A source for the identity of the foreground application.
#[cfg_attr(test, automock)]
pub trait ForegroundSignal: Send + Sync {
    /// Returns the current foreground source, or `None` when it is
    /// momentarily unresolvable.
    fn current_source(&self) -> Option<SourceInfo>;
}
