//! Alert presentation seam.
//!
//! The engine decides *when* an alert fires; how it looks is entirely the
//! presenter's concern. The presenter receives the event and a one-shot
//! dismissal callback for its own UI path (e.g. the user clicking the
//! popup away), distinct from the engine-driven dismissal which calls
//! [`AlertPresenter::close`].

#[cfg(test)]
use mockall::automock;

use crate::models::ClipboardEvent;

/// One-shot callback a presenter invokes when its own UI dismisses the
/// alert. Must be invoked at most once per [`AlertPresenter::show`].
pub type DismissCallback = Box<dyn FnOnce() + Send>;

/// Display collaborator for clipboard alerts.
#[cfg_attr(test, automock)]
pub trait AlertPresenter: Send + Sync {
    /// Displays an alert for the given event. `on_dismissed` is invoked
    /// exactly once if (and only if) the presenter's own UI dismisses the
    /// alert; engine-driven dismissal arrives via [`AlertPresenter::close`]
    /// instead.
    fn show(&self, event: &ClipboardEvent, on_dismissed: DismissCallback);

    /// Closes the currently displayed alert, if any.
    fn close(&self);
}

/// Headless presenter that renders alerts as log lines.
///
/// Useful for embedders without a UI and as a default collaborator in
/// tests. It has no UI dismissal path, so the callback is never invoked.
#[derive(Debug, Default, Clone)]
pub struct LogAlertPresenter;

impl AlertPresenter for LogAlertPresenter {
    fn show(&self, event: &ClipboardEvent, _on_dismissed: DismissCallback) {
        tracing::info!(
            source = %event.source_id,
            name = %event.source_name,
            at = %event.time_string(),
            "Clipboard changed by a non-allowlisted application."
        );
    }

    fn close(&self) {
        tracing::debug!("Alert closed.");
    }
}
