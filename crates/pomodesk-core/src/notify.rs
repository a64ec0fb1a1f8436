//! Notification side channel.
//!
//! Phase completions are announced through a [`Notifier`]. Delivery is
//! fire-and-forget: implementations must not block for long and have no way
//! to report failure back to the timer.

/// Title used for phase-completion notifications.
pub const NOTIFICATION_TITLE: &str = "Pomodoro Timer";

pub trait Notifier: Send {
    fn notify(&self, title: &str, body: &str);
}

/// Sends notifications to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        tracing::info!(title, body, "notification");
    }
}

/// Drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _title: &str, _body: &str) {}
}
