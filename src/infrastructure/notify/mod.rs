use crate::application::ports::notifier::{Notification, NotificationLevel, Notifier};

/// Routes user-facing notifications into the log stream under their own target,
/// so a subscriber can render them separately from diagnostics.
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let message = notification.message.as_str();
        match notification.level {
            NotificationLevel::Success => {
                tracing::info!(target: "vault::notify", kind = "success", "{message}")
            }
            NotificationLevel::Info => tracing::info!(target: "vault::notify", kind = "info", "{message}"),
            NotificationLevel::Error => tracing::warn!(target: "vault::notify", kind = "error", "{message}"),
        }
    }
}
