use std::fmt;

use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// Fire-and-forget user notifications (toasts in a UI, log lines on a terminal).
pub trait NotificationSink {
    fn notify(&self, title: &str, message: &str, severity: Severity);
}

impl<T: NotificationSink + ?Sized> NotificationSink for &T {
    fn notify(&self, title: &str, message: &str, severity: Severity) {
        (**self).notify(title, message, severity);
    }
}

/// Emits each notification as a `tracing` event at a level matching its severity.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, title: &str, message: &str, severity: Severity) {
        match severity {
            Severity::Info | Severity::Success => info!(%severity, title, "{message}"),
            Severity::Warning => warn!(%severity, title, "{message}"),
            Severity::Error => error!(%severity, title, "{message}"),
        }
    }
}
