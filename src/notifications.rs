use std::fmt;
use std::time::{Duration, Instant};

use log::{error, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    Warning,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NotificationKind::Success => "success",
            NotificationKind::Error => "error",
            NotificationKind::Info => "info",
            NotificationKind::Warning => "warning",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Debug)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub raised_at: Instant,
}

/// Sink for the short toast messages every page shows.
pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NotificationKind, message: &str);

    fn success(&self, message: &str) {
        self.notify(NotificationKind::Success, message);
    }

    fn error(&self, message: &str) {
        self.notify(NotificationKind::Error, message);
    }

    fn info(&self, message: &str) {
        self.notify(NotificationKind::Info, message);
    }

    fn warning(&self, message: &str) {
        self.notify(NotificationKind::Warning, message);
    }
}

/// In-memory toast presenter: a new toast replaces the visible one, and a
/// toast disappears once its lifetime has passed.
pub struct ToastCenter {
    lifetime: Duration,
    visible: Mutex<Option<Notification>>,
    history: Mutex<Vec<Notification>>,
}

impl ToastCenter {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            lifetime,
            visible: Mutex::new(None),
            history: Mutex::new(Vec::new()),
        }
    }

    /// The toast currently on screen, if it has not expired.
    pub fn current(&self) -> Option<Notification> {
        let mut visible = self.visible.lock();
        if visible
            .as_ref()
            .is_some_and(|toast| toast.raised_at.elapsed() >= self.lifetime)
        {
            *visible = None;
        }
        visible.clone()
    }

    pub fn history(&self) -> Vec<Notification> {
        self.history.lock().clone()
    }

    pub fn contains(&self, kind: NotificationKind, needle: &str) -> bool {
        self.history
            .lock()
            .iter()
            .any(|n| n.kind == kind && n.message.contains(needle))
    }
}

impl Default for ToastCenter {
    fn default() -> Self {
        Self::new(Duration::from_millis(4000))
    }
}

impl Notifier for ToastCenter {
    fn notify(&self, kind: NotificationKind, message: &str) {
        match kind {
            NotificationKind::Error => error!("[toast] {}", message),
            NotificationKind::Warning => warn!("[toast] {}", message),
            NotificationKind::Success | NotificationKind::Info => info!("[toast] {}", message),
        }

        let toast = Notification {
            kind,
            message: message.to_string(),
            raised_at: Instant::now(),
        };
        *self.visible.lock() = Some(toast.clone());
        self.history.lock().push(toast);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_toast_replaces_visible_one() {
        let toasts = ToastCenter::new(Duration::from_secs(60));
        toasts.info("first");
        toasts.error("second");

        let current = toasts.current().unwrap();
        assert_eq!(current.message, "second");
        assert_eq!(current.kind, NotificationKind::Error);
        assert_eq!(toasts.history().len(), 2);
    }

    #[test]
    fn test_toast_expires() {
        let toasts = ToastCenter::new(Duration::ZERO);
        toasts.success("gone");
        assert!(toasts.current().is_none());
        assert!(toasts.contains(NotificationKind::Success, "gone"));
    }
}
