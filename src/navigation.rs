use std::fmt;
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};

use crate::notifications::Notifier;

pub const LANDING_MESSAGE: &str = "🚀 Starting your AI interview practice session!";

/// The pages of the client, in the order a candidate walks through them.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Landing,
    Practice,
    Session,
    Report,
}

impl Page {
    pub fn path(self) -> &'static str {
        match self {
            Page::Landing => "/",
            Page::Practice => "/practice",
            Page::Session => "/start",
            Page::Report => "/report",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Landing page call to action: announce, pause briefly, then move on to the
/// practice form.
pub async fn start_practice(notifier: &dyn Notifier, delay: Duration) -> Page {
    notifier.info(LANDING_MESSAGE);
    tokio::time::sleep(delay).await;
    info!("➡️ Navigating to {}", Page::Practice);
    Page::Practice
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::{NotificationKind, ToastCenter};

    #[tokio::test]
    async fn test_start_practice_announces_and_navigates() {
        let toasts = ToastCenter::new(Duration::from_secs(4));
        let page = start_practice(&toasts, Duration::from_millis(1)).await;
        assert_eq!(page, Page::Practice);
        assert!(toasts.contains(NotificationKind::Info, LANDING_MESSAGE));
    }
}
