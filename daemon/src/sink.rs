/// Desktop alerts and the passive unread indicator.
///
/// Alerts go through notify-rust on a detached thread so a slow notification
/// daemon never stalls the poll loop. The indicator is published through
/// `status.toml`; the tray frontend renders it from there.
use std::path::PathBuf;
use std::sync::Mutex;

use notify_rust::Notification;
use tracing::{debug, info, warn};

use crate::poller::CycleOutcome;
use crate::status::{self, AgentStatus, Indicator};

/// Receiver of everything user-visible the poll loop produces.
/// All calls are fire-and-forget.
pub trait NotificationSink: Send + Sync {
    fn alert(&self, title: &str, subtitle: &str, body: &str);

    fn set_indicator(&self, indicator: Indicator);

    /// Called once at the end of every cycle, successful or not.
    fn cycle_finished(&self, _outcome: &CycleOutcome) {}
}

/// Production sink: native notifications plus the status file.
pub struct DesktopSink {
    status_path: PathBuf,
    status: Mutex<AgentStatus>,
    desktop_alerts: bool,
}

impl DesktopSink {
    pub fn new(status_path: PathBuf, desktop_alerts: bool) -> Self {
        let sink = Self {
            status_path,
            status: Mutex::new(AgentStatus::new()),
            desktop_alerts,
        };
        sink.update_status(|_| {});
        sink
    }

    /// Marks the agent as no longer running in the status file.
    pub fn mark_stopped(&self) {
        self.update_status(|s| s.running = false);
    }

    fn update_status(&self, f: impl FnOnce(&mut AgentStatus)) {
        let mut status = self.status.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut status);
        status::write_status(&self.status_path, &status);
    }
}

impl NotificationSink for DesktopSink {
    fn alert(&self, title: &str, subtitle: &str, body: &str) {
        info!(%title, %body, "Raising notification");
        if !self.desktop_alerts {
            return;
        }

        let title = title.to_string();
        let subtitle = subtitle.to_string();
        let body = body.to_string();
        std::thread::spawn(move || {
            if let Err(e) = build_notification(&title, &subtitle, &body).show() {
                warn!(error = %e, "Desktop notification failed");
            }
        });
    }

    fn set_indicator(&self, indicator: Indicator) {
        debug!(?indicator, "Indicator updated");
        self.update_status(|s| s.indicator = indicator);
    }

    fn cycle_finished(&self, outcome: &CycleOutcome) {
        match outcome {
            CycleOutcome::Completed {
                decision,
                unread,
                persisted,
            } => {
                debug!(?decision, unread, persisted, "Cycle complete");
                let unread = *unread;
                self.update_status(|s| {
                    s.unread_chats = unread;
                    s.last_checked = Some(chrono::Local::now().to_rfc3339());
                    s.error = None;
                });
            }
            CycleOutcome::FetchFailed(message) => {
                let message = message.clone();
                self.update_status(|s| s.error = Some(format!("Fetch failed: {message}")));
            }
        }
    }
}

/// `title` names the sending application, `subtitle` is the headline and
/// `body` the text underneath.
fn build_notification(title: &str, subtitle: &str, body: &str) -> Notification {
    let mut notification = Notification::new();
    notification.appname(title).summary(subtitle).body(body);
    notification
}
