//! Best-effort desktop notifications

use std::process::{Command as ProcessCommand, Stdio};

use log::{debug, warn};

use crate::config_file::NotificationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Low,
    Normal,
    Critical,
}

impl Urgency {
    fn as_str(self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Normal => "normal",
            Urgency::Critical => "critical",
        }
    }
}

/// Delivers short messages to the user outside the menu.
pub trait Notifier {
    fn notify(&self, urgency: Urgency, summary: &str, body: &str);

    fn info(&self, summary: &str, body: &str) {
        self.notify(Urgency::Normal, summary, body);
    }

    fn error(&self, summary: &str, body: &str) {
        self.notify(Urgency::Critical, summary, body);
    }
}

/// Sends notifications through `notify-send`.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    config: NotificationConfig,
}

impl DesktopNotifier {
    #[must_use]
    pub fn new(config: NotificationConfig) -> Self {
        Self { config }
    }

    fn args(&self, urgency: Urgency, summary: &str, body: &str) -> Vec<String> {
        let mut args = vec![
            "--app-name".to_string(),
            self.config.app_name.clone(),
            "--urgency".to_string(),
            urgency.as_str().to_string(),
            "--expire-time".to_string(),
            self.config.timeout_ms.to_string(),
            summary.to_string(),
        ];
        if !body.is_empty() {
            args.push(body.to_string());
        }
        args
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, urgency: Urgency, summary: &str, body: &str) {
        if !self.config.enabled {
            debug!("Notification suppressed: {summary}: {body}");
            return;
        }
        let status = ProcessCommand::new("notify-send")
            .args(self.args(urgency, summary, body))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(s) if s.success() => {}
            Ok(s) => warn!("notify-send exited with {s}"),
            Err(e) => warn!("Unable to run notify-send: {e}"),
        }
    }
}
