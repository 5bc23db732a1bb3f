//! Outcome notifications.
//!
//! The workflow reports every terminal outcome through a [`Notifier`].
//! Delivery is fire-and-forget: failures are logged and never change the
//! outcome of a run.

use std::time::Duration;

use crate::model::ChangeRecord;

/// Something that can be told about a run's outcome.
pub trait Notifier {
    fn notify(&self, message: &str);
}

/// A notifier that drops every message. Used when no webhook is configured.
pub struct Silent;

impl Notifier for Silent {
    fn notify(&self, message: &str) {
        tracing::debug!(text = message, "notification skipped, no webhook configured");
    }
}

// ── Slack ──

const TIMEOUT: Duration = Duration::from_secs(5);

/// A named Slack incoming-webhook endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Webhook {
    pub name: String,
    pub url: String,
}

/// Posts `{"text": message}` to each configured Slack webhook.
#[derive(Debug, Clone, Default)]
pub struct SlackNotifier {
    webhooks: Vec<Webhook>,
}

impl SlackNotifier {
    /// Build the recipient list for a run.
    ///
    /// The operator webhook always receives messages. The team webhook only
    /// does when `notify_team` is set and the run is not a test run.
    /// Empty URLs are ignored.
    pub fn for_run(
        operator: Option<&str>,
        team: Option<&str>,
        test_mode: bool,
        notify_team: bool,
    ) -> Self {
        let mut webhooks = Vec::new();
        if let Some(url) = operator.filter(|u| !u.trim().is_empty()) {
            webhooks.push(Webhook {
                name: "operator".to_string(),
                url: url.to_string(),
            });
        }
        if notify_team && !test_mode {
            match team.filter(|u| !u.trim().is_empty()) {
                Some(url) => webhooks.push(Webhook {
                    name: "team".to_string(),
                    url: url.to_string(),
                }),
                None => tracing::warn!("team notification requested but no team webhook is set"),
            }
        }
        Self { webhooks }
    }

    pub fn webhooks(&self) -> &[Webhook] {
        &self.webhooks
    }
}

impl Notifier for SlackNotifier {
    fn notify(&self, message: &str) {
        if self.webhooks.is_empty() {
            Silent.notify(message);
            return;
        }
        for hook in &self.webhooks {
            match post(&hook.url, message) {
                Ok(()) => tracing::info!(webhook = %hook.name, "slack notification sent"),
                Err(e) => {
                    tracing::warn!(webhook = %hook.name, "failed to send slack notification: {e}");
                }
            }
        }
    }
}

fn post(url: &str, message: &str) -> Result<(), ureq::Error> {
    let payload = serde_json::json!({ "text": message });
    let agent = ureq::Agent::config_builder()
        .timeout_global(Some(TIMEOUT))
        .build()
        .new_agent();
    agent
        .post(url)
        .header("Content-Type", "application/json")
        .send(payload.to_string())?;
    Ok(())
}

// ── Message formatting ──

/// Bullet list of changed file names with status indicators.
///
/// ```text
/// • Invoice.mrt (M)
/// • New.mrt (U)
/// ```
pub fn format_changes(changes: &[ChangeRecord]) -> String {
    if changes.is_empty() {
        return "No files changed".to_string();
    }
    changes
        .iter()
        .filter(|c| !c.file_name().is_empty())
        .map(|c| format!("\u{2022} {} {}", c.file_name(), c.indicator()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Message sent after a successful push.
pub fn deployed_message(changes: &[ChangeRecord]) -> String {
    format!("Reports deployed.\n\n{}", format_changes(changes))
}
