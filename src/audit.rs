//! Activity mirror to a Discord audit channel.
//!
//! Audit lines are emitted by the dispatch layer after the engines have
//! returned; failures to post are logged and dropped.

use log::{error, info};
use poise::serenity_prelude::{ChannelId, CreateMessage, Http};

const PREVIEW_CHARS: usize = 100;

/// Something worth mirroring to the audit channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEvent {
    BannedUserAttempt { user: String, text: String },
    Warned { user: String, count: u32, max: u32, terms: Vec<String> },
    Banned { user: String, terms: Vec<String> },
    Exchange { user: String, text: String, reply: String },
    WarningsReset { user: String },
    ContextReset { user: String },
    Unbanned { user: String, by: String },
    TermAdded { term: String, by: String },
    TermRemoved { term: String, by: String },
    Command { name: &'static str, user: String },
    Error { user: String, error: String },
}

impl AuditEvent {
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            AuditEvent::BannedUserAttempt { user, text } => {
                format!("❌ Banned user {user} tried to send: '{}'", preview(text))
            }
            AuditEvent::Warned { user, count, max, terms } => format!(
                "⚠️ User {user} warning {count}/{max} for: '{}'",
                terms.join(", ")
            ),
            AuditEvent::Banned { user, terms } => format!(
                "🚫 User {user} banned for repeated violations: '{}'",
                terms.join(", ")
            ),
            AuditEvent::Exchange { user, text, reply } => format!(
                "👤 User: {user}\n💬 Message: {}\n🤖 Response: {}",
                preview(text),
                preview(reply)
            ),
            AuditEvent::WarningsReset { user } => format!("🔄 Warnings reset for user: {user}"),
            AuditEvent::ContextReset { user } => format!("🧹 AI context reset for user: {user}"),
            AuditEvent::Unbanned { user, by } => format!("✅ {user} unbanned by {by}"),
            AuditEvent::TermAdded { term, by } => format!("🚫 Banned word '{term}' added by {by}"),
            AuditEvent::TermRemoved { term, by } => {
                format!("✅ Banned word '{term}' removed by {by}")
            }
            AuditEvent::Command { name, user } => format!("ℹ️ /{name} used by {user}"),
            AuditEvent::Error { user, error } => {
                format!("⚠️ Error handling message from {user}: {error}")
            }
        }
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        text.to_string()
    }
}

/// Posts [`AuditEvent`]s to the configured channel, or only logs them.
#[derive(Debug, Clone, Copy)]
pub struct AuditLog {
    channel: Option<ChannelId>,
}

impl AuditLog {
    #[must_use]
    pub fn new(channel: Option<ChannelId>) -> Self {
        Self { channel }
    }

    pub async fn emit(&self, http: &Http, event: AuditEvent) {
        let line = event.render();
        info!("Audit: {line}");

        let Some(channel) = self.channel else {
            return;
        };
        let message = CreateMessage::new().content(format!("🤖 **Cholan AI Log**\n{line}"));
        if let Err(e) = channel.send_message(http, message).await {
            error!("Failed to send log to channel {channel}: {e}");
        }
    }
}
