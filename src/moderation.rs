//! User moderation: banned-term checks, weighted warnings and bans.

mod engine;
mod store;
mod terms;

pub use engine::{ModerationEngine, ModerationStats, UserModerationRecord, Verdict, Violation};
pub use store::{JsonFileStore, ModerationSnapshot, ModerationStore};
pub use terms::{BannedTermSet, Severity};

/// Reply for a message that pushed the user below the ban threshold.
#[must_use]
pub fn warning_message(count: u32, max: u32) -> String {
    format!(
        "⚠️ Warning {count}/{max}: Please keep our agricultural community friendly and respectful!"
    )
}

/// Reply for the message that got the user banned.
pub const BANNED_MESSAGE: &str = "⛔ You have been banned for repeated inappropriate language.";

/// Reply for any message from an already banned user.
pub const BANNED_USER_MESSAGE: &str = "⛔ You are banned from using this bot.";
