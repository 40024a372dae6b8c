//! Per-user AI conversations.

mod greeting;
mod history;
mod manager;
mod postprocess;

pub use greeting::{greeting_reply, is_greeting};
pub use history::{ConversationSession, SessionState};
pub use manager::{FALLBACK_MESSAGE, SessionLimits, SessionManager};
pub use postprocess::{MAX_REPLY_CHARS, tidy};
