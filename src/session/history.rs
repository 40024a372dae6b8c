//! Per-user conversation state.

use crate::types::Turn;

/// Accumulated turns sent as context with every provider call.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    history: Vec<Turn>,
}

impl ConversationSession {
    /// A new session whose turn zero is the persona preamble.
    #[must_use]
    pub fn seeded(preamble: &str) -> Self {
        Self {
            history: vec![Turn::system(preamble)],
        }
    }

    #[must_use]
    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    /// History plus `text` as the pending user turn.
    #[must_use]
    pub fn request_with(&self, text: &str) -> Vec<Turn> {
        let mut request = Vec::with_capacity(self.history.len() + 1);
        request.extend_from_slice(&self.history);
        request.push(Turn::user(text));
        request
    }

    /// Record a completed exchange.
    pub fn push_exchange(&mut self, user_text: &str, reply: &str) {
        self.history.push(Turn::user(user_text));
        self.history.push(Turn::assistant(reply));
    }
}

/// Lifecycle of a user's conversation.
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    /// No context yet; the next exchange seeds one.
    #[default]
    Uninitialized,
    Active(ConversationSession),
}

impl SessionState {
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active(_))
    }
}
