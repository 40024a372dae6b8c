//! Owns one conversation per user and relays user text to the provider.

use std::{collections::HashMap, sync::Arc, time::Duration};

use log::{debug, error, info, warn};
use tokio::{
    sync::Mutex,
    time::{Instant, timeout},
};

use crate::clock::{Clock, DayPeriod};
use crate::error::{BotError, Result};
use crate::provider::ChatProvider;
use crate::types::{Turn, UserKey};

use super::greeting::{greeting_reply, is_greeting};
use super::history::{ConversationSession, SessionState};
use super::postprocess::tidy;

/// Reply for every failed exchange.
pub const FALLBACK_MESSAGE: &str =
    "🤖 Sorry, I'm having trouble processing that right now. Please try again!";

const HEALTH_CHECK_PROMPT: &str = "Test";

/// Session table limits.
#[derive(Debug, Clone, Copy)]
pub struct SessionLimits {
    /// Upper bound on the provider call.
    pub provider_timeout: Duration,
    /// Sessions kept before the least recently used idle one is dropped.
    pub cap: usize,
    /// Sessions idle longer than this are dropped.
    pub idle: Duration,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(30),
            cap: 1000,
            idle: Duration::from_secs(3600),
        }
    }
}

struct SessionSlot {
    state: SessionState,
    last_used: Instant,
}

impl SessionSlot {
    fn new() -> Self {
        Self {
            state: SessionState::Uninitialized,
            last_used: Instant::now(),
        }
    }
}

type SlotHandle = Arc<Mutex<SessionSlot>>;

pub struct SessionManager {
    provider: Option<Arc<dyn ChatProvider>>,
    clock: Arc<dyn Clock>,
    preamble: String,
    limits: SessionLimits,
    sessions: Mutex<HashMap<UserKey, SlotHandle>>,
}

impl SessionManager {
    /// `provider` is `None` when the AI backend is not configured; greetings
    /// still work and everything else gets the fallback reply.
    pub fn new(
        provider: Option<Arc<dyn ChatProvider>>,
        clock: Arc<dyn Clock>,
        preamble: impl Into<String>,
        limits: SessionLimits,
    ) -> Self {
        if provider.is_none() {
            warn!("Session manager started without an AI provider");
        }
        Self {
            provider,
            clock,
            preamble: preamble.into(),
            limits,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Answer `text` from `user`. Never fails; provider errors become
    /// [`FALLBACK_MESSAGE`].
    pub async fn respond(&self, user: UserKey, text: &str) -> String {
        if is_greeting(text) {
            let reply = greeting_reply(DayPeriod::from_hour(self.clock.local_hour()));
            log_interaction(user, text, &reply);
            return reply;
        }

        let Some(provider) = self.provider.as_deref() else {
            error!("AI provider not available, sending fallback to user {user}");
            return FALLBACK_MESSAGE.to_string();
        };

        let slot = self.slot(user).await;
        let mut slot = slot.lock().await;
        slot.last_used = Instant::now();

        match self.exchange(provider, &mut slot.state, user, text).await {
            Ok(reply) => {
                log_interaction(user, text, &reply);
                reply
            }
            Err(e) if e.is_provider_error() => {
                error!("AI response generation failed for user {user}: {e}");
                FALLBACK_MESSAGE.to_string()
            }
            Err(e) => {
                error!("Session error for user {user}: {e}");
                FALLBACK_MESSAGE.to_string()
            }
        }
    }

    /// Forget `user`'s conversation; the next exchange starts from the preamble.
    pub async fn reset_session(&self, user: UserKey) {
        let slot = self.sessions.lock().await.get(&user).cloned();
        let Some(slot) = slot else {
            debug!("No AI context to reset for user {user}");
            return;
        };

        // The slot stays in the table so later calls for this user queue
        // behind the in-flight exchange instead of starting a second one.
        let mut slot = slot.lock().await;
        if slot.state.is_active() {
            slot.state = SessionState::Uninitialized;
            info!("AI context reset for user {user}");
        } else {
            debug!("No AI context to reset for user {user}");
        }
    }

    /// Throwaway exchange outside any session. True iff the provider answered.
    pub async fn health_check(&self) -> bool {
        let Some(provider) = self.provider.as_deref() else {
            return false;
        };
        match self.call(provider, &[Turn::user(HEALTH_CHECK_PROMPT)]).await {
            Ok(reply) => !reply.trim().is_empty(),
            Err(e) => {
                error!("AI health check failed: {e}");
                false
            }
        }
    }

    pub async fn has_session(&self, user: UserKey) -> bool {
        let slot = self.sessions.lock().await.get(&user).cloned();
        match slot {
            Some(slot) => slot.lock().await.state.is_active(),
            None => false,
        }
    }

    /// Number of users currently holding a conversation. A slot busy with an
    /// exchange counts as active.
    pub async fn active_sessions(&self) -> usize {
        self.sessions
            .lock()
            .await
            .values()
            .filter(|slot| slot.try_lock().map_or(true, |s| s.state.is_active()))
            .count()
    }

    #[must_use]
    pub fn provider_name(&self) -> Option<&str> {
        self.provider.as_deref().map(ChatProvider::name)
    }

    async fn exchange(
        &self,
        provider: &dyn ChatProvider,
        state: &mut SessionState,
        user: UserKey,
        text: &str,
    ) -> Result<String> {
        if let SessionState::Uninitialized = state {
            *state = SessionState::Active(self.seed(provider, user).await);
        }
        let SessionState::Active(session) = state else {
            return Err(BotError::ProviderUnavailable);
        };

        let raw = self.call(provider, &session.request_with(text)).await?;
        if raw.trim().is_empty() {
            return Err(BotError::EmptyReply);
        }
        let reply = tidy(&raw);
        session.push_exchange(text, &reply);
        Ok(reply)
    }

    // The preamble's own reply is not kept; a failed seed still yields a session.
    async fn seed(&self, provider: &dyn ChatProvider, user: UserKey) -> ConversationSession {
        let session = ConversationSession::seeded(&self.preamble);
        match self.call(provider, session.history()).await {
            Ok(_) => debug!("Chat session created for user {user}"),
            Err(e) => warn!("Failed to initialize chat session for user {user}: {e}"),
        }
        session
    }

    async fn call(&self, provider: &dyn ChatProvider, history: &[Turn]) -> Result<String> {
        timeout(self.limits.provider_timeout, provider.complete(history))
            .await
            .map_err(|_| BotError::ProviderTimeout(self.limits.provider_timeout.as_secs()))?
    }

    async fn slot(&self, user: UserKey) -> SlotHandle {
        let mut sessions = self.sessions.lock().await;
        if let Some(slot) = sessions.get(&user) {
            return Arc::clone(slot);
        }
        self.evict(&mut sessions);
        let slot = Arc::new(Mutex::new(SessionSlot::new()));
        sessions.insert(user, Arc::clone(&slot));
        slot
    }

    // Only slots nobody else holds a handle to are candidates.
    fn evict(&self, sessions: &mut HashMap<UserKey, SlotHandle>) {
        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, slot| {
            Arc::strong_count(slot) > 1
                || slot
                    .try_lock()
                    .map_or(true, |s| now.duration_since(s.last_used) < self.limits.idle)
        });

        while self.limits.cap > 0 && sessions.len() >= self.limits.cap {
            let oldest = sessions
                .iter()
                .filter(|(_, slot)| Arc::strong_count(slot) == 1)
                .filter_map(|(user, slot)| slot.try_lock().ok().map(|s| (*user, s.last_used)))
                .min_by_key(|(_, last_used)| *last_used)
                .map(|(user, _)| user);
            match oldest {
                Some(user) => {
                    sessions.remove(&user);
                }
                None => break,
            }
        }

        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!("Evicted {evicted} idle chat sessions");
        }
    }
}

fn log_interaction(user: UserKey, query: &str, reply: &str) {
    let preview: String = query.chars().take(50).collect();
    info!(
        "AI response for user {user} - Query: {preview}... Response: {} chars",
        reply.chars().count()
    );
}
