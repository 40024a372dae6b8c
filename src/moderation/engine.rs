//! Warning/ban state machine over the banned-term set.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use tokio::sync::RwLock;

use crate::clock::Clock;
use crate::types::UserKey;

use super::store::{ModerationSnapshot, ModerationStore};
use super::terms::{BannedTermSet, Severity, max_severity};

/// Moderation state of a single user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserModerationRecord {
    pub warning_count: u32,
    pub banned_at: Option<DateTime<Utc>>,
}

/// Banned terms found in one message and the severity they add up to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub terms: Vec<String>,
    pub severity: Severity,
}

/// Outcome of checking a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Nothing matched; no state changed.
    Clean,
    /// Matched, and the user is still below the threshold.
    Warned {
        count: u32,
        max: u32,
        violation: Violation,
    },
    /// Matched, and the increment reached the threshold.
    Banned { count: u32, violation: Violation },
}

/// Aggregate view of the moderation table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModerationStats {
    pub users_with_warnings: usize,
    pub banned_users: usize,
    pub average_warnings: f64,
    pub users_near_ban: usize,
}

pub struct ModerationEngine {
    records: RwLock<HashMap<UserKey, UserModerationRecord>>,
    terms: RwLock<BannedTermSet>,
    store: Box<dyn ModerationStore>,
    clock: Arc<dyn Clock>,
    max_warnings: u32,
}

impl ModerationEngine {
    /// Build the engine from whatever `store` holds.
    ///
    /// A missing or unreadable store yields an empty table.
    pub fn load(
        store: Box<dyn ModerationStore>,
        terms: BannedTermSet,
        max_warnings: u32,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let snapshot = match store.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                info!("No existing user data found, starting fresh");
                ModerationSnapshot::default()
            }
            Err(e) => {
                error!("Failed to load user data, starting fresh: {e}");
                ModerationSnapshot::default()
            }
        };

        let mut records: HashMap<UserKey, UserModerationRecord> = snapshot
            .warnings
            .into_iter()
            .map(|(user, warning_count)| {
                (
                    user,
                    UserModerationRecord {
                        warning_count,
                        banned_at: None,
                    },
                )
            })
            .collect();
        for (user, banned_at) in snapshot.banned {
            let record = records.entry(user).or_default();
            record.banned_at = Some(banned_at);
            // A banned user never sits below the threshold.
            if record.warning_count < max_warnings {
                warn!(
                    "User {user} stored as banned with {} warnings, raising to {max_warnings}",
                    record.warning_count
                );
                record.warning_count = max_warnings;
            }
        }

        info!(
            "Loaded user data: {} users, {} banned",
            records.len(),
            records.values().filter(|r| r.banned_at.is_some()).count()
        );

        Self {
            records: RwLock::new(records),
            terms: RwLock::new(terms),
            store,
            clock,
            max_warnings,
        }
    }

    #[must_use]
    pub fn max_warnings(&self) -> u32 {
        self.max_warnings
    }

    pub async fn is_banned(&self, user: UserKey) -> bool {
        self.records
            .read()
            .await
            .get(&user)
            .is_some_and(|record| record.banned_at.is_some())
    }

    /// Warning count of `user`; 0 for users never seen.
    pub async fn warning_count(&self, user: UserKey) -> u32 {
        self.records
            .read()
            .await
            .get(&user)
            .map_or(0, |record| record.warning_count)
    }

    pub async fn record(&self, user: UserKey) -> Option<UserModerationRecord> {
        self.records.read().await.get(&user).copied()
    }

    /// Check `text` and apply the weighted penalty when any banned term matches.
    pub async fn evaluate(&self, user: UserKey, text: &str) -> Verdict {
        let matched = self.terms.read().await.matches(text);
        let Some(severity) = max_severity(&matched) else {
            return Verdict::Clean;
        };
        let violation = Violation {
            terms: matched,
            severity,
        };

        let mut records = self.records.write().await;
        let record = records.entry(user).or_default();
        record.warning_count = record.warning_count.saturating_add(severity.weight());
        let count = record.warning_count;
        let banned = count >= self.max_warnings;
        if banned && record.banned_at.is_none() {
            record.banned_at = Some(self.clock.now());
        }

        let reason = format!(
            "Banned words: {} ({severity})",
            violation.terms.join(", ")
        );
        log_moderation_action(
            user,
            &format!("Warning {count}/{}", self.max_warnings),
            &reason,
        );
        if banned {
            log_moderation_action(
                user,
                "BANNED",
                &format!("Exceeded maximum warnings ({})", self.max_warnings),
            );
        }

        self.persist(&records);

        if banned {
            Verdict::Banned { count, violation }
        } else {
            Verdict::Warned {
                count,
                max: self.max_warnings,
                violation,
            }
        }
    }

    /// Zero the warning count and lift any ban.
    pub async fn reset(&self, user: UserKey) {
        let mut records = self.records.write().await;
        records.insert(user, UserModerationRecord::default());
        log_moderation_action(user, "WARNING_RESET", "Manual reset requested");
        self.persist(&records);
    }

    /// Lift a ban without touching the warning count.
    ///
    /// Returns false when the user was not banned.
    pub async fn unban(&self, user: UserKey) -> bool {
        let mut records = self.records.write().await;
        let Some(record) = records.get_mut(&user).filter(|r| r.banned_at.is_some()) else {
            return false;
        };
        record.banned_at = None;
        log_moderation_action(user, "UNBANNED", "Manual unban");
        self.persist(&records);
        true
    }

    pub async fn stats(&self) -> ModerationStats {
        let records = self.records.read().await;
        let near_ban_threshold = self.max_warnings.saturating_sub(1);

        let total: f64 = records
            .values()
            .map(|r| f64::from(r.warning_count))
            .sum();
        let average_warnings = if records.is_empty() {
            0.0
        } else {
            total / f64::from(u32::try_from(records.len()).unwrap_or(u32::MAX))
        };

        ModerationStats {
            users_with_warnings: records.values().filter(|r| r.warning_count > 0).count(),
            banned_users: records.values().filter(|r| r.banned_at.is_some()).count(),
            average_warnings,
            users_near_ban: records
                .values()
                .filter(|r| r.warning_count >= near_ban_threshold)
                .count(),
        }
    }

    /// Returns false if the term was already banned.
    pub async fn add_term(&self, term: &str) -> bool {
        let added = self.terms.write().await.add(term);
        if added {
            info!("Added banned word: {term}");
        }
        added
    }

    /// Returns false if the term was not banned.
    pub async fn remove_term(&self, term: &str) -> bool {
        let removed = self.terms.write().await.remove(term);
        if removed {
            info!("Removed banned word: {term}");
        }
        removed
    }

    pub async fn terms(&self) -> BannedTermSet {
        self.terms.read().await.clone()
    }

    // Runs under the table write lock. A failed write keeps the in-memory change.
    fn persist(&self, records: &HashMap<UserKey, UserModerationRecord>) {
        let snapshot = ModerationSnapshot {
            warnings: records
                .iter()
                .map(|(user, record)| (*user, record.warning_count))
                .collect(),
            banned: records
                .iter()
                .filter_map(|(user, record)| record.banned_at.map(|at| (*user, at)))
                .collect(),
            last_updated: Some(self.clock.now()),
        };
        if let Err(e) = self.store.save(&snapshot) {
            error!("Failed to save user data: {e}");
        }
    }
}

fn log_moderation_action(user: UserKey, action: &str, reason: &str) {
    warn!("Moderation - user {user} - {action} - Reason: {reason}");
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::clock::tests::FixedClock;
    use crate::error::{BotError, Result};
    use crate::moderation::store::JsonFileStore;

    /// In-memory store that records every save and can be told to fail.
    #[derive(Default)]
    struct MemoryStore {
        saved: Arc<Mutex<Vec<ModerationSnapshot>>>,
        initial: Option<ModerationSnapshot>,
        fail_load: bool,
        fail_save: bool,
    }

    impl ModerationStore for MemoryStore {
        fn load(&self) -> Result<Option<ModerationSnapshot>> {
            if self.fail_load {
                return Err(BotError::Persistence("unreadable".to_string()));
            }
            Ok(self.initial.clone())
        }

        fn save(&self, snapshot: &ModerationSnapshot) -> Result<()> {
            if self.fail_save {
                return Err(BotError::Persistence("disk full".to_string()));
            }
            self.saved
                .lock()
                .map_err(|_| BotError::Persistence("poisoned".to_string()))?
                .push(snapshot.clone());
            Ok(())
        }
    }

    fn engine_with(store: MemoryStore) -> ModerationEngine {
        ModerationEngine::load(
            Box::new(store),
            BannedTermSet::default(),
            3,
            Arc::new(FixedClock::at_hour(9)),
        )
    }

    fn engine() -> (ModerationEngine, Arc<Mutex<Vec<ModerationSnapshot>>>) {
        let store = MemoryStore::default();
        let saved = Arc::clone(&store.saved);
        (engine_with(store), saved)
    }

    fn save_count(saved: &Arc<Mutex<Vec<ModerationSnapshot>>>) -> usize {
        saved.lock().map(|s| s.len()).unwrap_or_default()
    }

    #[tokio::test]
    async fn clean_text_changes_nothing() {
        let (engine, saved) = engine();
        assert_eq!(engine.evaluate(1, "When should I plant tomatoes?").await, Verdict::Clean);
        assert_eq!(engine.warning_count(1).await, 0);
        assert!(engine.record(1).await.is_none());
        assert_eq!(save_count(&saved), 0);
    }

    #[tokio::test]
    async fn three_mild_messages_warn_warn_ban() {
        let (engine, saved) = engine();

        let first = engine.evaluate(7, "oh crap").await;
        assert!(matches!(first, Verdict::Warned { count: 1, max: 3, .. }));
        let second = engine.evaluate(7, "DAMN this weather").await;
        assert!(matches!(second, Verdict::Warned { count: 2, max: 3, .. }));
        assert!(!engine.is_banned(7).await);

        let third = engine.evaluate(7, "piss poor harvest").await;
        assert!(matches!(third, Verdict::Banned { count: 3, .. }));
        assert!(engine.is_banned(7).await);
        assert_eq!(save_count(&saved), 3);
    }

    #[tokio::test]
    async fn single_severe_term_bans_immediately() {
        let (engine, _) = engine();
        let verdict = engine.evaluate(9, "you bastard").await;
        match verdict {
            Verdict::Banned { count, violation } => {
                assert_eq!(count, 3);
                assert_eq!(violation.severity, Severity::Severe);
                assert_eq!(violation.terms, vec!["bastard"]);
            }
            other => panic!("expected ban, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn increment_uses_highest_severity_only() {
        let (engine, _) = engine();
        // "damn" is mild, "idiot" moderate: one message adds 2, not 3
        let verdict = engine.evaluate(4, "damn idiot").await;
        assert!(matches!(
            verdict,
            Verdict::Warned {
                count: 2,
                max: 3,
                violation: Violation {
                    severity: Severity::Moderate,
                    ..
                }
            }
        ));
    }

    #[tokio::test]
    async fn evaluate_is_deterministic() {
        let (a, _) = engine();
        let (b, _) = engine();
        assert_eq!(a.evaluate(1, "stupid hell").await, b.evaluate(1, "stupid hell").await);
    }

    #[tokio::test]
    async fn ban_timestamp_comes_from_clock_and_sticks() -> Result<()> {
        let clock = Arc::new(FixedClock::at_hour(9));
        let expected = clock.now;
        let engine = ModerationEngine::load(
            Box::new(MemoryStore::default()),
            BannedTermSet::default(),
            3,
            clock,
        );
        engine.evaluate(2, "retard").await;
        engine.evaluate(2, "crap").await;

        let record = engine.record(2).await.ok_or(BotError::Config("missing".into()))?;
        assert_eq!(record.warning_count, 4);
        assert_eq!(record.banned_at, Some(expected));
        Ok(())
    }

    #[tokio::test]
    async fn reset_zeroes_and_unbans_idempotently() {
        let (engine, saved) = engine();
        engine.evaluate(3, "asshole idiot moron").await;
        engine.evaluate(3, "dumb").await;
        assert!(engine.is_banned(3).await);

        engine.reset(3).await;
        let once = engine.record(3).await;
        engine.reset(3).await;
        let twice = engine.record(3).await;

        assert_eq!(once, Some(UserModerationRecord::default()));
        assert_eq!(once, twice);
        assert!(!engine.is_banned(3).await);
        assert_eq!(save_count(&saved), 4);
    }

    #[tokio::test]
    async fn unban_keeps_warning_count() {
        let (engine, saved) = engine();
        engine.evaluate(5, "retard").await;
        assert!(engine.unban(5).await);
        assert!(!engine.is_banned(5).await);
        assert_eq!(engine.warning_count(5).await, 3);
        assert_eq!(save_count(&saved), 2);

        // a further violation re-bans
        let verdict = engine.evaluate(5, "hell").await;
        assert!(matches!(verdict, Verdict::Banned { count: 4, .. }));
    }

    #[tokio::test]
    async fn unban_of_never_banned_user_is_noop() {
        let (engine, saved) = engine();
        assert!(!engine.unban(11).await);
        engine.evaluate(12, "crap").await;
        assert!(!engine.unban(12).await);
        assert_eq!(engine.warning_count(12).await, 1);
        assert!(engine.record(11).await.is_none());
        assert_eq!(save_count(&saved), 1);
    }

    #[tokio::test]
    async fn failed_save_keeps_in_memory_state() {
        let engine = engine_with(MemoryStore {
            fail_save: true,
            ..MemoryStore::default()
        });
        let verdict = engine.evaluate(8, "retard").await;
        assert!(matches!(verdict, Verdict::Banned { count: 3, .. }));
        assert!(engine.is_banned(8).await);
        engine.reset(8).await;
        assert_eq!(engine.warning_count(8).await, 0);
    }

    #[tokio::test]
    async fn stored_ban_without_warnings_loads_at_threshold() {
        let clock = FixedClock::at_hour(9);
        let snapshot = ModerationSnapshot {
            warnings: [(6, 1)].into_iter().collect(),
            banned: [(5, clock.now), (6, clock.now)].into_iter().collect(),
            last_updated: None,
        };
        let engine = engine_with(MemoryStore {
            initial: Some(snapshot),
            ..MemoryStore::default()
        });

        assert!(engine.is_banned(5).await);
        assert_eq!(engine.warning_count(5).await, 3);
        assert!(engine.is_banned(6).await);
        assert_eq!(engine.warning_count(6).await, 3);

        // unban keeps the count, so the next violation bans again
        assert!(engine.unban(5).await);
        assert!(matches!(engine.evaluate(5, "crap").await, Verdict::Banned { count: 4, .. }));
    }

    #[tokio::test]
    async fn unreadable_store_starts_empty() {
        let engine = engine_with(MemoryStore {
            fail_load: true,
            ..MemoryStore::default()
        });
        assert_eq!(engine.stats().await.users_with_warnings, 0);
        assert!(matches!(engine.evaluate(1, "crap").await, Verdict::Warned { count: 1, .. }));
    }

    #[tokio::test]
    async fn state_survives_reload_through_file_store() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("storage").join("user_data.json");
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::at_hour(9));

        let engine = ModerationEngine::load(
            Box::new(JsonFileStore::new(&path)),
            BannedTermSet::default(),
            3,
            Arc::clone(&clock),
        );
        engine.evaluate(100, "crap").await;
        engine.evaluate(200, "bastard").await;
        drop(engine);

        let reloaded = ModerationEngine::load(
            Box::new(JsonFileStore::new(&path)),
            BannedTermSet::default(),
            3,
            clock,
        );
        assert_eq!(reloaded.warning_count(100).await, 1);
        assert!(!reloaded.is_banned(100).await);
        assert_eq!(reloaded.warning_count(200).await, 3);
        assert!(reloaded.is_banned(200).await);
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("user_data.json");
        std::fs::write(&path, "]]]")?;
        let engine = ModerationEngine::load(
            Box::new(JsonFileStore::new(&path)),
            BannedTermSet::default(),
            3,
            Arc::new(FixedClock::at_hour(9)),
        );
        assert_eq!(engine.stats().await.banned_users, 0);
        Ok(())
    }

    #[tokio::test]
    async fn stats_aggregate_table() {
        let (engine, _) = engine();
        assert_eq!(
            engine.stats().await,
            ModerationStats {
                users_with_warnings: 0,
                banned_users: 0,
                average_warnings: 0.0,
                users_near_ban: 0,
            }
        );

        engine.evaluate(1, "crap").await; // 1
        engine.evaluate(2, "idiot").await; // 2, near ban
        engine.evaluate(3, "bastard").await; // 3, banned
        engine.reset(4).await; // 0

        let stats = engine.stats().await;
        assert_eq!(stats.users_with_warnings, 3);
        assert_eq!(stats.banned_users, 1);
        assert!((stats.average_warnings - 1.5).abs() < f64::EPSILON);
        assert_eq!(stats.users_near_ban, 2);
    }

    #[tokio::test]
    async fn admin_terms_apply_to_later_messages() {
        let (engine, _) = engine();
        assert_eq!(engine.evaluate(1, "pesticide spam").await, Verdict::Clean);
        assert!(engine.add_term("Spam").await);
        assert!(!engine.add_term("spam").await);
        assert!(matches!(
            engine.evaluate(1, "pesticide SPAM").await,
            Verdict::Warned { count: 1, .. }
        ));
        assert!(engine.remove_term("spam").await);
        assert!(!engine.remove_term("spam").await);
        assert_eq!(engine.evaluate(1, "pesticide spam").await, Verdict::Clean);
        assert!(!engine.terms().await.terms().contains(&"spam".to_string()));
    }

    #[tokio::test]
    async fn concurrent_evaluations_never_lose_increments() {
        let engine = Arc::new(ModerationEngine::load(
            Box::new(MemoryStore::default()),
            BannedTermSet::default(),
            1000,
            Arc::new(FixedClock::at_hour(9)),
        ));

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let engine = Arc::clone(&engine);
                tokio::spawn(async move { engine.evaluate(77, "crap").await })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.is_ok());
        }
        assert_eq!(engine.warning_count(77).await, 50);
    }
}
