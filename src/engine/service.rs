//! Request-facing engine: validates identifiers, serializes access per
//! profile and owns the load → apply → save cycle.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::catalog::{ContentCatalog, GroupId, LevelId, WordId};
use crate::constants::PROFILE_LOCK_PRUNE_THRESHOLD;
use crate::engine::aggregation::apply_result;
use crate::engine::config::EngineConfig;
use crate::engine::metrics::EngineMetrics;
use crate::engine::profile::{AttemptSummary, LearnerProfile, StreakCounter, WordStat};
use crate::engine::rank::rank_of;
use crate::engine::types::{
    Achievement, AnswerSubmission, NextItem, NextItemRequest, Rank, UnlockEvent,
};
use crate::engine::{gating, selector, EngineError};
use crate::store::Store;
use crate::validation::validate_learner_id;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    pub word_id: WordId,
    pub previous_score: u8,
    pub delta: i32,
    pub rank: Rank,
    pub updated_word_stat: WordStat,
    pub unlock_events: Vec<UnlockEvent>,
    pub new_achievements: Vec<Achievement>,
    pub review_queue_len: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordProgress {
    pub word_id: WordId,
    pub text: Option<String>,
    pub score: u8,
    pub rank: Rank,
    pub attempts: u32,
    pub correct: u32,
    pub last_seen_at: Option<DateTime<Utc>>,
    /// Most recent answer, for "last time you..." hints in the progress view.
    pub last_attempt: Option<AttemptSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupProgress {
    pub group_id: GroupId,
    pub level_id: LevelId,
    pub name: String,
    pub word_count: usize,
    pub seen: u32,
    pub average: f64,
    pub unlocked: bool,
    pub unlocked_at: Option<DateTime<Utc>>,
    pub open: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelProgress {
    pub level_id: LevelId,
    pub name: String,
    pub average: f64,
    pub unlocked: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub open: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub learner_id: String,
    pub lang: String,
    pub words: Vec<WordProgress>,
    pub groups: Vec<GroupProgress>,
    pub levels: Vec<LevelProgress>,
    pub streak: StreakCounter,
    pub achievements: Vec<Achievement>,
    pub review_queue: Vec<WordId>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableScopes {
    pub unlocked_groups: Vec<GroupId>,
    pub unlocked_levels: Vec<LevelId>,
    pub open_groups: Vec<GroupId>,
    pub open_levels: Vec<LevelId>,
    pub review_queue_non_empty: bool,
}

pub struct ProgressEngine {
    config: Arc<EngineConfig>,
    catalog: Arc<ContentCatalog>,
    store: Arc<Store>,
    profile_locks: Arc<Mutex<HashMap<String, Arc<RwLock<()>>>>>,
    metrics: Arc<EngineMetrics>,
}

impl ProgressEngine {
    pub fn new(config: EngineConfig, catalog: Arc<ContentCatalog>, store: Arc<Store>) -> Self {
        Self {
            config: Arc::new(config),
            catalog,
            store,
            profile_locks: Arc::new(Mutex::new(HashMap::new())),
            metrics: Arc::new(EngineMetrics::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<ContentCatalog> {
        &self.catalog
    }

    pub fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }

    async fn acquire_profile_lock(&self, learner_id: &str, lang: &str) -> Arc<RwLock<()>> {
        let mut locks = self.profile_locks.lock().await;

        // Only the map holds an idle lock.
        if locks.len() > PROFILE_LOCK_PRUNE_THRESHOLD {
            locks.retain(|_, v| Arc::strong_count(v) > 1);
        }

        locks
            .entry(format!("{learner_id}:{lang}"))
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    fn check_ids(&self, learner_id: &str, lang: &str) -> Result<(), EngineError> {
        validate_learner_id(learner_id).map_err(|msg| EngineError::Validation(msg.to_string()))?;
        if !self.catalog.has_language(lang) {
            return Err(EngineError::Validation(format!(
                "language {lang} is not in the catalog"
            )));
        }
        Ok(())
    }

    fn load_or_new(&self, learner_id: &str, lang: &str) -> Result<LearnerProfile, EngineError> {
        Ok(self
            .store
            .load_profile(learner_id, lang)?
            .unwrap_or_else(|| LearnerProfile::new(learner_id, lang, Utc::now())))
    }

    pub async fn get_next_item(
        &self,
        learner_id: &str,
        lang: &str,
        request: &NextItemRequest,
    ) -> Result<NextItem, EngineError> {
        let start = Instant::now();
        self.check_ids(learner_id, lang)?;

        let lock = self.acquire_profile_lock(learner_id, lang).await;
        let _guard = lock.read().await;

        let profile = self.load_or_new(learner_id, lang)?;
        let native_lang = request
            .native_lang
            .as_deref()
            .unwrap_or(&self.config.selection.default_native_lang);

        let result = {
            let mut rng = rand::thread_rng();
            selector::next_item(&self.catalog, &profile, native_lang, request, &self.config, &mut rng)
        };

        let latency_us = start.elapsed().as_micros() as u64;
        match &result {
            Ok(NextItem::Question(q)) => {
                self.metrics.record_question(latency_us);
                tracing::debug!(
                    learner_id,
                    lang,
                    word_id = q.word_id,
                    activity = q.activity.as_str(),
                    rank = ?q.rank,
                    "next item selected"
                );
            }
            Ok(NextItem::Done { reason }) => {
                self.metrics.record_done(latency_us);
                tracing::debug!(learner_id, lang, reason = ?reason, "no item to present");
            }
            Err(_) => self.metrics.record_error(),
        }
        result
    }

    pub async fn submit_answer(
        &self,
        learner_id: &str,
        lang: &str,
        submission: &AnswerSubmission,
    ) -> Result<SubmitOutcome, EngineError> {
        let start = Instant::now();
        self.check_ids(learner_id, lang)?;

        let lock = self.acquire_profile_lock(learner_id, lang).await;
        let _guard = lock.write().await;

        let mut working = self.load_or_new(learner_id, lang)?;
        let applied = match apply_result(&self.catalog, &mut working, submission, &self.config, Utc::now()) {
            Ok(applied) => applied,
            Err(e) => {
                self.metrics.record_error();
                return Err(e);
            }
        };

        if let Err(e) = self.store.save_profile(&working) {
            self.metrics.record_error();
            tracing::warn!(learner_id, lang, error = %e, "Failed to persist learner profile");
            return Err(e.into());
        }

        for event in &applied.unlock_events {
            tracing::info!(learner_id, lang, event = ?event, "unlock");
        }
        if !applied.new_achievements.is_empty() {
            tracing::info!(learner_id, lang, achievements = ?applied.new_achievements, "achievements awarded");
        }
        self.metrics.record_answer(
            applied.unlock_events.len(),
            applied.new_achievements.len(),
            start.elapsed().as_micros() as u64,
        );

        Ok(SubmitOutcome {
            word_id: applied.word_id,
            previous_score: applied.previous_score,
            delta: applied.delta,
            rank: applied.rank,
            updated_word_stat: applied.word_stat,
            unlock_events: applied.unlock_events,
            new_achievements: applied.new_achievements,
            review_queue_len: working.review_queue.len(),
        })
    }

    pub async fn get_progress(
        &self,
        learner_id: &str,
        lang: &str,
    ) -> Result<ProgressSnapshot, EngineError> {
        self.check_ids(learner_id, lang)?;
        let lock = self.acquire_profile_lock(learner_id, lang).await;
        let _guard = lock.read().await;

        let stored = self.store.load_profile(learner_id, lang)?;
        let updated_at = stored.as_ref().map(|p| p.updated_at);
        let profile = stored.unwrap_or_else(|| LearnerProfile::new(learner_id, lang, Utc::now()));
        Ok(self.snapshot(&profile, updated_at))
    }

    fn snapshot(&self, profile: &LearnerProfile, updated_at: Option<DateTime<Utc>>) -> ProgressSnapshot {
        let catalog = &self.catalog;
        let words = profile
            .words
            .iter()
            .map(|(word_id, stat)| WordProgress {
                word_id: *word_id,
                text: catalog.word_text(&profile.lang, *word_id).map(str::to_string),
                score: stat.score,
                rank: rank_of(stat.score, &self.config.ranks),
                attempts: stat.attempts,
                correct: stat.correct,
                last_seen_at: stat.last_seen_at,
                last_attempt: stat.last_attempt.clone(),
            })
            .collect();

        let mut groups = Vec::new();
        let mut levels = Vec::new();
        for level in catalog.levels() {
            let stat = profile.levels.get(&level.id).cloned().unwrap_or_default();
            levels.push(LevelProgress {
                level_id: level.id,
                name: level.name.clone(),
                average: stat.average,
                unlocked: stat.unlocked,
                completed_at: stat.completed_at,
                open: gating::is_level_open(catalog, profile, level.id),
            });
            for group_id in &level.groups {
                let Some(group) = catalog.group(*group_id) else {
                    continue;
                };
                let stat = profile.groups.get(group_id).cloned().unwrap_or_default();
                groups.push(GroupProgress {
                    group_id: *group_id,
                    level_id: level.id,
                    name: group.name.clone(),
                    word_count: group.words.len(),
                    seen: stat.count,
                    average: stat.average,
                    unlocked: stat.unlocked,
                    unlocked_at: stat.unlocked_at,
                    open: gating::is_group_open(catalog, profile, *group_id),
                });
            }
        }

        ProgressSnapshot {
            learner_id: profile.learner_id.clone(),
            lang: profile.lang.clone(),
            words,
            groups,
            levels,
            streak: profile.streak.clone(),
            achievements: profile.achievements.iter().copied().collect(),
            review_queue: profile.review_queue.clone(),
            updated_at,
        }
    }

    pub async fn get_available_scopes(
        &self,
        learner_id: &str,
        lang: &str,
    ) -> Result<AvailableScopes, EngineError> {
        self.check_ids(learner_id, lang)?;
        let lock = self.acquire_profile_lock(learner_id, lang).await;
        let _guard = lock.read().await;

        let profile = self.load_or_new(learner_id, lang)?;
        let catalog = &self.catalog;
        Ok(AvailableScopes {
            unlocked_groups: catalog
                .levels()
                .iter()
                .flat_map(|level| level.groups.iter().copied())
                .filter(|group_id| profile.group_unlocked(*group_id))
                .collect(),
            unlocked_levels: catalog
                .levels()
                .iter()
                .map(|level| level.id)
                .filter(|level_id| profile.level_unlocked(*level_id))
                .collect(),
            open_groups: gating::open_groups(catalog, &profile),
            open_levels: gating::open_levels(catalog, &profile),
            review_queue_non_empty: !profile.review_queue.is_empty(),
        })
    }

    /// Languages with stored progress for a learner.
    pub async fn list_languages(&self, learner_id: &str) -> Result<Vec<String>, EngineError> {
        validate_learner_id(learner_id).map_err(|msg| EngineError::Validation(msg.to_string()))?;
        Ok(self.store.list_profile_languages(learner_id)?)
    }

    /// Drops all progress of one learner in one language. Returns `false`
    /// when there was nothing to drop.
    pub async fn reset_progress(&self, learner_id: &str, lang: &str) -> Result<bool, EngineError> {
        self.check_ids(learner_id, lang)?;
        let lock = self.acquire_profile_lock(learner_id, lang).await;
        let _guard = lock.write().await;

        let removed = self.store.delete_profile(learner_id, lang)?;
        if removed {
            tracing::info!(learner_id, lang, "learner progress reset");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::catalog::fixtures::catalog;
    use crate::engine::types::{ActivityType, Difficulty, Outcome, Scope};

    fn engine() -> (tempfile::TempDir, ProgressEngine) {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path().join("db").to_str().unwrap()).unwrap();
        let engine = ProgressEngine::new(EngineConfig::default(), Arc::new(catalog()), Arc::new(store));
        (dir, engine)
    }

    fn answer(word_id: WordId, outcome: Outcome) -> AnswerSubmission {
        AnswerSubmission {
            word_id,
            activity: ActivityType::FillInTheBlank,
            difficulty: Difficulty::Hard,
            outcome,
            misspell_override: false,
        }
    }

    #[tokio::test]
    async fn submit_persists_and_progress_reflects_it() {
        let (_dir, engine) = engine();
        let outcome = engine
            .submit_answer("u1", "es", &answer(1, Outcome::Correct))
            .await
            .unwrap();
        assert_eq!(outcome.updated_word_stat.score, 8);
        assert_eq!(outcome.review_queue_len, 0);

        let progress = engine.get_progress("u1", "es").await.unwrap();
        assert_eq!(progress.words.len(), 1);
        assert_eq!(progress.words[0].text.as_deref(), Some("perro"));
        let last = progress.words[0].last_attempt.as_ref().unwrap();
        assert_eq!(last.outcome, Outcome::Correct);
        assert_eq!(last.activity, ActivityType::FillInTheBlank);
        assert_eq!(last.delta, 8);
        assert_eq!(progress.groups.len(), 4);
        assert_eq!(progress.groups[0].seen, 1);
        assert!(progress.groups[0].open);
        assert!(!progress.groups[1].open);
        assert!(progress.updated_at.is_some());
        assert_eq!(engine.metrics().snapshot().answers_applied, 1);
    }

    #[tokio::test]
    async fn read_operations_do_not_create_profiles() {
        let (_dir, engine) = engine();
        engine
            .get_next_item("u1", "es", &NextItemRequest::default())
            .await
            .unwrap();
        let progress = engine.get_progress("u1", "es").await.unwrap();
        assert!(progress.updated_at.is_none());
        assert!(engine.list_languages("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejected_answer_is_not_persisted() {
        let (_dir, engine) = engine();
        let err = engine
            .submit_answer("u1", "es", &answer(404, Outcome::Correct))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownWord { .. }));
        assert!(engine.list_languages("u1").await.unwrap().is_empty());
        assert_eq!(engine.metrics().snapshot().errors, 1);
    }

    #[tokio::test]
    async fn invalid_identifiers_are_rejected() {
        let (_dir, engine) = engine();
        for (learner, lang) in [("", "es"), ("bad id", "es"), ("u1", "xx")] {
            let err = engine.get_progress(learner, lang).await.unwrap_err();
            assert!(matches!(err, EngineError::Validation(_)));
        }
    }

    #[tokio::test]
    async fn scopes_follow_unlocks() {
        let (_dir, engine) = engine();
        let scopes = engine.get_available_scopes("u1", "es").await.unwrap();
        assert_eq!(scopes.open_groups, vec![10]);
        assert!(scopes.unlocked_groups.is_empty());

        let mut events = Vec::new();
        for _ in 0..7 {
            let outcome = engine
                .submit_answer("u1", "es", &answer(1, Outcome::Correct))
                .await
                .unwrap();
            events.extend(outcome.unlock_events);
        }
        // 7 * 8 = 56 on the only seen word of group 10
        assert_eq!(events.len(), 1);

        let scopes = engine.get_available_scopes("u1", "es").await.unwrap();
        assert_eq!(scopes.unlocked_groups, vec![10]);
        assert_eq!(scopes.open_groups, vec![10, 11]);
        assert_eq!(scopes.open_levels, vec![100]);
        assert!(!scopes.review_queue_non_empty);

        let item = engine
            .get_next_item(
                "u1",
                "es",
                &NextItemRequest {
                    scope: Scope::Group { id: 11 },
                    ..NextItemRequest::default()
                },
            )
            .await
            .unwrap();
        assert!(matches!(item, NextItem::Question(_)));
    }

    #[tokio::test]
    async fn concurrent_submissions_are_serialized() {
        let (_dir, engine) = engine();
        let engine = Arc::new(engine);
        let mut handles = Vec::new();
        for _ in 0..10 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                engine
                    .submit_answer("u1", "es", &answer(2, Outcome::Correct))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let progress = engine.get_progress("u1", "es").await.unwrap();
        assert_eq!(progress.words[0].attempts, 10);
        assert_eq!(progress.words[0].score, 80);
    }

    #[tokio::test]
    async fn reset_drops_progress() {
        let (_dir, engine) = engine();
        engine
            .submit_answer("u1", "es", &answer(1, Outcome::Correct))
            .await
            .unwrap();
        assert_eq!(engine.list_languages("u1").await.unwrap(), vec!["es"]);

        assert!(engine.reset_progress("u1", "es").await.unwrap());
        assert!(!engine.reset_progress("u1", "es").await.unwrap());
        assert!(engine.get_progress("u1", "es").await.unwrap().words.is_empty());
    }
}
